//! Core library for `h5strip`.
//!
//! Copies a hierarchical data file (groups and typed datasets) into a new
//! file with the same layout, leaving out every dataset whose path matches a
//! skip pattern. The result is a small "stripped" file with metadata and
//! scalar readouts but without bulky detector images.
//!
//! Layers, bottom-up:
//! - [`store`]: container backends behind the [`store::Container`] trait.
//! - [`pattern`]: the skip matcher.
//! - [`engine`]: collect the keep list, then materialize it.
//! - [`batch`]: input discovery, output naming, per-file and batch runs.
//! - [`config`], [`cli`]: settings and their sources.

pub mod batch;
pub mod cli;
pub mod config;
pub mod engine;
pub mod errors;
pub mod output;
pub mod pattern;
pub mod platform;
pub mod shutdown;
pub mod store;

pub use batch::{
    BatchReport, FileOutcome, FileReport, discover_inputs, output_path, strip_all, strip_file,
};
pub use config::{
    Config, LogLevel, default_config_path, load_config, load_config_from_xml_path,
    path_has_symlink_ancestor,
};
pub use errors::{NodeCopyError, StripError};
pub use pattern::{PatternSyntax, SkipMatcher};
pub use store::{Container, Format, Node, StoreError};
