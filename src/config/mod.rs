//! Configuration: runtime settings, default paths, XML loading and validation.
//!
//! Precedence is defaults < XML config file < CLI flags. The CLI applies its
//! overrides through `Args::apply_overrides`.

pub mod paths;
pub mod types;
mod validate;
pub mod xml;

pub use paths::{default_config_path, path_has_symlink_ancestor, resolve_config_path};
pub use types::{Config, LogLevel};
pub use xml::{load_config, load_config_from_xml_path};

/// Dataset name markers skipped when no list is configured.
pub const DEFAULT_SKIP_LIST: &[&str] = &["CsPad", "Camera"];

/// Environment variable naming an explicit config file.
pub const CONFIG_ENV: &str = "H5STRIP_CONFIG";

/// Split a comma-separated pattern list, trimming entries and dropping blanks.
pub fn parse_skip_list(list: &str) -> Vec<String> {
    list.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}
