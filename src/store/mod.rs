//! Container backends.
//!
//! The copy engine only needs three things from a container format: walk every
//! node once in a deterministic order, copy one dataset (with whatever group
//! shells it needs) into another container of the same format, and close.
//! Those live on the [`Container`] trait; each backend decides how a node copy
//! is actually performed.

use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use thiserror::Error;

#[cfg(feature = "hdf5")]
pub mod hdf5;
pub mod tree;

/// A node as seen during traversal. Dispatch happens on the tag, never on a
/// runtime type probe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    /// Structural node; copied implicitly through its descendants' paths.
    Group { path: String },
    /// Data-holding leaf; the unit of inclusion and exclusion.
    Dataset { path: String, shape: Vec<usize> },
}

impl Node {
    pub fn path(&self) -> &str {
        match self {
            Node::Group { path } | Node::Dataset { path, .. } => path,
        }
    }
}

/// Errors raised by container backends.
///
/// Variants split into node faults (one dataset could not be placed; the run
/// carries on) and everything else (the file is abandoned). See
/// [`StoreError::is_node_fault`].
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("{} is not a valid {format} container: {reason}", path.display())]
    Corrupt {
        path: PathBuf,
        format: Format,
        reason: String,
    },

    #[error("{format} support is not compiled into this build")]
    Unavailable { format: Format },

    #[error("no dataset at {0}")]
    MissingDataset(String),

    #[error("{path}: {reason}")]
    Unsupported { path: String, reason: String },

    #[error("{path} collides with existing node {existing}")]
    NameCollision { path: String, existing: String },

    #[error(
        "{path}: payload holds {actual} bytes but shape {shape:?} of {dtype} needs {expected}"
    )]
    LayoutMismatch {
        path: String,
        shape: Vec<usize>,
        dtype: String,
        expected: usize,
        actual: usize,
    },

    #[error("{path}: copy rejected by the library: {reason}")]
    CopyRejected { path: String, reason: String },

    /// The library failed at the file level (I/O, seek, close) while working
    /// on one node. Later nodes would hit the same wall.
    #[error("{} failed while copying {node}: {reason}", path.display())]
    Backend {
        path: PathBuf,
        node: String,
        reason: String,
    },

    #[cfg(feature = "hdf5")]
    #[error("HDF5 error on {}: {source}", path.display())]
    Hdf5 {
        path: PathBuf,
        #[source]
        source: ::hdf5::Error,
    },
}

impl StoreError {
    /// True when the failure is confined to a single node and the caller may
    /// continue with the next one.
    pub fn is_node_fault(&self) -> bool {
        matches!(
            self,
            StoreError::MissingDataset(_)
                | StoreError::Unsupported { .. }
                | StoreError::NameCollision { .. }
                | StoreError::LayoutMismatch { .. }
                | StoreError::CopyRejected { .. }
        )
    }

    pub(crate) fn io(path: &Path, source: io::Error) -> Self {
        StoreError::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// An open hierarchical data file.
///
/// Handles are exclusively owned by one strip operation and consumed by
/// [`Container::close`].
pub trait Container: Sized {
    /// Open an existing container read-only.
    fn open(path: &Path) -> Result<Self, StoreError>;

    /// Create (or truncate) a container for writing.
    fn create(path: &Path) -> Result<Self, StoreError>;

    /// Visit every group and dataset below the root exactly once.
    fn visit(&self, visitor: &mut dyn FnMut(Node)) -> Result<(), StoreError>;

    /// Copy the dataset at `path` into `dest` at the same path, creating any
    /// missing ancestor groups.
    fn copy_dataset(&self, path: &str, dest: &mut Self) -> Result<(), StoreError>;

    /// Flush and release the handle.
    fn close(self) -> Result<(), StoreError>;
}

/// On-disk container formats known to the tool.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    /// HDF5 files (`.h5`), available with the `hdf5` cargo feature.
    Hdf5,
    /// Portable MessagePack tree files (`.h5t`).
    Tree,
}

impl Format {
    /// File extension (without the dot) used for discovery and output names.
    pub fn extension(self) -> &'static str {
        match self {
            Format::Hdf5 => "h5",
            Format::Tree => "h5t",
        }
    }

    /// Whether this build can read and write the format.
    pub fn is_available(self) -> bool {
        match self {
            Format::Hdf5 => cfg!(feature = "hdf5"),
            Format::Tree => true,
        }
    }

    /// Parse a format name (case-insensitive).
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "hdf5" | "h5" => Some(Format::Hdf5),
            "tree" | "h5t" | "msgpack" => Some(Format::Tree),
            _ => None,
        }
    }
}

impl Default for Format {
    fn default() -> Self {
        if cfg!(feature = "hdf5") {
            Format::Hdf5
        } else {
            Format::Tree
        }
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Format::Hdf5 => "hdf5",
            Format::Tree => "tree",
        })
    }
}

impl FromStr for Format {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| format!("invalid format: '{s}' (expected hdf5 or tree)"))
    }
}

/// Split an absolute node path into its non-empty components.
pub(crate) fn path_segments(path: &str) -> Vec<&str> {
    path.split('/').filter(|s| !s.is_empty()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_parse_and_display_agree() {
        for f in [Format::Hdf5, Format::Tree] {
            assert_eq!(f.to_string().parse::<Format>().unwrap(), f);
        }
        assert_eq!(Format::parse("H5"), Some(Format::Hdf5));
        assert!("netcdf".parse::<Format>().is_err());
    }

    #[test]
    fn tree_is_always_available() {
        assert!(Format::Tree.is_available());
        assert_eq!(Format::Hdf5.is_available(), cfg!(feature = "hdf5"));
    }

    #[test]
    fn node_faults_are_classified() {
        assert!(StoreError::MissingDataset("/a".into()).is_node_fault());
        assert!(
            StoreError::NameCollision {
                path: "/a/b".into(),
                existing: "/a".into()
            }
            .is_node_fault()
        );
        let io = StoreError::io(Path::new("x"), io::Error::other("disk full"));
        assert!(!io.is_node_fault());
        assert!(!StoreError::Unavailable { format: Format::Hdf5 }.is_node_fault());
        assert!(
            !StoreError::Backend {
                path: "out.h5".into(),
                node: "/a".into(),
                reason: "write failed".into()
            }
            .is_node_fault()
        );
    }

    #[test]
    fn segments_ignore_redundant_slashes() {
        assert_eq!(path_segments("/run//meta/t/"), vec!["run", "meta", "t"]);
        assert!(path_segments("/").is_empty());
    }
}
