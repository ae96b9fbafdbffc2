//! Typed error definitions for h5strip.
//! Three failure classes with different blast radius: configuration errors stop
//! the run before any file is touched, node copy errors are recorded and the
//! file continues, file processing errors are recorded and the batch continues.

use std::path::PathBuf;
use thiserror::Error;

use crate::store::StoreError;

/// One dataset that could not be placed in the destination.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("failed to copy {path}: {reason}")]
pub struct NodeCopyError {
    pub path: String,
    pub reason: String,
}

#[derive(Debug, Error)]
pub enum StripError {
    #[error("Invalid configuration: {0}")]
    Configuration(String),

    #[error("Invalid skip pattern {pattern:?}: {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error(transparent)]
    NodeCopy(#[from] NodeCopyError),

    #[error("Failed to process {}: {source}", file.display())]
    FileProcessing {
        file: PathBuf,
        #[source]
        source: StoreError,
    },
}

impl StripError {
    /// Stable numeric code for logs and scripts.
    pub fn code(&self) -> u16 {
        match self {
            StripError::Configuration(_) => 10,
            StripError::InvalidPattern { .. } => 11,
            StripError::NodeCopy(_) => 20,
            StripError::FileProcessing { .. } => 30,
        }
    }

    /// True for errors that must abort before any input is processed.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            StripError::Configuration(_) | StripError::InvalidPattern { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_are_distinct_per_class() {
        let cfg = StripError::Configuration("x".into());
        let node: StripError = NodeCopyError {
            path: "/a".into(),
            reason: "boom".into(),
        }
        .into();
        assert_ne!(cfg.code(), node.code());
        assert!(cfg.is_configuration());
        assert!(!node.is_configuration());
    }

    #[test]
    fn node_copy_message_names_the_path() {
        let node = NodeCopyError {
            path: "/run/CsPad0/image".into(),
            reason: "unsupported".into(),
        };
        assert_eq!(
            node.to_string(),
            "failed to copy /run/CsPad0/image: unsupported"
        );
    }
}
