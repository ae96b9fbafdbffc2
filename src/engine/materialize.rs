use tracing::{debug, warn};

use crate::errors::NodeCopyError;
use crate::store::{Container, StoreError};

use super::collect::KeepList;

/// What happened to each keep-list entry.
#[derive(Debug, Clone, Default)]
pub struct CopyOutcome {
    pub copied: Vec<String>,
    pub failures: Vec<NodeCopyError>,
}

/// Copy every kept dataset into `dest`, in keep-list order.
///
/// A node fault is logged and recorded, and the next entry is attempted.
/// Any other error stops the file and is returned.
pub fn materialize<C: Container>(
    source: &C,
    dest: &mut C,
    keep: &KeepList,
) -> Result<CopyOutcome, StoreError> {
    let mut outcome = CopyOutcome::default();
    for entry in keep.iter() {
        match source.copy_dataset(&entry.path, dest) {
            Ok(()) => {
                debug!(path = %entry.path, "copied");
                outcome.copied.push(entry.path.clone());
            }
            Err(e) if e.is_node_fault() => {
                warn!(path = %entry.path, error = %e, "failed to copy {}", entry.path);
                outcome.failures.push(NodeCopyError {
                    path: entry.path.clone(),
                    reason: e.to_string(),
                });
            }
            Err(e) => return Err(e),
        }
    }
    Ok(outcome)
}
