//! Selective copy engine.
//!
//! Two strictly ordered phases per file:
//! - [`collect`] walks the whole source tree and builds the [`KeepList`];
//! - [`materialize`] copies each kept dataset into the destination.
//!
//! The destination is not touched until the keep list is complete.

mod collect;
mod materialize;

pub use collect::{KeepList, KeptDataset, collect};
pub use materialize::{CopyOutcome, materialize};

use std::time::{Duration, Instant};

use tracing::info;

use crate::pattern::SkipMatcher;
use crate::store::{Container, StoreError};

/// Result of running both phases on one source/destination pair.
#[derive(Debug, Clone)]
pub struct EngineReport {
    pub keep: KeepList,
    pub outcome: CopyOutcome,
    pub collect_time: Duration,
    pub copy_time: Duration,
}

/// Collect, then materialize. Handle lifetimes stay with the caller.
pub fn run<C: Container>(
    source: &C,
    dest: &mut C,
    matcher: &SkipMatcher,
) -> Result<EngineReport, StoreError> {
    let t0 = Instant::now();
    info!("Analyzing file ...");
    let keep = collect(source, matcher)?;
    let collect_time = t0.elapsed();
    info!(
        kept = keep.len(),
        excluded = keep.excluded().len(),
        groups = keep.groups_seen(),
        "done ({:.1} sec)",
        collect_time.as_secs_f64()
    );

    let t1 = Instant::now();
    let outcome = materialize(source, dest, &keep)?;
    Ok(EngineReport {
        keep,
        outcome,
        collect_time,
        copy_time: t1.elapsed(),
    })
}
