//! Interrupt flag.
//!
//! Set from the ctrl-c handler and polled by the batch loop between files. A
//! file that is already being stripped runs to completion so its handles are
//! closed normally.

use std::sync::atomic::{AtomicBool, Ordering};

static INTERRUPTED: AtomicBool = AtomicBool::new(false);

/// Ask the batch to stop before the next file (idempotent, signal-safe).
#[inline]
pub fn request() {
    INTERRUPTED.store(true, Ordering::Relaxed);
}

#[inline]
pub fn is_requested() -> bool {
    INTERRUPTED.load(Ordering::Relaxed)
}

#[cfg(test)]
pub(crate) fn reset() {
    INTERRUPTED.store(false, Ordering::Relaxed);
}
