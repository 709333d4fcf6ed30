//! Batch drivers: fetch through `StashApi`, resolve with `analysis`, then
//! execute (or, in dry-run, only log) the resulting mutations.
//!
//! One unit of work (a scene or a duplicate group) is finished before the
//! next starts. A failed call is logged and counted; the run moves on.

pub mod markers;
pub mod merge;
pub mod primary_files;

pub use markers::{MarkerCleanupEngine, MarkerCleanupResult};
pub use merge::{DuplicateMergeEngine, DuplicateMergeResult, GroupOutcome, GroupReport};
pub use primary_files::{PrimaryFileFixEngine, PrimaryFileFixResult};

use std::thread;
use std::time::Duration;

/// Fixed delay between mutating calls. Dry runs never wait.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Pacer {
    delay: Duration,
    enabled: bool,
}

impl Pacer {
    pub(crate) fn new(delay: Duration, dry_run: bool) -> Self {
        Self {
            delay,
            enabled: !dry_run,
        }
    }

    pub(crate) fn pause(&self) {
        if self.enabled && !self.delay.is_zero() {
            thread::sleep(self.delay);
        }
    }
}
