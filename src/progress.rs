/// Trait for reporting batch progress.
///
/// The CLI implements it with indicatif; tests use `SilentReporter`.
/// All methods have default no-op implementations.
pub trait ProgressReporter {
    fn on_fetch_start(&self, _what: &str) {}
    fn on_fetch_progress(&self, _page: u32, _records_so_far: usize) {}
    fn on_fetch_complete(&self, _records: usize) {}
    fn on_process_start(&self, _total_units: usize) {}
    fn on_unit_complete(&self, _units_done: usize, _label: &str) {}
    fn on_process_complete(&self) {}
}

/// No-op progress reporter for silent operation.
pub struct SilentReporter;

impl ProgressReporter for SilentReporter {}
