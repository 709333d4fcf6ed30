use indicatif::{ProgressBar, ProgressStyle};
use stash_dedupe::ProgressReporter;
use std::sync::Mutex;
use std::time::Duration;

const TICKS: &str = "⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏";

/// CLI progress reporter using indicatif.
///
/// - Fetch phase: spinner (page count unknown upfront)
/// - Process phase: progress bar over scenes or duplicate groups
pub struct CliReporter {
    bar: Mutex<Option<ProgressBar>>,
}

impl CliReporter {
    pub fn new() -> Self {
        Self {
            bar: Mutex::new(None),
        }
    }

    fn set_bar(&self, pb: ProgressBar) {
        if let Ok(mut guard) = self.bar.lock() {
            if let Some(old) = guard.take() {
                old.finish_and_clear();
            }
            *guard = Some(pb);
        }
    }

    fn finish_bar(&self) {
        if let Ok(mut guard) = self.bar.lock() {
            if let Some(pb) = guard.take() {
                pb.finish_and_clear();
            }
        }
    }

    fn with_bar(&self, f: impl FnOnce(&ProgressBar)) {
        if let Ok(guard) = self.bar.lock() {
            if let Some(pb) = guard.as_ref() {
                f(pb);
            }
        }
    }
}

fn spinner_style() -> ProgressStyle {
    ProgressStyle::with_template("{spinner:.cyan} {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_spinner())
        .tick_chars(TICKS)
}

fn bar_style() -> ProgressStyle {
    ProgressStyle::with_template("  {spinner:.cyan} [{bar:30.cyan/dim}] {pos}/{len} {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("━╸─")
        .tick_chars(TICKS)
}

impl ProgressReporter for CliReporter {
    fn on_fetch_start(&self, what: &str) {
        let pb = ProgressBar::new_spinner();
        pb.set_style(spinner_style());
        pb.set_message(format!("Fetching {}...", what));
        pb.enable_steady_tick(Duration::from_millis(80));
        self.set_bar(pb);
    }

    fn on_fetch_progress(&self, page: u32, records_so_far: usize) {
        self.with_bar(|pb| pb.set_message(format!("Page {}: {} records so far", page, records_so_far)));
    }

    fn on_fetch_complete(&self, records: usize) {
        self.finish_bar();
        eprintln!("  \x1b[32m✓\x1b[0m Fetched {} records", records);
    }

    fn on_process_start(&self, total_units: usize) {
        let pb = ProgressBar::new(total_units as u64);
        pb.set_style(bar_style());
        pb.enable_steady_tick(Duration::from_millis(80));
        self.set_bar(pb);
    }

    fn on_unit_complete(&self, units_done: usize, label: &str) {
        self.with_bar(|pb| {
            pb.set_position(units_done as u64);
            pb.set_message(label.to_string());
        });
    }

    fn on_process_complete(&self) {
        self.finish_bar();
    }
}
