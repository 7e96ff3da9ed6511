//! Progress reporting infrastructure

use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use std::borrow::Cow;

/// CLI progress report of ongoing operations
///
/// To avoid corrupted terminal output, you should not write anything to stdout
/// or stderr yourself as long as a report is being displayed. Please use logs
/// for debug messages.
#[derive(Clone, Debug, Default)]
pub struct ProgressReport(MultiProgress);
//
impl ProgressReport {
    /// Prepare to report progress on the cli
    pub fn new() -> Self {
        Self::default()
    }

    /// Report on an operation with a known number of steps
    pub fn add_steps(&self, what: impl Into<Cow<'static, str>>, steps: usize) -> ProgressTracker {
        self.add(what, steps as u64, "{pos}/{len}")
    }

    /// Report on a byte-counted operation whose full size is discovered as it
    /// proceeds, via [`ProgressTracker::add_work()`]
    pub fn add_bytes(&self, what: impl Into<Cow<'static, str>>) -> ProgressTracker {
        self.add(
            what,
            0,
            "{decimal_bytes}/{decimal_total_bytes} ({decimal_bytes_per_sec})",
        )
    }

    /// Set up one progress bar
    fn add(
        &self,
        what: impl Into<Cow<'static, str>>,
        initial_work: u64,
        trailer: &str,
    ) -> ProgressTracker {
        let bar = ProgressBar::new(initial_work)
            .with_prefix(what.into())
            .with_style(
                ProgressStyle::with_template(&format!("{{prefix}} {{wide_bar}} {trailer}"))
                    .expect("all styles above should be valid indicatif styles"),
            );
        self.0.add(bar.clone());
        ProgressTracker {
            bar,
            report: self.0.clone(),
        }
    }
}

/// Mechanism to track progress
#[derive(Clone, Debug)]
pub struct ProgressTracker {
    /// Progress bar for this specific process
    bar: ProgressBar,

    /// Underlying process report
    report: MultiProgress,
}
//
impl ProgressTracker {
    /// Show that a certain amount of progress has been made
    pub fn make_progress(&self, progress: u64) {
        self.bar.inc(progress);
    }

    /// Increment the amount of progress that remains to be done
    pub fn add_work(&self, remaining: u64) {
        self.bar.inc_length(remaining);
    }

    /// Hide the progress bar once its operation is complete
    pub fn finish(&self) {
        self.bar.finish_and_clear();
        self.report.remove(&self.bar);
    }
}
