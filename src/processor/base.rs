//! Progress and configuration plumbing shared by the long-running scans
//!
//! A full chainstate holds well over a hundred million entries and its size
//! is not known up front, so progress is reported as a running count and
//! rate rather than a percentage. The progress line goes to stderr because
//! reports and dumps may be written to stdout.

use crate::errors::{AppError, AppResult};
use std::io::Write;
use std::time::{Duration, Instant};
use tracing::{info, warn};

/// Batches above this size are accepted but logged
const LARGE_BATCH_WARNING: usize = 1_000_000;

/// Rate-limits progress output to one line per interval
pub struct StandardProgressTracker {
    started: Instant,
    last_report: Instant,
    interval: Duration,
}

impl StandardProgressTracker {
    /// Start tracking now, reporting at most once every `interval_ms`
    pub fn with_interval(interval_ms: u64) -> Self {
        let now = Instant::now();
        Self {
            started: now,
            last_report: now,
            interval: Duration::from_millis(interval_ms),
        }
    }

    /// Whether a progress line is due; resets the interval when it is
    pub fn should_report(&mut self) -> bool {
        if self.last_report.elapsed() < self.interval {
            return false;
        }
        self.last_report = Instant::now();
        true
    }

    pub fn elapsed_seconds(&self) -> f64 {
        self.started.elapsed().as_secs_f64()
    }
}

/// Checks for the batching settings of a scan
pub struct ConfigValidator;

impl ConfigValidator {
    pub fn validate_batch_config(batch_size: usize, progress_interval_ms: u64) -> AppResult<()> {
        if batch_size == 0 {
            return Err(AppError::Config(
                "Batch size must be greater than 0".to_string(),
            ));
        }
        if progress_interval_ms == 0 {
            return Err(AppError::Config(
                "Progress interval must be greater than 0".to_string(),
            ));
        }
        if batch_size > LARGE_BATCH_WARNING {
            warn!(
                "Large batch size: {} entries per batch are held in memory per worker",
                batch_size
            );
        }
        Ok(())
    }

    /// Log the settings a scan runs with, one `label: value` line each
    pub fn log_config_summary(operation: &str, settings: &[(&str, String)]) {
        info!("=== {} Configuration ===", operation);
        for (label, value) in settings {
            info!("  {}: {}", label, value);
        }
    }
}

/// Counters a scan shows on its progress line
pub trait StageMetrics {
    /// e.g. "Outputs: 100 | Errors: 5"
    fn format_custom_metrics(&self) -> String;
}

/// Progress and completion output
pub struct ProgressReporter;

impl ProgressReporter {
    /// Human-readable duration: "42.5s" below a minute, else "1h 5m 3s"
    pub fn format_elapsed_time(elapsed_secs: f64) -> String {
        if elapsed_secs < 60.0 {
            return format!("{:.1}s", elapsed_secs);
        }

        let total = elapsed_secs.round() as u64;
        let (days, rest) = (total / 86_400, total % 86_400);
        let (hours, rest) = (rest / 3_600, rest % 3_600);
        let (minutes, seconds) = (rest / 60, rest % 60);

        if days > 0 {
            format!("{}d {}h {}m {}s", days, hours, minutes, seconds)
        } else if hours > 0 {
            format!("{}h {}m {}s", hours, minutes, seconds)
        } else {
            format!("{}m {}s", minutes, seconds)
        }
    }

    pub fn format_progress(processed: u64, elapsed_secs: f64, custom_metrics: &str) -> String {
        let rate = if elapsed_secs > 0.0 {
            processed as f64 / elapsed_secs
        } else {
            0.0
        };
        format!(
            "Entries: {} | Rate: {:.0}/sec | Elapsed: {} | {}",
            processed,
            rate,
            Self::format_elapsed_time(elapsed_secs),
            custom_metrics
        )
    }

    /// Overwrite the current stderr line with the scan's progress
    pub fn report_progress<T: StageMetrics>(
        metrics: &T,
        processed: u64,
        elapsed_secs: f64,
    ) -> AppResult<()> {
        let line = Self::format_progress(processed, elapsed_secs, &metrics.format_custom_metrics());
        let mut stderr = std::io::stderr().lock();
        write!(stderr, "\r{}", line)?;
        stderr.flush()?;
        Ok(())
    }

    /// End the in-place progress line
    pub fn finish_progress_line() {
        eprintln!();
    }

    pub fn report_completion(operation: &str, entries: u64, outputs: u64, elapsed_secs: f64) {
        let rate = if elapsed_secs > 0.0 {
            entries as f64 / elapsed_secs
        } else {
            0.0
        };
        info!("=== {} Completed ===", operation);
        info!("  Entries scanned: {}", entries);
        info!("  Outputs decoded: {}", outputs);
        info!("  Time elapsed: {}", Self::format_elapsed_time(elapsed_secs));
        info!("  Average rate: {:.1} entries/sec", rate);
    }
}
