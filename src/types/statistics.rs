//! Statistics collected while scanning a chainstate
//!
//! Each pipeline worker keeps its own [`ScanStats`]; they are merged once the
//! scan finishes.

use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

/// Counters that can report how long their pass took
pub trait StatisticsCollector {
    /// Freeze the elapsed time
    fn finish(&mut self);

    /// Time since the pass started, or its final length once finished
    fn duration(&self) -> Duration;

    /// Items per second over [`duration`](Self::duration)
    fn processing_rate(&self) -> f64;

    /// One-line description for the end of a command
    fn summary(&self) -> String;
}

/// Counters for one pass over the store
#[derive(Debug, Clone, Default)]
pub struct ScanStats {
    /// Raw entries read under the scanned prefix
    pub entries_scanned: u64,
    /// Outputs produced by the decoders
    pub records_decoded: u64,
    /// Entries that failed to decode and were skipped
    pub decode_errors: u64,
    /// Outputs left out of the histogram buckets by a filter
    pub filtered_out: u64,
    pub batches_processed: u64,
    started: Option<Instant>,
    finished: Option<Duration>,
}

impl ScanStats {
    /// Fresh counters with the clock started
    pub fn new() -> Self {
        Self {
            started: Some(Instant::now()),
            ..Self::default()
        }
    }

    /// Fold a worker's counters into this one. Timing is left untouched.
    pub fn merge(&mut self, other: &ScanStats) {
        self.entries_scanned += other.entries_scanned;
        self.records_decoded += other.records_decoded;
        self.decode_errors += other.decode_errors;
        self.filtered_out += other.filtered_out;
        self.batches_processed += other.batches_processed;
    }

    pub fn error_rate(&self) -> f64 {
        crate::utils::math::percentage(self.decode_errors, self.entries_scanned)
    }

    pub fn snapshot(&self) -> ScanSummary {
        ScanSummary {
            entries_scanned: self.entries_scanned,
            records_decoded: self.records_decoded,
            decode_errors: self.decode_errors,
            filtered_out: self.filtered_out,
            elapsed_seconds: self.duration().as_secs_f64(),
        }
    }
}

impl crate::processor::StageMetrics for ScanStats {
    fn format_custom_metrics(&self) -> String {
        format!(
            "Outputs: {} | Errors: {}",
            self.records_decoded, self.decode_errors
        )
    }
}

impl StatisticsCollector for ScanStats {
    fn finish(&mut self) {
        self.finished = Some(self.duration());
    }

    fn duration(&self) -> Duration {
        match (self.finished, self.started) {
            (Some(total), _) => total,
            (None, Some(started)) => started.elapsed(),
            (None, None) => Duration::ZERO,
        }
    }

    fn processing_rate(&self) -> f64 {
        let secs = self.duration().as_secs_f64();
        if secs > 0.0 {
            self.entries_scanned as f64 / secs
        } else {
            0.0
        }
    }

    fn summary(&self) -> String {
        format!(
            "{} entries scanned, {} outputs decoded, {} errors ({:.2}%), {:.1} entries/sec",
            self.entries_scanned,
            self.records_decoded,
            self.decode_errors,
            self.error_rate(),
            self.processing_rate()
        )
    }
}

/// Serializable view of [`ScanStats`] for reports
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanSummary {
    pub entries_scanned: u64,
    pub records_decoded: u64,
    pub decode_errors: u64,
    pub filtered_out: u64,
    pub elapsed_seconds: f64,
}
