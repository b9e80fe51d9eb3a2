//! Scan, decode, classify and fold a whole chainstate
//!
//! The calling thread walks the store's ordered prefix scan and cuts it into
//! batches. Scoped worker threads pull batches from a bounded channel, each
//! decoding into its own [`FeeRateHistogram`] and [`ScanStats`]. Partials are
//! merged once the scan ends and the cumulative pass runs on the merged
//! result.
//!
//! Undecodable entries are counted and skipped unless `strict` is set, in
//! which case the first one stops the scan.

use super::classifier::{Classifier, ClassifierSettings};
use super::estimation::EstimationProfile;
use super::histogram::{CumulativeHistogram, FeeRateHistogram, FeeRateRange};
use super::script_patterns::is_non_standard_output;
use crate::chainstate::{
    decode_entry, ChainstateFormat, ChainstateSource, DecodedEntry, ObfuscationKey, RawEntry,
    UtxoRecord,
};
use crate::errors::{AppError, AppResult};
use crate::processor::{ConfigValidator, ProgressReporter, StageMetrics, StandardProgressTracker};
use crate::types::statistics::{ScanStats, StatisticsCollector};
use crossbeam::channel;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use tracing::{debug, info, warn};

/// Everything a dust analysis run needs besides the store
#[derive(Debug, Clone)]
pub struct AnalysisOptions {
    pub format: ChainstateFormat,
    pub range: FeeRateRange,
    pub classifier: ClassifierSettings,
    /// Only count non-standard outputs in the buckets
    pub non_std_only: bool,
    /// Abort on the first undecodable entry
    pub strict: bool,
    pub workers: usize,
    pub batch_size: usize,
    pub progress_interval_ms: u64,
    pub show_progress: bool,
}

impl AnalysisOptions {
    pub fn validate(&self) -> AppResult<()> {
        self.range.validate()?;
        if self.classifier.fee_step != self.range.fee_step {
            return Err(AppError::Config(format!(
                "Classifier fee step {} does not match histogram fee step {}",
                self.classifier.fee_step, self.range.fee_step
            )));
        }
        if self.workers == 0 {
            return Err(AppError::Config(
                "Worker count must be greater than 0".to_string(),
            ));
        }
        ConfigValidator::validate_batch_config(self.batch_size, self.progress_interval_ms)
    }
}

/// Result of a full dust analysis
#[derive(Debug, Clone)]
pub struct DustAnalysis {
    pub histogram: CumulativeHistogram,
    pub stats: ScanStats,
    pub estimation_available: bool,
}

/// Live counters shown on the progress line
#[derive(Debug, Default)]
struct ProgressCounters {
    decoded: AtomicU64,
    errors: AtomicU64,
}

impl StageMetrics for ProgressCounters {
    fn format_custom_metrics(&self) -> String {
        format!(
            "Outputs: {} | Errors: {}",
            self.decoded.load(Ordering::Relaxed),
            self.errors.load(Ordering::Relaxed)
        )
    }
}

/// A batch of raw entries and the scan position of its first entry
struct Batch {
    first_index: usize,
    entries: Vec<RawEntry>,
}

/// Classify one record into a partial histogram
pub fn fold_record(
    histogram: &mut FeeRateHistogram,
    stats: &mut ScanStats,
    classifier: &Classifier<'_>,
    record: &UtxoRecord,
    non_std_only: bool,
) {
    let classification = classifier.classify(record);
    let in_buckets = !non_std_only || is_non_standard_output(record.out_type(), record.script_payload());
    if !in_buckets {
        stats.filtered_out += 1;
    }
    stats.records_decoded += 1;
    histogram.record(record, &classification, in_buckets);
}

/// Run the dust and non-profitability analysis over every entry of `source`
pub fn run_dust_analysis<S: ChainstateSource>(
    source: &mut S,
    options: &AnalysisOptions,
    estimation: Option<&EstimationProfile>,
) -> AppResult<DustAnalysis> {
    options.validate()?;
    ConfigValidator::log_config_summary(
        "Dust analysis",
        &[
            ("Format", options.format.to_string()),
            ("Workers", options.workers.to_string()),
            ("Batch size", options.batch_size.to_string()),
            (
                "Fee rates",
                format!(
                    "{}..={} step {}",
                    options.range.min_rate, options.range.max_rate, options.range.fee_step
                ),
            ),
            ("Dust policy", options.classifier.dust_policy.to_string()),
            ("Non-standard only", options.non_std_only.to_string()),
        ],
    );

    let key = source.obfuscation_key()?;
    let classifier = Classifier::new(options.classifier, estimation);
    let abort = AtomicBool::new(false);
    let counters = ProgressCounters::default();
    let mut producer_stats = ScanStats::new();

    let partials = crossbeam::thread::scope(|scope| -> AppResult<Vec<(FeeRateHistogram, ScanStats)>> {
        let (sender, receiver) = channel::bounded::<Batch>(options.workers * 2);

        let mut handles = Vec::with_capacity(options.workers);
        for worker_id in 0..options.workers {
            let receiver = receiver.clone();
            let key = &key;
            let classifier = &classifier;
            let abort = &abort;
            let counters = &counters;
            handles.push(scope.spawn(move |_| {
                run_worker(worker_id, receiver, key, classifier, options, abort, counters)
            }));
        }
        drop(receiver);

        let mut tracker = StandardProgressTracker::with_interval(options.progress_interval_ms);
        let mut batch = Vec::with_capacity(options.batch_size);
        let mut first_index = 0;

        for entry in source.scan_prefix(options.format.prefix())? {
            if abort.load(Ordering::Relaxed) {
                break;
            }
            batch.push(entry);
            producer_stats.entries_scanned += 1;

            if batch.len() >= options.batch_size {
                let entries = std::mem::replace(&mut batch, Vec::with_capacity(options.batch_size));
                let count = entries.len();
                if sender.send(Batch { first_index, entries }).is_err() {
                    break;
                }
                first_index += count;
                producer_stats.batches_processed += 1;
            }

            if options.show_progress && tracker.should_report() {
                ProgressReporter::report_progress(
                    &counters,
                    producer_stats.entries_scanned,
                    tracker.elapsed_seconds(),
                )?;
            }
        }
        if !batch.is_empty() && !abort.load(Ordering::Relaxed) {
            // Receivers only disappear when every worker has stopped
            let _ = sender.send(Batch {
                first_index,
                entries: batch,
            });
            producer_stats.batches_processed += 1;
        }
        drop(sender);

        if options.show_progress {
            ProgressReporter::finish_progress_line();
        }

        let mut partials = Vec::with_capacity(handles.len());
        let mut first_error = None;
        for handle in handles {
            match handle.join() {
                Ok(Ok(partial)) => partials.push(partial),
                Ok(Err(e)) => {
                    first_error.get_or_insert(e);
                }
                Err(_) => {
                    first_error.get_or_insert(AppError::InvalidData(
                        "Analysis worker panicked".to_string(),
                    ));
                }
            }
        }
        match first_error {
            Some(e) => Err(e),
            None => Ok(partials),
        }
    })
    .map_err(|_| AppError::InvalidData("Analysis worker panicked".to_string()))??;

    let mut histogram = FeeRateHistogram::new(options.range);
    let mut stats = producer_stats;
    for (partial, partial_stats) in &partials {
        histogram.merge(partial)?;
        stats.merge(partial_stats);
    }
    stats.finish();

    if stats.decode_errors > 0 {
        warn!(
            "{} of {} entries could not be decoded and were skipped",
            stats.decode_errors, stats.entries_scanned
        );
    }
    ProgressReporter::report_completion(
        "Dust analysis",
        stats.entries_scanned,
        stats.records_decoded,
        stats.duration().as_secs_f64(),
    );
    info!("{}", stats.summary());

    Ok(DustAnalysis {
        histogram: histogram.finalize(),
        stats,
        estimation_available: estimation.is_some(),
    })
}

fn run_worker(
    worker_id: usize,
    receiver: channel::Receiver<Batch>,
    key: &ObfuscationKey,
    classifier: &Classifier<'_>,
    options: &AnalysisOptions,
    abort: &AtomicBool,
    counters: &ProgressCounters,
) -> AppResult<(FeeRateHistogram, ScanStats)> {
    let mut histogram = FeeRateHistogram::new(options.range);
    let mut stats = ScanStats::new();

    for batch in receiver.iter() {
        if abort.load(Ordering::Relaxed) {
            break;
        }
        for (offset, entry) in batch.entries.iter().enumerate() {
            let records = match decode_entry(options.format, key, entry) {
                Ok(decoded) => decoded.into_records(),
                Err(e) => {
                    let index = batch.first_index + offset;
                    if options.strict {
                        abort.store(true, Ordering::Relaxed);
                        return Err(AppError::InvalidRecord {
                            index,
                            reason: format!("key {}: {}", hex::encode(&entry.key), e),
                        });
                    }
                    debug!("Skipping entry {} ({}): {}", index, hex::encode(&entry.key), e);
                    stats.decode_errors += 1;
                    counters.errors.fetch_add(1, Ordering::Relaxed);
                    continue;
                }
            };
            counters
                .decoded
                .fetch_add(records.len() as u64, Ordering::Relaxed);
            for record in &records {
                fold_record(&mut histogram, &mut stats, classifier, record, options.non_std_only);
            }
        }
    }

    debug!("Worker {} finished: {}", worker_id, stats.records_decoded);
    Ok((histogram, stats))
}

/// Decode every entry of `source` in order, on the calling thread
///
/// `visit` sees each decoded entry. Undecodable entries are skipped and
/// counted unless `strict` is set.
pub fn for_each_entry<S, F>(
    source: &mut S,
    format: ChainstateFormat,
    strict: bool,
    mut visit: F,
) -> AppResult<ScanStats>
where
    S: ChainstateSource,
    F: FnMut(DecodedEntry) -> AppResult<()>,
{
    let key = source.obfuscation_key()?;
    let mut stats = ScanStats::new();

    for (index, entry) in source.scan_prefix(format.prefix())?.enumerate() {
        stats.entries_scanned += 1;
        match decode_entry(format, &key, &entry) {
            Ok(decoded) => {
                stats.records_decoded += match &decoded {
                    DecodedEntry::Modern(_) => 1,
                    DecodedEntry::Legacy(legacy) => legacy.outputs.len() as u64,
                };
                visit(decoded)?;
            }
            Err(e) if strict => {
                return Err(AppError::InvalidRecord {
                    index,
                    reason: format!("key {}: {}", hex::encode(&entry.key), e),
                });
            }
            Err(e) => {
                debug!("Skipping entry {} ({}): {}", index, hex::encode(&entry.key), e);
                stats.decode_errors += 1;
            }
        }
    }

    stats.finish();
    if stats.decode_errors > 0 {
        warn!(
            "{} of {} entries could not be decoded and were skipped",
            stats.decode_errors, stats.entries_scanned
        );
    }
    Ok(stats)
}
