//! Dust and non-profitability report types
//!
//! Every row is cumulative: the outputs counted at fee rate `r` are all the
//! outputs that are dust (or non-profitable) when fees are `r` sat/byte.

use crate::analysis::classifier::DustPolicy;
use crate::analysis::histogram::{BucketStats, ClassificationKind, CumulativeHistogram};
use crate::analysis::pipeline::{AnalysisOptions, DustAnalysis};
use crate::chainstate::ChainstateFormat;
use crate::types::statistics::ScanSummary;
use crate::utils::math::percentage;
use serde::{Deserialize, Serialize};

/// Full dust analysis report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DustReport {
    pub settings: ReportSettings,
    /// Every decoded output, filtered or not
    pub totals: BucketStats,
    /// One entry per classification, in dust / non-profitable / estimated order
    pub kinds: Vec<KindReport>,
    pub scan: ScanSummary,
}

/// Parameters the report was produced with
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportSettings {
    pub format: ChainstateFormat,
    pub fee_step: u64,
    pub min_rate: u64,
    pub max_rate: u64,
    pub dust_policy: DustPolicy,
    pub coin: String,
    pub count_p2sh: bool,
    pub non_std_only: bool,
    pub estimation_available: bool,
}

/// Cumulative rows of one classification
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KindReport {
    pub kind: ClassificationKind,
    /// Outputs whose rate could not be computed
    pub unknown: u64,
    /// Outputs excluded by configuration
    pub skipped: u64,
    /// Outputs classified only above `max_rate`
    pub above_range: u64,
    pub rows: Vec<FeeRateRow>,
}

/// One fee rate of a cumulative series
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeeRateRow {
    pub fee_rate: u64,
    pub utxo_count: u64,
    pub total_value: u64,
    pub total_data_len: u64,
    pub pct_count: f64,
    pub pct_value: f64,
    pub pct_data_len: f64,
}

impl FeeRateRow {
    pub fn new(fee_rate: u64, stats: &BucketStats, totals: &BucketStats) -> Self {
        Self {
            fee_rate,
            utxo_count: stats.utxo_count,
            total_value: stats.total_value,
            total_data_len: stats.total_data_len,
            pct_count: percentage(stats.utxo_count, totals.utxo_count),
            pct_value: percentage(stats.total_value, totals.total_value),
            pct_data_len: percentage(stats.total_data_len, totals.total_data_len),
        }
    }
}

impl KindReport {
    pub fn new(kind: ClassificationKind, histogram: &CumulativeHistogram) -> Self {
        let buckets = histogram.kind(kind);
        let totals = histogram.totals();
        Self {
            kind,
            unknown: buckets.unknown,
            skipped: buckets.skipped,
            above_range: buckets.above_range,
            rows: histogram
                .series(kind)
                .iter()
                .map(|(rate, stats)| FeeRateRow::new(*rate, stats, totals))
                .collect(),
        }
    }

    /// Row at exactly `fee_rate`
    pub fn row(&self, fee_rate: u64) -> Option<&FeeRateRow> {
        self.rows.iter().find(|row| row.fee_rate == fee_rate)
    }
}

impl DustReport {
    pub fn new(analysis: &DustAnalysis, options: &AnalysisOptions) -> Self {
        let range = analysis.histogram.range();
        Self {
            settings: ReportSettings {
                format: options.format,
                fee_step: range.fee_step,
                min_rate: range.min_rate,
                max_rate: range.max_rate,
                dust_policy: options.classifier.dust_policy,
                coin: options.classifier.coin.to_string(),
                count_p2sh: options.classifier.count_p2sh,
                non_std_only: options.non_std_only,
                estimation_available: analysis.estimation_available,
            },
            totals: *analysis.histogram.totals(),
            kinds: ClassificationKind::ALL
                .iter()
                .map(|kind| KindReport::new(*kind, &analysis.histogram))
                .collect(),
            scan: analysis.stats.snapshot(),
        }
    }

    pub fn kind(&self, kind: ClassificationKind) -> Option<&KindReport> {
        self.kinds.iter().find(|report| report.kind == kind)
    }
}
