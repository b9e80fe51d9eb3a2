//! Fee-rate histograms of classified outputs
//!
//! Three histograms (dust, non-profitable, estimated non-profitable) share
//! one bucket grid: every multiple of `fee_step` from `min_rate` to
//! `max_rate`. Each output is counted once, in the bucket of its threshold
//! rate. [`FeeRateHistogram::finalize`] then runs a single forward
//! cumulative pass so that bucket `r` holds every output classified at `r`.
//!
//! Partial histograms built by different workers merge elementwise before
//! finalisation.

use super::classifier::{Classification, Rate};
use crate::chainstate::UtxoRecord;
use crate::errors::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Upper bound on buckets per histogram; every histogram allocates the grid up front
pub const MAX_BUCKETS: u64 = 1_000_000;

/// Bucket grid shared by all histograms of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeRateRange {
    pub fee_step: u64,
    pub min_rate: u64,
    pub max_rate: u64,
}

impl FeeRateRange {
    pub fn new(fee_step: u64, min_rate: u64, max_rate: u64) -> AppResult<Self> {
        let range = Self {
            fee_step,
            min_rate,
            max_rate,
        };
        range.validate()?;
        Ok(range)
    }

    pub fn validate(&self) -> AppResult<()> {
        if self.fee_step == 0 {
            return Err(AppError::Config(
                "Fee step must be greater than 0".to_string(),
            ));
        }
        if self.min_rate > self.max_rate {
            return Err(AppError::Config(format!(
                "Minimum fee rate {} is above maximum fee rate {}",
                self.min_rate, self.max_rate
            )));
        }
        if self.min_rate % self.fee_step != 0 {
            return Err(AppError::Config(format!(
                "Minimum fee rate {} is not a multiple of the fee step {}",
                self.min_rate, self.fee_step
            )));
        }
        let steps = (self.max_rate - self.min_rate) / self.fee_step;
        if steps >= MAX_BUCKETS {
            return Err(AppError::Config(format!(
                "Fee rates {}..={} in steps of {} need {} buckets, more than the limit of {}",
                self.min_rate,
                self.max_rate,
                self.fee_step,
                steps.saturating_add(1),
                MAX_BUCKETS
            )));
        }
        Ok(())
    }

    /// Number of buckets; saturates for a range that never went through `validate`
    pub fn bucket_count(&self) -> usize {
        let steps = self.max_rate.saturating_sub(self.min_rate) / self.fee_step.max(1);
        steps
            .checked_add(1)
            .and_then(|count| usize::try_from(count).ok())
            .unwrap_or(usize::MAX)
    }

    /// Fee rate of every bucket, ascending
    pub fn rates(&self) -> impl Iterator<Item = u64> + '_ {
        (0..self.bucket_count() as u64).map(move |i| self.min_rate + i * self.fee_step)
    }

    /// Bucket holding `rate`
    ///
    /// Rates below the grid land in the first bucket, since an output
    /// classified below `min_rate` is also classified at it. Rates above
    /// `max_rate` have no bucket.
    pub fn bucket_index(&self, rate: u64) -> Option<usize> {
        if rate > self.max_rate {
            return None;
        }
        if rate <= self.min_rate {
            return Some(0);
        }
        Some(((rate - self.min_rate) / self.fee_step) as usize)
    }
}

/// Count, value and compressed script bytes of a set of outputs
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BucketStats {
    pub utxo_count: u64,
    pub total_value: u64,
    pub total_data_len: u64,
}

impl BucketStats {
    pub fn add_record(&mut self, record: &UtxoRecord) {
        self.utxo_count += 1;
        self.total_value = self.total_value.saturating_add(record.amount());
        self.total_data_len += record.utxo_data_len() as u64;
    }

    pub fn merge(&mut self, other: &BucketStats) {
        self.utxo_count += other.utxo_count;
        self.total_value = self.total_value.saturating_add(other.total_value);
        self.total_data_len += other.total_data_len;
    }
}

/// Which threshold a histogram is built from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClassificationKind {
    Dust,
    NonProfitable,
    NonProfitableEstimated,
}

impl ClassificationKind {
    pub const ALL: [ClassificationKind; 3] = [
        ClassificationKind::Dust,
        ClassificationKind::NonProfitable,
        ClassificationKind::NonProfitableEstimated,
    ];

    pub fn rate_of(&self, classification: &Classification) -> Rate {
        match self {
            ClassificationKind::Dust => classification.dust,
            ClassificationKind::NonProfitable => classification.non_profitable,
            ClassificationKind::NonProfitableEstimated => classification.non_profitable_est,
        }
    }

    fn index(&self) -> usize {
        match self {
            ClassificationKind::Dust => 0,
            ClassificationKind::NonProfitable => 1,
            ClassificationKind::NonProfitableEstimated => 2,
        }
    }
}

impl fmt::Display for ClassificationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClassificationKind::Dust => write!(f, "Dust"),
            ClassificationKind::NonProfitable => write!(f, "Non-profitable (min. input size)"),
            ClassificationKind::NonProfitableEstimated => {
                write!(f, "Non-profitable (est. input size)")
            }
        }
    }
}

/// Buckets of one classification kind, plus what fell outside them
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KindBuckets {
    pub buckets: Vec<BucketStats>,
    pub unknown: u64,
    pub skipped: u64,
    pub above_range: u64,
}

impl KindBuckets {
    fn new(bucket_count: usize) -> Self {
        Self {
            buckets: vec![BucketStats::default(); bucket_count],
            unknown: 0,
            skipped: 0,
            above_range: 0,
        }
    }

    fn merge(&mut self, other: &KindBuckets) {
        for (mine, theirs) in self.buckets.iter_mut().zip(&other.buckets) {
            mine.merge(theirs);
        }
        self.unknown += other.unknown;
        self.skipped += other.skipped;
        self.above_range += other.above_range;
    }
}

/// Per-bucket counts, before the cumulative pass
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeeRateHistogram {
    range: FeeRateRange,
    kinds: [KindBuckets; 3],
    totals: BucketStats,
}

impl FeeRateHistogram {
    pub fn new(range: FeeRateRange) -> Self {
        let count = range.bucket_count();
        Self {
            range,
            kinds: [
                KindBuckets::new(count),
                KindBuckets::new(count),
                KindBuckets::new(count),
            ],
            totals: BucketStats::default(),
        }
    }

    pub fn range(&self) -> &FeeRateRange {
        &self.range
    }

    pub fn totals(&self) -> &BucketStats {
        &self.totals
    }

    pub fn kind(&self, kind: ClassificationKind) -> &KindBuckets {
        &self.kinds[kind.index()]
    }

    /// Count a classified record
    ///
    /// Totals always include the record. Buckets only do when `in_buckets`
    /// is set, which is how record filters are applied.
    pub fn record(&mut self, record: &UtxoRecord, classification: &Classification, in_buckets: bool) {
        self.totals.add_record(record);
        if !in_buckets {
            return;
        }

        for kind in ClassificationKind::ALL {
            let range = self.range;
            let target = &mut self.kinds[kind.index()];
            match kind.rate_of(classification) {
                Rate::Value(rate) => match range.bucket_index(rate) {
                    Some(index) => target.buckets[index].add_record(record),
                    None => target.above_range += 1,
                },
                Rate::Skipped => target.skipped += 1,
                Rate::Unknown => target.unknown += 1,
            }
        }
    }

    /// Fold another partial histogram into this one
    pub fn merge(&mut self, other: &FeeRateHistogram) -> AppResult<()> {
        if self.range != other.range {
            return Err(AppError::Config(format!(
                "Cannot merge histograms over different fee rate ranges ({:?} vs {:?})",
                self.range, other.range
            )));
        }
        for (mine, theirs) in self.kinds.iter_mut().zip(&other.kinds) {
            mine.merge(theirs);
        }
        self.totals.merge(&other.totals);
        Ok(())
    }

    /// Run the cumulative pass
    pub fn finalize(mut self) -> CumulativeHistogram {
        for kind in self.kinds.iter_mut() {
            for i in 1..kind.buckets.len() {
                let previous = kind.buckets[i - 1];
                kind.buckets[i].merge(&previous);
            }
        }
        CumulativeHistogram {
            range: self.range,
            kinds: self.kinds,
            totals: self.totals,
        }
    }
}

/// Cumulative histograms: bucket `r` counts every output classified at rate `r`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CumulativeHistogram {
    range: FeeRateRange,
    kinds: [KindBuckets; 3],
    totals: BucketStats,
}

impl CumulativeHistogram {
    pub fn range(&self) -> &FeeRateRange {
        &self.range
    }

    pub fn totals(&self) -> &BucketStats {
        &self.totals
    }

    pub fn kind(&self, kind: ClassificationKind) -> &KindBuckets {
        &self.kinds[kind.index()]
    }

    /// Stats of `kind` at exactly `fee_rate`, if it is on the grid
    pub fn at(&self, kind: ClassificationKind, fee_rate: u64) -> Option<&BucketStats> {
        if fee_rate < self.range.min_rate || (fee_rate - self.range.min_rate) % self.range.fee_step != 0 {
            return None;
        }
        let index = self.range.bucket_index(fee_rate)?;
        self.kind(kind).buckets.get(index)
    }

    /// `(fee_rate, stats)` pairs of `kind`, ascending
    pub fn series(&self, kind: ClassificationKind) -> Vec<(u64, BucketStats)> {
        self.range
            .rates()
            .zip(self.kind(kind).buckets.iter().copied())
            .collect()
    }

    /// Whether every series is non-decreasing in count, value and data length
    pub fn is_monotonic(&self) -> bool {
        self.kinds.iter().all(|kind| {
            kind.buckets.windows(2).all(|pair| {
                pair[0].utxo_count <= pair[1].utxo_count
                    && pair[0].total_value <= pair[1].total_value
                    && pair[0].total_data_len <= pair[1].total_data_len
            })
        })
    }
}
