//! Per-transaction aggregation of unspent outputs
//!
//! Legacy records already hold a whole transaction. Modern records hold one
//! output each; their keys sort by txid, so a scan yields the outputs of a
//! transaction back to back and consecutive outputs with the same txid fold
//! into one [`TransactionSummary`]. Only the transaction being folded is
//! held in memory.

use super::pipeline::for_each_entry;
use crate::chainstate::{ChainstateFormat, ChainstateSource, DecodedEntry, TxId, UtxoRecord};
use crate::errors::AppResult;
use crate::types::statistics::ScanStats;
use crate::types::TransactionSummary;

/// Streaming fold over a txid-ordered record stream
#[derive(Debug, Default)]
pub struct TransactionAggregator {
    current: Option<(TxId, TransactionSummary)>,
}

impl TransactionAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add the next record, returning the previous transaction once it is complete
    pub fn push(&mut self, record: &UtxoRecord) -> Option<TransactionSummary> {
        let tx_id = record.outpoint.tx_id;
        match self.current.as_mut() {
            Some((current_id, summary)) if *current_id == tx_id => {
                summary.add_record(record);
                None
            }
            _ => self
                .current
                .replace((tx_id, TransactionSummary::from_record(record)))
                .map(|(_, done)| done),
        }
    }

    /// The last transaction, if any
    pub fn finish(self) -> Option<TransactionSummary> {
        self.current.map(|(_, summary)| summary)
    }
}

/// Group per-output records by transaction
///
/// Records may arrive in any order.
pub fn summarize_records(mut records: Vec<UtxoRecord>) -> Vec<TransactionSummary> {
    records.sort_by_key(|record| record.outpoint);

    let mut aggregator = TransactionAggregator::new();
    let mut summaries: Vec<TransactionSummary> =
        records.iter().filter_map(|record| aggregator.push(record)).collect();
    summaries.extend(aggregator.finish());
    summaries
}

/// Hand `emit` one summary per transaction with unspent outputs in `source`
///
/// A modern summary is emitted as soon as the scan reaches the next txid.
pub fn stream_transactions<S, F>(
    source: &mut S,
    format: ChainstateFormat,
    strict: bool,
    mut emit: F,
) -> AppResult<ScanStats>
where
    S: ChainstateSource,
    F: FnMut(TransactionSummary) -> AppResult<()>,
{
    let mut aggregator = TransactionAggregator::new();

    let stats = for_each_entry(source, format, strict, |entry| match entry {
        DecodedEntry::Legacy(entry) => emit(TransactionSummary::from_legacy(&entry)),
        DecodedEntry::Modern(record) => match aggregator.push(&record) {
            Some(done) => emit(done),
            None => Ok(()),
        },
    })?;

    if let Some(last) = aggregator.finish() {
        emit(last)?;
    }
    Ok(stats)
}

/// Collect every summary of `source`; holds them all, see [`stream_transactions`]
pub fn collect_transactions<S: ChainstateSource>(
    source: &mut S,
    format: ChainstateFormat,
    strict: bool,
) -> AppResult<(Vec<TransactionSummary>, ScanStats)> {
    let mut summaries = Vec::new();
    let stats = stream_transactions(source, format, strict, |summary| {
        summaries.push(summary);
        Ok(())
    })?;
    Ok((summaries, stats))
}
