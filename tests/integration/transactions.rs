//! Per-transaction summaries in both layouts

use utxo_dust_analyser::analysis::{collect_transactions, stream_transactions};
use utxo_dust_analyser::chainstate::ChainstateFormat;
use utxo_dust_analyser::types::TransactionSummary;

use crate::common::{sample_chainstate, sample_transactions, txid};

fn summaries(format: ChainstateFormat) -> Vec<TransactionSummary> {
    let mut source = sample_chainstate(format).memory();
    collect_transactions(&mut source, format, true).unwrap().0
}

#[test]
fn test_modern_outputs_grouped_by_transaction() {
    let summaries = summaries(ChainstateFormat::Modern);
    let expected = sample_transactions();
    assert_eq!(summaries.len(), expected.len());

    for (summary, (tx, height, coinbase, outputs)) in summaries.iter().zip(&expected) {
        assert_eq!(summary.tx_id, txid(*tx).to_string());
        assert_eq!(summary.num_utxos, outputs.len());
        assert_eq!(
            summary.total_value,
            outputs.iter().map(|(_, txout)| txout.amount).sum::<u64>()
        );
        assert_eq!(summary.height, *height);
        assert_eq!(summary.coinbase, *coinbase);
        assert_eq!(summary.version, None);
    }
}

#[test]
fn test_layouts_agree_on_counts_and_values() {
    let modern = summaries(ChainstateFormat::Modern);
    let legacy = summaries(ChainstateFormat::Legacy);
    assert_eq!(modern.len(), legacy.len());

    for (m, l) in modern.iter().zip(&legacy) {
        assert_eq!(m.tx_id, l.tx_id);
        assert_eq!(m.num_utxos, l.num_utxos);
        assert_eq!(m.total_value, l.total_value);
        assert_eq!(m.height, l.height);
        assert_eq!(l.version, Some(1));
    }
}

#[test]
fn test_summary_serializes_to_csv() {
    let summaries = summaries(ChainstateFormat::Legacy);
    let mut writer = csv::Writer::from_writer(Vec::new());
    for summary in &summaries {
        writer.serialize(summary).unwrap();
    }
    let text = String::from_utf8(writer.into_inner().unwrap()).unwrap();
    let mut lines = text.lines();
    assert_eq!(
        lines.next(),
        Some("tx_id,num_utxos,total_value,total_len,height,coinbase,version")
    );
    assert_eq!(lines.count(), summaries.len());
}

#[test]
fn test_stream_writes_each_summary_as_it_completes() {
    let mut source = sample_chainstate(ChainstateFormat::Modern).memory();
    let mut writer = csv::Writer::from_writer(Vec::new());
    let mut emitted_sizes = Vec::new();

    let stats = stream_transactions(&mut source, ChainstateFormat::Modern, true, |summary| {
        emitted_sizes.push(summary.num_utxos);
        writer.serialize(&summary)?;
        Ok(())
    })
    .unwrap();

    let expected: Vec<usize> = sample_transactions()
        .iter()
        .map(|(_, _, _, outputs)| outputs.len())
        .collect();
    assert_eq!(emitted_sizes, expected);
    assert_eq!(stats.records_decoded as usize, expected.iter().sum::<usize>());

    let text = String::from_utf8(writer.into_inner().unwrap()).unwrap();
    assert_eq!(text.lines().count(), expected.len() + 1);
}
