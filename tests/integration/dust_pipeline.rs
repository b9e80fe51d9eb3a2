//! Dust analysis over whole synthetic chainstates

use utxo_dust_analyser::analysis::pipeline::fold_record;
use utxo_dust_analyser::analysis::{
    for_each_entry, run_dust_analysis, ClassificationKind, Classifier, FeeRateHistogram, Rate,
};
use utxo_dust_analyser::analysis::reports::{OutputFormat, ReportFormatter};
use utxo_dust_analyser::chainstate::{ChainstateFormat, UtxoRecord};
use utxo_dust_analyser::errors::AppError;
use utxo_dust_analyser::types::analysis_results::DustReport;
use utxo_dust_analyser::types::statistics::ScanStats;

use crate::common::{analysis_options, sample_chainstate, SAMPLE_OUTPUTS};

fn sample_records(format: ChainstateFormat) -> Vec<UtxoRecord> {
    let mut records = Vec::new();
    let mut source = sample_chainstate(format).memory();
    for_each_entry(&mut source, format, true, |entry| {
        records.extend(entry.into_records());
        Ok(())
    })
    .unwrap();
    records
}

#[test]
fn test_histogram_independent_of_worker_count() {
    let mut source = sample_chainstate(ChainstateFormat::Modern).memory();

    let single = run_dust_analysis(
        &mut source,
        &analysis_options(ChainstateFormat::Modern, 10, 200, 1),
        None,
    )
    .unwrap();
    let parallel = run_dust_analysis(
        &mut source,
        &analysis_options(ChainstateFormat::Modern, 10, 200, 4),
        None,
    )
    .unwrap();

    assert_eq!(single.histogram, parallel.histogram);
    assert_eq!(single.stats.records_decoded, SAMPLE_OUTPUTS);
    assert_eq!(parallel.stats.records_decoded, SAMPLE_OUTPUTS);
    assert_eq!(parallel.histogram.totals().utxo_count, SAMPLE_OUTPUTS);
}

#[test]
fn test_layouts_produce_the_same_histogram() {
    let mut modern = sample_chainstate(ChainstateFormat::Modern).memory();
    let mut legacy = sample_chainstate(ChainstateFormat::Legacy).memory();

    let from_modern = run_dust_analysis(
        &mut modern,
        &analysis_options(ChainstateFormat::Modern, 5, 100, 2),
        None,
    )
    .unwrap();
    let from_legacy = run_dust_analysis(
        &mut legacy,
        &analysis_options(ChainstateFormat::Legacy, 5, 100, 2),
        None,
    )
    .unwrap();

    assert_eq!(from_legacy.stats.entries_scanned, 5);
    assert_eq!(from_modern.stats.entries_scanned, SAMPLE_OUTPUTS);
    assert_eq!(from_modern.histogram, from_legacy.histogram);
}

#[test]
fn test_merged_partials_equal_single_pass() {
    let options = analysis_options(ChainstateFormat::Modern, 10, 200, 1);
    let classifier = Classifier::new(options.classifier, None);
    let records = sample_records(ChainstateFormat::Modern);

    let mut whole = FeeRateHistogram::new(options.range);
    let mut whole_stats = ScanStats::new();
    for record in &records {
        fold_record(&mut whole, &mut whole_stats, &classifier, record, false);
    }

    let (left, right) = records.split_at(4);
    let mut merged = FeeRateHistogram::new(options.range);
    let mut merged_stats = ScanStats::new();
    for part in [left, right] {
        let mut partial = FeeRateHistogram::new(options.range);
        let mut partial_stats = ScanStats::new();
        for record in part {
            fold_record(&mut partial, &mut partial_stats, &classifier, record, false);
        }
        merged.merge(&partial).unwrap();
        merged_stats.merge(&partial_stats);
    }

    assert_eq!(merged, whole);
    assert_eq!(merged_stats.records_decoded, whole_stats.records_decoded);
    assert_eq!(merged.finalize(), whole.finalize());
}

#[test]
fn test_cumulative_counts_never_decrease() {
    let mut source = sample_chainstate(ChainstateFormat::Modern).memory();
    let analysis = run_dust_analysis(
        &mut source,
        &analysis_options(ChainstateFormat::Modern, 1, 300, 3),
        None,
    )
    .unwrap();

    assert!(analysis.histogram.is_monotonic());
    for kind in ClassificationKind::ALL {
        let series = analysis.histogram.series(kind);
        assert_eq!(series.len(), 301);
        assert!(series.windows(2).all(|w| w[0].1.utxo_count <= w[1].1.utxo_count));
    }
}

#[test]
fn test_p2sh_and_unknown_counters() {
    let mut source = sample_chainstate(ChainstateFormat::Modern).memory();
    let analysis = run_dust_analysis(
        &mut source,
        &analysis_options(ChainstateFormat::Modern, 10, 200, 2),
        None,
    )
    .unwrap();

    let dust = analysis.histogram.kind(ClassificationKind::Dust);
    assert_eq!(dust.skipped, 1);
    assert_eq!(dust.unknown, 0);

    // Without estimation data every estimated rate is unknown
    let estimated = analysis.histogram.kind(ClassificationKind::NonProfitableEstimated);
    assert_eq!(estimated.unknown, SAMPLE_OUTPUTS);
    assert!(estimated.buckets.iter().all(|b| b.utxo_count == 0));
    assert!(!analysis.estimation_available);
}

#[test]
fn test_zero_value_output_is_dust_at_every_rate() {
    let records = sample_records(ChainstateFormat::Modern);
    let options = analysis_options(ChainstateFormat::Modern, 10, 200, 1);
    let classifier = Classifier::new(options.classifier, None);

    let op_return = records.iter().find(|r| r.amount() == 0).unwrap();
    assert_eq!(classifier.classify(op_return).dust, Rate::Value(0));

    let mut source = sample_chainstate(ChainstateFormat::Modern).memory();
    let analysis = run_dust_analysis(&mut source, &options, None).unwrap();
    let at_zero = analysis.histogram.at(ClassificationKind::Dust, 0).unwrap();
    assert!(at_zero.utxo_count >= 1);
}

#[test]
fn test_non_standard_filter_keeps_totals() {
    let mut source = sample_chainstate(ChainstateFormat::Modern).memory();
    let mut options = analysis_options(ChainstateFormat::Modern, 10, 200, 2);
    options.non_std_only = true;
    let analysis = run_dust_analysis(&mut source, &options, None).unwrap();

    // The P2WPKH and OP_RETURN scripts are neither templates nor bare multisig
    assert_eq!(analysis.histogram.totals().utxo_count, SAMPLE_OUTPUTS);
    assert_eq!(analysis.stats.filtered_out, SAMPLE_OUTPUTS - 2);
    let max = analysis.histogram.at(ClassificationKind::NonProfitable, 200).unwrap();
    assert_eq!(max.utxo_count, 2);
    assert_eq!(max.total_value, 294);
}

#[test]
fn test_strict_run_reports_bad_entry() {
    let mut source = sample_chainstate(ChainstateFormat::Modern)
        .raw(
            {
                let mut key = vec![b'C'];
                key.extend_from_slice(&[0x02; 32]);
                key.push(0x02);
                key
            },
            vec![0xff],
        )
        .memory();

    let mut options = analysis_options(ChainstateFormat::Modern, 10, 200, 2);
    options.strict = true;
    let result = run_dust_analysis(&mut source, &options, None);
    assert!(matches!(result, Err(AppError::InvalidRecord { .. })));

    options.strict = false;
    let analysis = run_dust_analysis(&mut source, &options, None).unwrap();
    assert_eq!(analysis.stats.decode_errors, 1);
    assert_eq!(analysis.histogram.totals().utxo_count, SAMPLE_OUTPUTS);
}

#[test]
fn test_report_from_analysis() {
    let mut source = sample_chainstate(ChainstateFormat::Modern).memory();
    let options = analysis_options(ChainstateFormat::Modern, 10, 100, 2);
    let analysis = run_dust_analysis(&mut source, &options, None).unwrap();
    let report = DustReport::new(&analysis, &options);

    assert_eq!(report.totals.utxo_count, SAMPLE_OUTPUTS);
    let dust = report.kind(ClassificationKind::Dust).unwrap();
    assert_eq!(dust.rows.len(), 11);

    let json = ReportFormatter::format_dust_report(&report, &OutputFormat::Json).unwrap();
    let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert_eq!(parsed["settings"]["fee_step"], 10);
    assert_eq!(parsed["kinds"].as_array().unwrap().len(), 3);

    let console = ReportFormatter::format_dust_report(&report, &OutputFormat::Console).unwrap();
    assert!(console.contains("TOTAL: 9 outputs"));
}
