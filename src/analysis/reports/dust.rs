//! Console rendering of the dust and non-profitability report

use super::utils::{export_json, format_bytes, format_number};
use super::OutputFormat;
use crate::errors::AppResult;
use crate::processor::ProgressReporter;
use crate::types::analysis_results::{DustReport, KindReport};
use crate::types::statistics::ScanSummary;
use crate::utils::currency::format_sats_as_btc;

const HEAVY_RULE: &str = "═══════════════════════════════════════════════════════════════════════════════════════";
const LIGHT_RULE: &str = "───────────────────────────────────────────────────────────────────────────────────────";

/// Format a dust report for the console or as JSON
pub fn format_dust_report(report: &DustReport, format: &OutputFormat) -> AppResult<String> {
    match format {
        OutputFormat::Json => export_json(report),
        OutputFormat::Console => {
            let mut output = String::new();
            let settings = &report.settings;

            output.push_str("\nUTXO DUST AND NON-PROFITABILITY ANALYSIS\n");
            output.push_str(HEAVY_RULE);
            output.push_str("\n\n");

            output.push_str(&format!(
                "Chainstate format: {}   Coin: {}   Dust policy: {}\n",
                settings.format, settings.coin, settings.dust_policy
            ));
            output.push_str(&format!(
                "Fee rates: {} to {} sat/byte, step {}\n",
                settings.min_rate, settings.max_rate, settings.fee_step
            ));
            output.push_str(&format!(
                "P2SH outputs: {}   Filter: {}\n\n",
                if settings.count_p2sh { "counted" } else { "skipped" },
                if settings.non_std_only {
                    "non-standard outputs only"
                } else {
                    "none"
                }
            ));

            let totals = &report.totals;
            output.push_str(&format!(
                "TOTAL: {} outputs, {}, {} of compressed scripts\n",
                format_number(totals.utxo_count),
                format_sats_as_btc(totals.total_value),
                format_bytes(totals.total_data_len)
            ));
            output.push_str(LIGHT_RULE);
            output.push_str("\n\n");

            for kind in &report.kinds {
                output.push_str(&format_kind(kind, settings.estimation_available));
            }

            output.push_str(&format_scan_summary(&report.scan));
            Ok(output)
        }
    }
}

fn format_kind(kind: &KindReport, estimation_available: bool) -> String {
    let mut output = String::new();
    output.push_str(&format!("{}\n", kind.kind.to_string().to_uppercase()));

    if kind.rows.iter().all(|row| row.utxo_count == 0) && kind.unknown > 0 && !estimation_available {
        output.push_str(&format!(
            "  No estimation data: {} outputs have an unknown rate\n\n",
            format_number(kind.unknown)
        ));
        return output;
    }

    output.push_str(&format!(
        "{:>10} │ {:>14} │ {:>8} │ {:>20} │ {:>8} │ {:>12}\n",
        "sat/byte", "Outputs", "%", "Value (sats)", "%", "Data"
    ));
    output.push_str("───────────┼────────────────┼──────────┼──────────────────────┼──────────┼─────────────\n");
    for row in &kind.rows {
        output.push_str(&format!(
            "{:>10} │ {:>14} │ {:>7.2}% │ {:>20} │ {:>7.2}% │ {:>12}\n",
            row.fee_rate,
            format_number(row.utxo_count),
            row.pct_count,
            format_number(row.total_value),
            row.pct_value,
            format_bytes(row.total_data_len)
        ));
    }

    if kind.above_range > 0 {
        output.push_str(&format!(
            "  {} outputs only qualify above the highest fee rate\n",
            format_number(kind.above_range)
        ));
    }
    if kind.skipped > 0 {
        output.push_str(&format!(
            "  {} P2SH outputs skipped\n",
            format_number(kind.skipped)
        ));
    }
    if kind.unknown > 0 {
        output.push_str(&format!(
            "  {} outputs with unknown rate\n",
            format_number(kind.unknown)
        ));
    }
    output.push('\n');
    output
}

/// One-paragraph summary of a scan
pub fn format_scan_summary(scan: &ScanSummary) -> String {
    let mut output = format!(
        "Scanned {} entries into {} outputs in {}\n",
        format_number(scan.entries_scanned),
        format_number(scan.records_decoded),
        ProgressReporter::format_elapsed_time(scan.elapsed_seconds)
    );
    if scan.decode_errors > 0 {
        output.push_str(&format!(
            "  {} entries could not be decoded\n",
            format_number(scan.decode_errors)
        ));
    }
    if scan.filtered_out > 0 {
        output.push_str(&format!(
            "  {} outputs left out by the filter\n",
            format_number(scan.filtered_out)
        ));
    }
    output
}
