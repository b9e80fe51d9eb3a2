use super::output::{resolve_output_path, DumpFormat, RecordWriter};
use super::{load_config, ChainstateArgs, ClassifierArgs};
use crate::analysis::classifier::Classifier;
use crate::analysis::pipeline::for_each_entry;
use crate::analysis::script_patterns::is_non_standard_output;
use crate::errors::{AppError, AppResult};
use crate::processor::ProgressReporter;
use crate::types::statistics::StatisticsCollector;
use crate::types::UtxoDumpRecord;
use clap::Args;
use std::path::PathBuf;
use tracing::info;

/// Decode every unspent output and dump it with its classification
#[derive(Args)]
pub struct ParseCommand {
    #[command(flatten)]
    chainstate: ChainstateArgs,

    #[command(flatten)]
    classifier: ClassifierArgs,

    /// Output file ("-" for stdout, default: <output_dir>/utxos.<ext>)
    #[arg(long, short = 'o')]
    output: Option<PathBuf>,

    /// Dump encoding: jsonl or csv
    #[arg(long, default_value = "jsonl")]
    output_format: String,

    /// Only dump outputs that are neither a standard template nor standard multisig
    #[arg(long)]
    non_std_only: bool,
}

impl ParseCommand {
    pub fn run(&self) -> AppResult<()> {
        info!("=== UTXO Dust Analyser - Parse ===");

        let mut config = load_config()?;
        self.classifier.apply(&mut config);
        config.analysis.non_std_only |= self.non_std_only;

        let format = self.chainstate.format(&config)?;
        let strict = self.chainstate.strict(&config);
        let dump_format: DumpFormat = self.output_format.parse().map_err(AppError::Config)?;
        let settings = config.classifier_settings()?;
        let estimation = self.classifier.estimation(&config);
        let classifier = Classifier::new(settings, estimation.as_ref());
        let non_std_only = config.analysis.non_std_only;

        let output_path = resolve_output_path(
            self.output.as_ref(),
            &config.paths.output_dir,
            "utxos",
            dump_format,
        );
        let mut source = self.chainstate.open(&config)?;
        let mut writer = RecordWriter::create(output_path.as_deref(), dump_format)?;

        let mut stats = for_each_entry(&mut source, format, strict, |entry| {
            for record in entry.into_records() {
                if non_std_only && !is_non_standard_output(record.out_type(), record.script_payload()) {
                    continue;
                }
                let classification = classifier.classify(&record);
                writer.write(&UtxoDumpRecord::new(&record, &classification))?;
            }
            Ok(())
        })?;
        stats.filtered_out = stats.records_decoded.saturating_sub(writer.written());
        let written = writer.finish()?;
        stats.finish();

        ProgressReporter::report_completion(
            "Parse",
            stats.entries_scanned,
            stats.records_decoded,
            stats.duration().as_secs_f64(),
        );
        if let Some(path) = output_path {
            eprintln!("{} outputs written to: {}", written, path.display());
        }
        eprintln!("{}", stats.summary());
        Ok(())
    }
}
