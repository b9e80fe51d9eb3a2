use super::output::write_output_to_file;
use super::{load_config, ChainstateArgs, ClassifierArgs};
use crate::analysis::pipeline::{run_dust_analysis, AnalysisOptions};
use crate::analysis::reports::{OutputFormat, ReportFormatter};
use crate::errors::AppResult;
use crate::types::analysis_results::DustReport;
use clap::Args;
use std::path::PathBuf;
use tracing::info;

/// Build dust and non-profitability histograms over a range of fee rates
#[derive(Args)]
pub struct DustCommand {
    #[command(flatten)]
    chainstate: ChainstateArgs,

    #[command(flatten)]
    classifier: ClassifierArgs,

    /// Lowest fee rate in sat/byte, a multiple of the fee step (overrides config.toml)
    #[arg(long)]
    min_rate: Option<u64>,

    /// Highest fee rate in sat/byte (overrides config.toml)
    #[arg(long)]
    max_rate: Option<u64>,

    /// Only count non-standard outputs in the histograms
    #[arg(long)]
    non_std_only: bool,

    /// Worker threads (overrides config.toml)
    #[arg(long)]
    workers: Option<usize>,

    /// Entries per worker batch (overrides config.toml)
    #[arg(long)]
    batch_size: Option<usize>,

    /// Report format (console or json)
    #[arg(long, default_value = "console")]
    format: String,

    /// Write the report to a file instead of stdout
    #[arg(long, short = 'o')]
    output: Option<PathBuf>,

    /// Show a progress line while scanning
    #[arg(long)]
    progress: bool,
}

impl DustCommand {
    pub fn run(&self) -> AppResult<()> {
        info!("=== UTXO Dust Analyser - Dust ===");

        let mut config = load_config()?;
        self.classifier.apply(&mut config);
        if let Some(min_rate) = self.min_rate {
            config.analysis.min_rate = min_rate;
        }
        if let Some(max_rate) = self.max_rate {
            config.analysis.max_rate = max_rate;
        }
        if let Some(workers) = self.workers {
            config.processing.workers = workers;
        }
        if let Some(batch_size) = self.batch_size {
            config.processing.batch_size = batch_size;
        }
        config.analysis.non_std_only |= self.non_std_only;
        config.validate()?;

        let options = AnalysisOptions {
            format: self.chainstate.format(&config)?,
            range: config.fee_rate_range()?,
            classifier: config.classifier_settings()?,
            non_std_only: config.analysis.non_std_only,
            strict: self.chainstate.strict(&config),
            workers: config.processing.workers,
            batch_size: config.processing.batch_size,
            progress_interval_ms: config.processing.progress_interval_ms,
            show_progress: self.progress,
        };

        let estimation = self.classifier.estimation(&config);
        let mut source = self.chainstate.open(&config)?;
        let analysis = run_dust_analysis(&mut source, &options, estimation.as_ref())?;

        let report = DustReport::new(&analysis, &options);
        let output = ReportFormatter::format_dust_report(&report, &OutputFormat::parse(&self.format))?;

        match &self.output {
            Some(path) => write_output_to_file(path, &output, "Dust report")?,
            None => print!("{}", output),
        }
        Ok(())
    }
}
