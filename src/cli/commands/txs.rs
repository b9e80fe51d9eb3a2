use super::output::{resolve_output_path, DumpFormat, RecordWriter};
use super::{load_config, ChainstateArgs};
use crate::analysis::transactions::stream_transactions;
use crate::errors::{AppError, AppResult};
use crate::types::statistics::StatisticsCollector;
use clap::Args;
use std::path::PathBuf;
use tracing::info;

/// Aggregate unspent outputs per transaction
#[derive(Args)]
pub struct TxsCommand {
    #[command(flatten)]
    chainstate: ChainstateArgs,

    /// Output file ("-" for stdout, default: <output_dir>/transactions.<ext>)
    #[arg(long, short = 'o')]
    output: Option<PathBuf>,

    /// Dump encoding: jsonl or csv
    #[arg(long, default_value = "jsonl")]
    output_format: String,
}

impl TxsCommand {
    pub fn run(&self) -> AppResult<()> {
        info!("=== UTXO Dust Analyser - Transactions ===");

        let config = load_config()?;
        let format = self.chainstate.format(&config)?;
        let dump_format: DumpFormat = self.output_format.parse().map_err(AppError::Config)?;
        let output_path = resolve_output_path(
            self.output.as_ref(),
            &config.paths.output_dir,
            "transactions",
            dump_format,
        );

        let mut source = self.chainstate.open(&config)?;
        let mut writer = RecordWriter::create(output_path.as_deref(), dump_format)?;
        let stats = stream_transactions(
            &mut source,
            format,
            self.chainstate.strict(&config),
            |summary| writer.write(&summary),
        )?;
        let written = writer.finish()?;

        if let Some(path) = output_path {
            eprintln!("{} transactions written to: {}", written, path.display());
        }
        eprintln!("{}", stats.summary());
        Ok(())
    }
}
