use super::{load_config, ChainstateArgs, ClassifierArgs};
use crate::analysis::classifier::{Classification, Classifier};
use crate::analysis::reports::{OutputFormat, ReportFormatter};
use crate::chainstate::script::decompress_script;
use crate::chainstate::{lookup_utxo, Outpoint, TxId, UtxoRecord};
use crate::errors::{AppError, AppResult};
use crate::types::UtxoDumpRecord;
use crate::utils::currency::format_sats_as_btc;
use clap::Args;
use serde::Serialize;
use tracing::info;

/// Everything known about one output, for display
#[derive(Debug, Clone, Serialize)]
pub struct UtxoDetails {
    pub outpoint: String,
    #[serde(flatten)]
    pub record: UtxoDumpRecord,
    /// Uncompressed scriptPubKey
    pub script_hex: Option<String>,
    pub script_asm: Option<String>,
    /// Why the scriptPubKey could not be rebuilt
    #[serde(skip_serializing_if = "Option::is_none")]
    pub script_error: Option<String>,
    pub min_input_size: Option<f64>,
    pub est_input_size: Option<f64>,
}

impl UtxoDetails {
    pub fn new(record: &UtxoRecord, classification: &Classification) -> Self {
        let (script_hex, script_asm, script_error) =
            match decompress_script(record.out_type(), record.script_payload()) {
                Ok(script) => (
                    Some(hex::encode(script.as_bytes())),
                    Some(script.to_asm_string()),
                    None,
                ),
                Err(e) => (None, None, Some(e.to_string())),
            };
        Self {
            outpoint: record.outpoint.to_string(),
            record: UtxoDumpRecord::new(record, classification),
            script_hex,
            script_asm,
            script_error,
            min_input_size: classification.min_input_size.bytes(),
            est_input_size: classification.est_input_size.bytes(),
        }
    }

    pub fn format(&self, format: &OutputFormat) -> AppResult<String> {
        match format {
            OutputFormat::Json => ReportFormatter::export_json(self),
            OutputFormat::Console => Ok(self.format_console()),
        }
    }

    fn format_console(&self) -> String {
        let r = &self.record;
        let rate = |rate: Option<u64>| match rate {
            Some(rate) => format!("{} sat/byte", rate),
            None if r.skipped => "skipped".to_string(),
            None => "unknown".to_string(),
        };
        let size = |size: Option<f64>| match size {
            Some(bytes) => format!("{} bytes", bytes),
            None => "-".to_string(),
        };

        let mut output = format!("\nUTXO {}\n", self.outpoint);
        output.push_str(&format!("  Height:          {}{}\n", r.height, if r.coinbase { " (coinbase)" } else { "" }));
        output.push_str(&format!("  Amount:          {}\n", format_sats_as_btc(r.amount)));
        output.push_str(&format!("  Output type:     {} ({})\n", r.out_type, r.non_std_type));
        output.push_str(&format!("  Compressed data: {} ({} bytes)\n", r.data, r.utxo_data_len));
        match (&self.script_hex, &self.script_error) {
            (Some(script), _) => output.push_str(&format!("  scriptPubKey:    {}\n", script)),
            (None, Some(e)) => output.push_str(&format!("  scriptPubKey:    <{}>\n", e)),
            (None, None) => {}
        }
        if let Some(asm) = &self.script_asm {
            output.push_str(&format!("  Script asm:      {}\n", asm));
        }
        output.push_str(&format!("  Record size:     {} bytes\n", r.register_len));
        output.push_str(&format!("  Min input size:  {}\n", size(self.min_input_size)));
        output.push_str(&format!("  Est input size:  {}\n", size(self.est_input_size)));
        output.push_str(&format!("  Dust from:       {}\n", rate(r.dust)));
        output.push_str(&format!("  Non-profitable:  {}\n", rate(r.non_profitable)));
        output.push_str(&format!("  Non-profitable (est.): {}\n", rate(r.non_profitable_est)));
        output
    }
}

/// Look up and display one unspent output
#[derive(Args)]
pub struct UtxoCommand {
    /// Transaction id (big-endian hex, as shown by explorers)
    txid: String,

    /// Output index
    vout: u32,

    #[command(flatten)]
    chainstate: ChainstateArgs,

    #[command(flatten)]
    classifier: ClassifierArgs,

    /// Output format (console or json)
    #[arg(long, default_value = "console")]
    format: String,
}

impl UtxoCommand {
    pub fn run(&self) -> AppResult<()> {
        let mut config = load_config()?;
        self.classifier.apply(&mut config);

        let outpoint = Outpoint {
            tx_id: TxId::from_display_hex(&self.txid)?,
            index: self.vout,
        };
        info!("Looking up {}", outpoint);

        let format = self.chainstate.format(&config)?;
        let mut source = self.chainstate.open(&config)?;
        let record = lookup_utxo(&mut source, format, &outpoint)?.ok_or_else(|| {
            AppError::InvalidData(format!("{} is not in the UTXO set", outpoint))
        })?;

        let estimation = self.classifier.estimation(&config);
        let classifier = Classifier::new(config.classifier_settings()?, estimation.as_ref());
        let details = UtxoDetails::new(&record, &classifier.classify(&record));
        print!("{}", details.format(&OutputFormat::parse(&self.format))?);
        Ok(())
    }
}
