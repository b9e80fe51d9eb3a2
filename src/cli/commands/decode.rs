use super::utxo::UtxoDetails;
use super::{load_config, ClassifierArgs};
use crate::analysis::classifier::Classifier;
use crate::analysis::reports::OutputFormat;
use crate::chainstate::{decode_entry, ChainstateFormat, ObfuscationKey, RawEntry};
use crate::errors::{AppError, AppResult};
use clap::Args;

/// Decode a single chainstate key/value pair given as hex, without a database
#[derive(Args)]
pub struct DecodeCommand {
    /// Entry key, hex
    #[arg(long)]
    key: String,

    /// Entry value as stored, hex
    #[arg(long)]
    value: String,

    /// Obfuscation key, hex, without the length byte (empty for none)
    #[arg(long, default_value = "")]
    obfuscation_key: String,

    /// Layout: "modern" or "legacy" (default: taken from the key prefix)
    #[arg(long)]
    chainstate_format: Option<String>,

    #[command(flatten)]
    classifier: ClassifierArgs,

    /// Output format (console or json)
    #[arg(long, default_value = "console")]
    format: String,
}

impl DecodeCommand {
    pub fn run(&self) -> AppResult<()> {
        let mut config = load_config()?;
        self.classifier.apply(&mut config);

        let key = hex::decode(&self.key)
            .map_err(|e| AppError::InvalidData(format!("Invalid key hex: {}", e)))?;
        let value = hex::decode(&self.value)
            .map_err(|e| AppError::InvalidData(format!("Invalid value hex: {}", e)))?;
        let obfuscation = ObfuscationKey::from_hex(&self.obfuscation_key)?;

        let format = match &self.chainstate_format {
            Some(format) => format.parse().map_err(AppError::Config)?,
            None => format_from_key(&key)?,
        };

        let decoded = decode_entry(format, &obfuscation, &RawEntry::new(key, value))?;

        let estimation = self.classifier.estimation(&config);
        let classifier = Classifier::new(config.classifier_settings()?, estimation.as_ref());
        let output_format = OutputFormat::parse(&self.format);
        for record in decoded.into_records() {
            let details = UtxoDetails::new(&record, &classifier.classify(&record));
            print!("{}", details.format(&output_format)?);
            if output_format == OutputFormat::Json {
                println!();
            }
        }
        Ok(())
    }
}

/// Pick the layout named by a key's prefix byte
///
/// A single entry given by hand carries its own prefix, unlike a scan where
/// the layout must be known up front.
fn format_from_key(key: &[u8]) -> AppResult<ChainstateFormat> {
    match key.first() {
        Some(&prefix) if prefix == ChainstateFormat::Modern.prefix() => Ok(ChainstateFormat::Modern),
        Some(&prefix) if prefix == ChainstateFormat::Legacy.prefix() => Ok(ChainstateFormat::Legacy),
        _ => Err(AppError::InvalidData(
            "Key prefix is neither 'C' nor 'c'; pass --chainstate-format".to_string(),
        )),
    }
}
