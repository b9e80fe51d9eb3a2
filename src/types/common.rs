//! Output records written by the dump commands
//!
//! Both types are flat so they serialize the same way to JSON lines and CSV.

use crate::analysis::classifier::{Classification, Rate};
use crate::analysis::script_patterns::ScriptClass;
use crate::chainstate::{LegacyEntry, UtxoRecord};
use serde::{Deserialize, Serialize};

/// One decoded and classified output
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UtxoDumpRecord {
    pub tx_id: String,
    pub index: u32,
    pub height: u32,
    pub coinbase: bool,
    pub amount: u64, // Satoshis
    /// On-disk script tag (0-5 templates, 6+ raw script of `out_type - 6` bytes)
    pub out_type: u64,
    /// Compressed script payload, hex
    pub data: String,
    pub utxo_data_len: usize,
    /// Key plus value bytes of the store record holding this output
    pub register_len: usize,
    /// `None` when unknown or skipped
    pub dust: Option<u64>,
    pub non_profitable: Option<u64>,
    pub non_profitable_est: Option<u64>,
    /// Set for P2SH outputs excluded from the minimum-size metrics
    pub skipped: bool,
    /// "std", "multisig-m-n", "P2WPKH", "P2WSH" or "nonstd"
    pub non_std_type: String,
}

impl UtxoDumpRecord {
    pub fn new(record: &UtxoRecord, classification: &Classification) -> Self {
        let out_type = record.out_type();
        let payload = record.script_payload();

        Self {
            tx_id: record.outpoint.tx_id.to_string(),
            index: record.outpoint.index,
            height: record.height(),
            coinbase: record.coin.is_coinbase,
            amount: record.amount(),
            out_type: out_type.code(),
            data: hex::encode(payload),
            utxo_data_len: record.utxo_data_len(),
            register_len: record.serialized_length,
            dust: classification.dust.value(),
            non_profitable: classification.non_profitable.value(),
            non_profitable_est: classification.non_profitable_est.value(),
            skipped: classification.dust == Rate::Skipped,
            non_std_type: ScriptClass::classify(out_type, payload).to_string(),
        }
    }
}

/// Outputs of one transaction still unspent
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionSummary {
    pub tx_id: String,
    pub num_utxos: usize,
    pub total_value: u64,
    /// Sum of the store record sizes
    pub total_len: usize,
    pub height: u32,
    pub coinbase: bool,
    /// Only legacy records keep the transaction version
    pub version: Option<u64>,
}

impl TransactionSummary {
    /// Start a summary from the first output of a transaction
    pub fn from_record(record: &UtxoRecord) -> Self {
        Self {
            tx_id: record.outpoint.tx_id.to_string(),
            num_utxos: 1,
            total_value: record.amount(),
            total_len: record.serialized_length,
            height: record.height(),
            coinbase: record.coin.is_coinbase,
            version: None,
        }
    }

    /// Add another output of the same transaction
    pub fn add_record(&mut self, record: &UtxoRecord) {
        self.num_utxos += 1;
        self.total_value = self.total_value.saturating_add(record.amount());
        self.total_len += record.serialized_length;
    }

    pub fn from_legacy(entry: &LegacyEntry) -> Self {
        Self {
            tx_id: entry.tx_id.to_string(),
            num_utxos: entry.outputs.len(),
            total_value: entry.total_value(),
            total_len: entry.serialized_length,
            height: entry.height,
            coinbase: entry.is_coinbase,
            version: Some(entry.version),
        }
    }
}
