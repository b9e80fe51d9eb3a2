//! Bitcoin Core chainstate decoding
//!
//! The chainstate LevelDB holds the UTXO set in one of two layouts:
//!
//! - **Legacy** (Bitcoin Core < 0.15): one `'c'` record per transaction with
//!   every unspent output packed behind an unspentness bitvector
//! - **Modern** (Bitcoin Core >= 0.15): one `'C'` record per output
//!
//! Values in both layouts are XOR-obfuscated with a per-database key,
//! amounts are compressed and scripts use six special templates. This module
//! turns raw `(key, value)` pairs into [`UtxoRecord`]s. The layout is always
//! chosen explicitly by the caller, never sniffed from the data.

pub mod amount;
pub mod coin;
pub mod error;
pub mod legacy;
pub mod modern;
pub mod obfuscation;
pub mod outpoint;
pub mod script;
pub mod store;
pub mod varint;

pub use coin::{CoinRecord, CompressedTxOut, OutputType};
pub use error::{CodecError, CodecResult};
pub use legacy::LegacyEntry;
pub use obfuscation::ObfuscationKey;
pub use outpoint::{Outpoint, TxId};
pub use store::{ChainstateSource, LevelDbSource, MemorySource};

use crate::errors::AppResult;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// One raw store record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawEntry {
    pub key: Vec<u8>,
    pub value: Vec<u8>,
}

impl RawEntry {
    pub fn new(key: Vec<u8>, value: Vec<u8>) -> Self {
        Self { key, value }
    }
}

/// On-disk layout of the chainstate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChainstateFormat {
    /// Per-transaction `'c'` records (Bitcoin Core < 0.15)
    Legacy,
    /// Per-output `'C'` records (Bitcoin Core >= 0.15)
    Modern,
}

impl ChainstateFormat {
    /// Key prefix scanned for this layout
    pub fn prefix(&self) -> u8 {
        match self {
            ChainstateFormat::Legacy => outpoint::LEGACY_PREFIX,
            ChainstateFormat::Modern => outpoint::MODERN_PREFIX,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ChainstateFormat::Legacy => "legacy",
            ChainstateFormat::Modern => "modern",
        }
    }
}

impl fmt::Display for ChainstateFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ChainstateFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "legacy" | "0.14" => Ok(ChainstateFormat::Legacy),
            "modern" | "0.15" => Ok(ChainstateFormat::Modern),
            other => Err(format!(
                "Unknown chainstate format '{}' (expected 'legacy' or 'modern')",
                other
            )),
        }
    }
}

/// One decoded unspent output
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UtxoRecord {
    pub outpoint: Outpoint,
    pub coin: CoinRecord,
    /// Key plus value length of the record this output was read from
    pub serialized_length: usize,
}

impl UtxoRecord {
    pub fn amount(&self) -> u64 {
        self.coin.amount()
    }

    pub fn height(&self) -> u32 {
        self.coin.height
    }

    pub fn out_type(&self) -> OutputType {
        self.coin.out_type()
    }

    pub fn script_payload(&self) -> &[u8] {
        self.coin.script_payload()
    }

    /// Length of the compressed script as stored
    pub fn utxo_data_len(&self) -> usize {
        self.coin.txout.compressed_script_len()
    }
}

/// Result of decoding one store record
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodedEntry {
    Modern(UtxoRecord),
    Legacy(LegacyEntry),
}

impl DecodedEntry {
    pub fn into_records(self) -> Vec<UtxoRecord> {
        match self {
            DecodedEntry::Modern(record) => vec![record],
            DecodedEntry::Legacy(entry) => entry.into_records(),
        }
    }
}

/// Deobfuscate and decode one raw record in the given layout
pub fn decode_entry(
    format: ChainstateFormat,
    key: &ObfuscationKey,
    entry: &RawEntry,
) -> CodecResult<DecodedEntry> {
    let value = key.deobfuscate(&entry.value);
    match format {
        ChainstateFormat::Modern => modern::decode_modern(&entry.key, &value).map(DecodedEntry::Modern),
        ChainstateFormat::Legacy => legacy::decode_legacy(&entry.key, &value).map(DecodedEntry::Legacy),
    }
}

/// Find one unspent output by outpoint with a point lookup
///
/// Returns `None` when the transaction or the output is not in the set.
pub fn lookup_utxo<S: ChainstateSource>(
    source: &mut S,
    format: ChainstateFormat,
    outpoint: &Outpoint,
) -> AppResult<Option<UtxoRecord>> {
    let key = match format {
        ChainstateFormat::Modern => outpoint::encode_modern_key(outpoint),
        ChainstateFormat::Legacy => outpoint::encode_legacy_key(&outpoint.tx_id),
    };
    let Some(value) = source.get(&key)? else {
        return Ok(None);
    };

    let obfuscation = source.obfuscation_key()?;
    let decoded = decode_entry(format, &obfuscation, &RawEntry::new(key, value))?;
    Ok(decoded
        .into_records()
        .into_iter()
        .find(|record| record.outpoint == *outpoint))
}
