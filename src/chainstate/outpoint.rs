//! Chainstate keys
//!
//! - Modern (0.15+): `'C' | txid (32, little endian) | varint(vout)`, one key per output
//! - Legacy (pre 0.15): `'c' | txid (32, little endian)`, one key per transaction

use super::error::{CodecError, CodecResult};
use super::varint;
use serde::{Deserialize, Serialize};
use std::fmt;

pub const MODERN_PREFIX: u8 = b'C';
pub const LEGACY_PREFIX: u8 = b'c';

const TXID_LEN: usize = 32;
/// Prefix byte, txid and at least one varint byte
const MODERN_MIN_KEY_LEN: usize = 1 + TXID_LEN + 1;

/// Transaction id in storage byte order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TxId(pub [u8; 32]);

impl TxId {
    pub fn from_slice(bytes: &[u8]) -> CodecResult<Self> {
        let array: [u8; 32] = bytes.try_into().map_err(|_| {
            CodecError::MalformedOutpoint(format!("txid must be 32 bytes, got {}", bytes.len()))
        })?;
        Ok(Self(array))
    }

    /// Parse the conventional (byte-reversed) hex form
    pub fn from_display_hex(hex_txid: &str) -> CodecResult<Self> {
        let mut bytes = hex::decode(hex_txid)
            .map_err(|e| CodecError::MalformedOutpoint(format!("invalid txid hex: {}", e)))?;
        bytes.reverse();
        Self::from_slice(&bytes)
    }
}

/// Displays in the conventional big-endian hex form used by explorers and RPC
impl fmt::Display for TxId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut reversed = self.0;
        reversed.reverse();
        write!(f, "{}", hex::encode(reversed))
    }
}

/// A transaction output reference
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Outpoint {
    pub tx_id: TxId,
    pub index: u32,
}

impl fmt::Display for Outpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.tx_id, self.index)
    }
}

/// Decode a Modern per-output key
pub fn decode_modern_key(key: &[u8]) -> CodecResult<Outpoint> {
    if key.len() < MODERN_MIN_KEY_LEN {
        return Err(CodecError::MalformedOutpoint(format!(
            "key is {} bytes, expected at least {}",
            key.len(),
            MODERN_MIN_KEY_LEN
        )));
    }
    if key[0] != MODERN_PREFIX {
        return Err(CodecError::MalformedOutpoint(format!(
            "unexpected prefix 0x{:02x}",
            key[0]
        )));
    }

    let tx_id = TxId::from_slice(&key[1..1 + TXID_LEN])?;
    let (raw_index, consumed) = varint::decode(key, 1 + TXID_LEN)
        .map_err(|e| CodecError::MalformedOutpoint(format!("bad output index: {}", e)))?;

    if 1 + TXID_LEN + consumed != key.len() {
        return Err(CodecError::MalformedOutpoint(format!(
            "{} unexpected bytes after the output index",
            key.len() - (1 + TXID_LEN + consumed)
        )));
    }

    let index = u32::try_from(raw_index).map_err(|_| {
        CodecError::MalformedOutpoint(format!("output index {} out of range", raw_index))
    })?;

    Ok(Outpoint { tx_id, index })
}

/// Decode a Legacy per-transaction key
pub fn decode_legacy_key(key: &[u8]) -> CodecResult<TxId> {
    match key.split_first() {
        Some((&LEGACY_PREFIX, txid)) => TxId::from_slice(txid),
        Some((prefix, _)) => Err(CodecError::MalformedOutpoint(format!(
            "unexpected prefix 0x{:02x}",
            prefix
        ))),
        None => Err(CodecError::MalformedOutpoint("empty key".to_string())),
    }
}

pub fn encode_modern_key(outpoint: &Outpoint) -> Vec<u8> {
    let mut key = Vec::with_capacity(MODERN_MIN_KEY_LEN + 4);
    key.push(MODERN_PREFIX);
    key.extend_from_slice(&outpoint.tx_id.0);
    key.extend(varint::encode(u64::from(outpoint.index)));
    key
}

pub fn encode_legacy_key(tx_id: &TxId) -> Vec<u8> {
    let mut key = Vec::with_capacity(1 + TXID_LEN);
    key.push(LEGACY_PREFIX);
    key.extend_from_slice(&tx_id.0);
    key
}
