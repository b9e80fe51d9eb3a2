//! Legacy (pre 0.15) per-transaction records
//!
//! One value holds every unspent output of a transaction:
//!
//! ```text
//! varint(version) | varint(code) | unspentness bitvector | txout* | varint(height)
//! ```
//!
//! Bits of `code`:
//! - bit 0: coinbase
//! - bit 1: vout[0] unspent
//! - bit 2: vout[1] unspent
//! - bits 3..: number of non-zero bitvector bytes `N`, stored as `N - 1` when
//!   neither vout[0] nor vout[1] is unspent
//!
//! Bit `p` of bitvector byte `k` marks vout[2 + 8k + p] unspent. Zero bytes
//! may appear in the bitvector and do not count towards `N`.

use super::coin::{decode_txout, CoinRecord, CompressedTxOut};
use super::error::{CodecError, CodecResult};
use super::outpoint::{decode_legacy_key, Outpoint, TxId};
use super::varint;
use super::UtxoRecord;
use serde::{Deserialize, Serialize};

/// All unspent outputs of one legacy transaction record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LegacyEntry {
    pub tx_id: TxId,
    pub version: u64,
    pub height: u32,
    pub is_coinbase: bool,
    /// `(vout, txout)` in ascending vout order
    pub outputs: Vec<(u32, CompressedTxOut)>,
    /// Key plus value length on disk
    pub serialized_length: usize,
}

impl LegacyEntry {
    /// Flatten into per-output records sharing the transaction's metadata
    pub fn into_records(self) -> Vec<UtxoRecord> {
        let Self {
            tx_id,
            height,
            is_coinbase,
            outputs,
            serialized_length,
            ..
        } = self;

        outputs
            .into_iter()
            .map(|(index, txout)| UtxoRecord {
                outpoint: Outpoint { tx_id, index },
                coin: CoinRecord {
                    height,
                    is_coinbase,
                    txout,
                },
                serialized_length,
            })
            .collect()
    }

    pub fn total_value(&self) -> u64 {
        self.outputs
            .iter()
            .map(|(_, txout)| txout.amount)
            .fold(0u64, u64::saturating_add)
    }
}

/// Decode one `'c'` entry whose value has already been deobfuscated
pub fn decode_legacy(key: &[u8], value: &[u8]) -> CodecResult<LegacyEntry> {
    let tx_id = decode_legacy_key(key)?;
    let mut offset = 0;

    let version = varint::read(value, &mut offset)?;
    let code = varint::read(value, &mut offset)?;

    let is_coinbase = code & 0x01 != 0;
    let vout0 = code & 0x02 != 0;
    let vout1 = code & 0x04 != 0;

    let mut indices = Vec::new();
    if vout0 {
        indices.push(0u32);
    }
    if vout1 {
        indices.push(1u32);
    }

    let mut non_zero_bytes = (code >> 3) + u64::from(!vout0 && !vout1);
    let mut byte_index = 0u64;
    while non_zero_bytes > 0 {
        let byte = *value.get(offset).ok_or(CodecError::PrematureEnd {
            field: "unspentness bitvector",
        })?;
        offset += 1;

        for bit in 0..8u64 {
            if byte & (1 << bit) != 0 {
                let index = 2 + byte_index * 8 + bit;
                indices.push(u32::try_from(index).map_err(|_| {
                    CodecError::LengthInvariantViolated(format!("output index {} out of range", index))
                })?);
            }
        }
        if byte != 0 {
            non_zero_bytes -= 1;
        }
        byte_index += 1;
    }

    let mut outputs = Vec::with_capacity(indices.len());
    for index in indices {
        let (txout, next) = decode_txout(value, offset)?;
        offset = next;
        outputs.push((index, txout));
    }

    let (raw_height, consumed) = match varint::decode(value, offset) {
        Ok(decoded) => decoded,
        Err(CodecError::TruncatedInput { .. }) => {
            return Err(CodecError::PrematureEnd { field: "height" })
        }
        Err(e) => return Err(e),
    };
    offset += consumed;

    if offset != value.len() {
        return Err(CodecError::TrailingBytesMismatch {
            remaining: value.len() - offset,
        });
    }

    let height =
        u32::try_from(raw_height).map_err(|_| CodecError::HeightOutOfRange(raw_height))?;

    Ok(LegacyEntry {
        tx_id,
        version,
        height,
        is_coinbase,
        outputs,
        serialized_length: key.len() + value.len(),
    })
}
