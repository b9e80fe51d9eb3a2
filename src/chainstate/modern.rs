//! Modern (0.15+) per-output records

use super::coin::decode_coin;
use super::error::{CodecError, CodecResult};
use super::outpoint::decode_modern_key;
use super::UtxoRecord;

/// Decode one `'C'` entry whose value has already been deobfuscated
pub fn decode_modern(key: &[u8], value: &[u8]) -> CodecResult<UtxoRecord> {
    let outpoint = decode_modern_key(key)?;
    let (coin, end) = decode_coin(value, 0)?;

    if end != value.len() {
        return Err(CodecError::LengthInvariantViolated(format!(
            "{} unread bytes after coin {}",
            value.len() - end,
            outpoint
        )));
    }

    Ok(UtxoRecord {
        outpoint,
        coin,
        serialized_length: key.len() + value.len(),
    })
}
