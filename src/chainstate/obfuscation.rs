//! Chainstate value obfuscation
//!
//! Bitcoin Core XORs every chainstate value with a per-database key so that
//! on-disk bytes do not trip anti-virus signatures. The key lives in the same
//! database under [`OBFUSCATION_KEY_KEY`].

use super::error::{CodecError, CodecResult};
use serde::{Deserialize, Serialize};

/// Database key of the obfuscation key record: `0x0e 0x00 "obfuscate_key"`
pub const OBFUSCATION_KEY_KEY: &[u8] = b"\x0e\x00obfuscate_key";

/// XOR mask applied to chainstate values
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObfuscationKey(Vec<u8>);

impl ObfuscationKey {
    pub fn new(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    /// Key that leaves values untouched (databases created before 0.12)
    pub fn none() -> Self {
        Self(Vec::new())
    }

    /// Parse the stored key record
    ///
    /// The stored value is a length-prefixed byte vector. The leading length
    /// byte is stripped and must agree with the bytes that follow.
    pub fn from_stored_value(raw: &[u8]) -> CodecResult<Self> {
        let (&declared, key) = raw
            .split_first()
            .ok_or_else(|| CodecError::InvalidObfuscationKey("empty record".to_string()))?;

        if usize::from(declared) != key.len() {
            return Err(CodecError::InvalidObfuscationKey(format!(
                "declared length {} but {} key bytes follow",
                declared,
                key.len()
            )));
        }

        Ok(Self(key.to_vec()))
    }

    pub fn from_hex(hex_key: &str) -> CodecResult<Self> {
        hex::decode(hex_key)
            .map(Self)
            .map_err(|e| CodecError::InvalidObfuscationKey(e.to_string()))
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn to_hex(&self) -> String {
        hex::encode(&self.0)
    }

    /// Remove (or apply) the mask
    pub fn deobfuscate(&self, value: &[u8]) -> Vec<u8> {
        deobfuscate(&self.0, value)
    }
}

/// XOR `value` with `key` repeated to the value's length
///
/// An empty key is the identity. A key longer than the value is truncated.
/// Applying the same key twice restores the input.
pub fn deobfuscate(key: &[u8], value: &[u8]) -> Vec<u8> {
    if key.is_empty() {
        return value.to_vec();
    }
    value
        .iter()
        .zip(key.iter().cycle())
        .map(|(v, k)| v ^ k)
        .collect()
}
