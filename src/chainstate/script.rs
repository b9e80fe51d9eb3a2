//! Script (de)compression for the six special templates
//!
//! | type | template |
//! |------|----------|
//! | 0 | `OP_DUP OP_HASH160 <20> OP_EQUALVERIFY OP_CHECKSIG` |
//! | 1 | `OP_HASH160 <20> OP_EQUAL` |
//! | 2, 3 | `<33: type \|\| x> OP_CHECKSIG` |
//! | 4, 5 | `<65: 04 \|\| x \|\| y> OP_CHECKSIG`, `y` recovered from `x` and the parity in the type |
//!
//! Anything else is stored verbatim.

use super::coin::OutputType;
use super::error::{CodecError, CodecResult};
use bitcoin::hashes::Hash;
use bitcoin::opcodes::all::{OP_CHECKSIG, OP_PUSHBYTES_33, OP_PUSHBYTES_65};
use bitcoin::{PubkeyHash, PublicKey, Script, ScriptBuf, ScriptHash};

/// Rebuild the full scriptPubKey from a compressed payload
pub fn decompress_script(out_type: OutputType, payload: &[u8]) -> CodecResult<ScriptBuf> {
    let expected = out_type.payload_len();
    if payload.len() != expected {
        return Err(CodecError::BadScriptLength {
            out_type: out_type.code(),
            expected,
            actual: payload.len(),
        });
    }

    match out_type {
        OutputType::P2pkh => {
            let hash = PubkeyHash::from_slice(payload)
                .map_err(|e| CodecError::LengthInvariantViolated(e.to_string()))?;
            Ok(ScriptBuf::new_p2pkh(&hash))
        }
        OutputType::P2sh => {
            let hash = ScriptHash::from_slice(payload)
                .map_err(|e| CodecError::LengthInvariantViolated(e.to_string()))?;
            Ok(ScriptBuf::new_p2sh(&hash))
        }
        OutputType::P2pkCompressedEven | OutputType::P2pkCompressedOdd => {
            let mut script = Vec::with_capacity(35);
            script.push(OP_PUSHBYTES_33.to_u8());
            script.push(out_type.code() as u8);
            script.extend_from_slice(payload);
            script.push(OP_CHECKSIG.to_u8());
            Ok(ScriptBuf::from_bytes(script))
        }
        OutputType::P2pkUncompressedEven | OutputType::P2pkUncompressedOdd => {
            let mut compressed = Vec::with_capacity(33);
            compressed.push(out_type.code() as u8 - 2);
            compressed.extend_from_slice(payload);

            let pubkey = PublicKey::from_slice(&compressed)
                .map_err(|e| CodecError::InvalidPublicKey(e.to_string()))?;

            let mut script = Vec::with_capacity(67);
            script.push(OP_PUSHBYTES_65.to_u8());
            script.extend_from_slice(&pubkey.inner.serialize_uncompressed());
            script.push(OP_CHECKSIG.to_u8());
            Ok(ScriptBuf::from_bytes(script))
        }
        OutputType::Other(_) => Ok(ScriptBuf::from_bytes(payload.to_vec())),
    }
}

/// Compress a scriptPubKey into one of the special templates
///
/// Returns `None` when the script matches none of them (it would be stored
/// as a raw script). Uncompressed keys must be valid curve points.
pub fn compress_script(script: &[u8]) -> Option<(OutputType, Vec<u8>)> {
    let parsed = Script::from_bytes(script);

    if parsed.is_p2pkh() {
        return Some((OutputType::P2pkh, script[3..23].to_vec()));
    }
    if parsed.is_p2sh() {
        return Some((OutputType::P2sh, script[2..22].to_vec()));
    }

    if script.len() == 35
        && script[0] == OP_PUSHBYTES_33.to_u8()
        && script[34] == OP_CHECKSIG.to_u8()
        && (script[1] == 0x02 || script[1] == 0x03)
    {
        let out_type = if script[1] == 0x02 {
            OutputType::P2pkCompressedEven
        } else {
            OutputType::P2pkCompressedOdd
        };
        return Some((out_type, script[2..34].to_vec()));
    }

    if script.len() == 67
        && script[0] == OP_PUSHBYTES_65.to_u8()
        && script[66] == OP_CHECKSIG.to_u8()
        && script[1] == 0x04
        && PublicKey::from_slice(&script[1..66]).is_ok()
    {
        let out_type = if script[65] & 1 == 0 {
            OutputType::P2pkUncompressedEven
        } else {
            OutputType::P2pkUncompressedOdd
        };
        return Some((out_type, script[2..34].to_vec()));
    }

    None
}

/// Compress any scriptPubKey, falling back to a raw script
pub fn compress_any_script(script: &[u8]) -> (OutputType, Vec<u8>) {
    compress_script(script).unwrap_or_else(|| (OutputType::Other(script.len()), script.to_vec()))
}
