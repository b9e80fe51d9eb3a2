//! MSB base-128 variable length integers
//!
//! This is the `VARINT` serialisation used throughout the chainstate database,
//! not the CompactSize prefix used in transactions. Every byte except the last
//! carries the continuation bit (0x80), groups are written most significant
//! first, and every group but the last is stored decremented by one so that
//! each value has exactly one encoding.

use super::error::{CodecError, CodecResult};

/// Encode `n` as a chainstate varint
pub fn encode(mut n: u64) -> Vec<u8> {
    let mut groups = Vec::with_capacity(10);
    loop {
        let mut byte = (n & 0x7f) as u8;
        if !groups.is_empty() {
            byte |= 0x80;
        }
        groups.push(byte);
        if n <= 0x7f {
            break;
        }
        n = (n >> 7) - 1;
    }
    groups.reverse();
    groups
}

/// Decode a varint starting at `offset`
///
/// Returns the value and the number of bytes consumed.
pub fn decode(data: &[u8], offset: usize) -> CodecResult<(u64, usize)> {
    let mut n: u64 = 0;
    let mut pos = offset;
    loop {
        let byte = *data
            .get(pos)
            .ok_or(CodecError::TruncatedInput { offset })?;
        pos += 1;

        if n > (u64::MAX >> 7) {
            return Err(CodecError::VarIntOverflow { offset });
        }
        n = (n << 7) | u64::from(byte & 0x7f);

        if byte & 0x80 == 0 {
            return Ok((n, pos - offset));
        }
        n = n
            .checked_add(1)
            .ok_or(CodecError::VarIntOverflow { offset })?;
    }
}

/// Decode a varint at `*offset` and advance the offset past it
pub fn read(data: &[u8], offset: &mut usize) -> CodecResult<u64> {
    let (value, consumed) = decode(data, *offset)?;
    *offset += consumed;
    Ok(value)
}
