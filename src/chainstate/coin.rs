//! Compressed coin (txout) records
//!
//! A coin value is three varints followed by a script payload:
//!
//! ```text
//! varint(height * 2 + coinbase) | varint(compress(amount)) | varint(out_type) | payload
//! ```
//!
//! The legacy per-transaction format carries height and coinbase at the
//! record level, so the txout half (amount, out_type, payload) is exposed on
//! its own as [`CompressedTxOut`].

use super::amount;
use super::error::{CodecError, CodecResult};
use super::varint;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Number of special script templates before raw scripts start
pub const NSPECIALSCRIPTS: u64 = 6;

/// Script template tag stored ahead of the script payload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OutputType {
    P2pkh,
    P2sh,
    P2pkCompressedEven,
    P2pkCompressedOdd,
    P2pkUncompressedEven,
    P2pkUncompressedOdd,
    /// Raw script of the given length (on-disk tag `length + 6`)
    Other(usize),
}

impl OutputType {
    pub fn from_code(code: u64) -> CodecResult<Self> {
        Ok(match code {
            0 => Self::P2pkh,
            1 => Self::P2sh,
            2 => Self::P2pkCompressedEven,
            3 => Self::P2pkCompressedOdd,
            4 => Self::P2pkUncompressedEven,
            5 => Self::P2pkUncompressedOdd,
            _ => {
                let len = usize::try_from(code - NSPECIALSCRIPTS).map_err(|_| {
                    CodecError::LengthInvariantViolated(format!(
                        "raw script length {} does not fit in memory",
                        code - NSPECIALSCRIPTS
                    ))
                })?;
                Self::Other(len)
            }
        })
    }

    /// On-disk tag
    pub fn code(&self) -> u64 {
        match self {
            Self::P2pkh => 0,
            Self::P2sh => 1,
            Self::P2pkCompressedEven => 2,
            Self::P2pkCompressedOdd => 3,
            Self::P2pkUncompressedEven => 4,
            Self::P2pkUncompressedOdd => 5,
            Self::Other(len) => *len as u64 + NSPECIALSCRIPTS,
        }
    }

    /// Length of the payload that follows the tag
    pub fn payload_len(&self) -> usize {
        match self {
            Self::P2pkh | Self::P2sh => 20,
            Self::P2pkCompressedEven
            | Self::P2pkCompressedOdd
            | Self::P2pkUncompressedEven
            | Self::P2pkUncompressedOdd => 32,
            Self::Other(len) => *len,
        }
    }

    /// One of the six special templates
    pub fn is_standard(&self) -> bool {
        !matches!(self, Self::Other(_))
    }

    pub fn is_p2pk(&self) -> bool {
        matches!(
            self,
            Self::P2pkCompressedEven
                | Self::P2pkCompressedOdd
                | Self::P2pkUncompressedEven
                | Self::P2pkUncompressedOdd
        )
    }
}

impl fmt::Display for OutputType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::P2pkh => write!(f, "P2PKH"),
            Self::P2sh => write!(f, "P2SH"),
            Self::P2pkCompressedEven | Self::P2pkCompressedOdd => write!(f, "P2PK (compressed)"),
            Self::P2pkUncompressedEven | Self::P2pkUncompressedOdd => {
                write!(f, "P2PK (uncompressed)")
            }
            Self::Other(len) => write!(f, "raw script ({} bytes)", len),
        }
    }
}

/// Amount, template and payload of one output
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompressedTxOut {
    pub amount: u64,
    pub out_type: OutputType,
    pub script_payload: Vec<u8>,
}

impl CompressedTxOut {
    /// Payload length as the compressor stores it: the tag byte counts for
    /// the four P2PK templates, where it doubles as the key prefix
    pub fn compressed_script_len(&self) -> usize {
        if self.out_type.is_p2pk() {
            self.script_payload.len() + 1
        } else {
            self.script_payload.len()
        }
    }
}

/// A decoded coin
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoinRecord {
    pub height: u32,
    pub is_coinbase: bool,
    pub txout: CompressedTxOut,
}

impl CoinRecord {
    pub fn new(
        height: u32,
        is_coinbase: bool,
        amount: u64,
        out_type: OutputType,
        script_payload: Vec<u8>,
    ) -> CodecResult<Self> {
        let record = Self {
            height,
            is_coinbase,
            txout: CompressedTxOut {
                amount,
                out_type,
                script_payload,
            },
        };
        record.validate()?;
        Ok(record)
    }

    pub fn amount(&self) -> u64 {
        self.txout.amount
    }

    pub fn out_type(&self) -> OutputType {
        self.txout.out_type
    }

    pub fn script_payload(&self) -> &[u8] {
        &self.txout.script_payload
    }

    /// Check that the payload length matches the output type
    pub fn validate(&self) -> CodecResult<()> {
        let expected = self.txout.out_type.payload_len();
        let actual = self.txout.script_payload.len();
        if expected != actual {
            return Err(CodecError::LengthInvariantViolated(format!(
                "output type {} carries {} payload bytes, expected {}",
                self.txout.out_type.code(),
                actual,
                expected
            )));
        }
        Ok(())
    }
}

/// Split a coin's first varint into `(height, is_coinbase)`
pub fn split_code(code: u64) -> CodecResult<(u32, bool)> {
    let height = u32::try_from(code >> 1).map_err(|_| CodecError::HeightOutOfRange(code >> 1))?;
    Ok((height, code & 1 == 1))
}

/// Decode the amount, template and payload starting at `offset`
pub fn decode_txout(data: &[u8], offset: usize) -> CodecResult<(CompressedTxOut, usize)> {
    let mut pos = offset;

    let compressed_amount = varint::read(data, &mut pos)?;
    let amount = amount::decompress(u128::from(compressed_amount))?;

    let out_type = OutputType::from_code(varint::read(data, &mut pos)?)?;
    let needed = out_type.payload_len();
    let available = data.len().saturating_sub(pos);
    if needed > available {
        return Err(CodecError::UnexpectedEndOfBuffer {
            offset: pos,
            needed,
            available,
        });
    }

    let script_payload = data[pos..pos + needed].to_vec();
    pos += needed;

    Ok((
        CompressedTxOut {
            amount,
            out_type,
            script_payload,
        },
        pos,
    ))
}

/// Decode a full coin starting at `offset`
///
/// Returns the coin and the offset just past it.
pub fn decode_coin(data: &[u8], offset: usize) -> CodecResult<(CoinRecord, usize)> {
    let mut pos = offset;
    let (height, is_coinbase) = split_code(varint::read(data, &mut pos)?)?;
    let (txout, pos) = decode_txout(data, pos)?;

    Ok((
        CoinRecord {
            height,
            is_coinbase,
            txout,
        },
        pos,
    ))
}

pub fn encode_txout(txout: &CompressedTxOut) -> CodecResult<Vec<u8>> {
    let mut out = varint::encode(amount::compress_to_u64(txout.amount)?);
    out.extend(varint::encode(txout.out_type.code()));
    out.extend_from_slice(&txout.script_payload);
    Ok(out)
}

pub fn encode_coin(coin: &CoinRecord) -> CodecResult<Vec<u8>> {
    coin.validate()?;
    let code = (u64::from(coin.height) << 1) | u64::from(coin.is_coinbase);
    let mut out = varint::encode(code);
    out.extend(encode_txout(&coin.txout)?);
    Ok(out)
}
