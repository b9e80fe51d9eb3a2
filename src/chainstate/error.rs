//! Chainstate codec error types

/// Result type for chainstate codec operations
pub type CodecResult<T> = Result<T, CodecError>;

/// Errors raised while decoding a single chainstate record
///
/// Every variant aborts the record being decoded. Whether the surrounding
/// scan skips the record or stops is decided by the caller.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CodecError {
    #[error("Truncated varint starting at offset {offset}")]
    TruncatedInput { offset: usize },

    #[error("Varint at offset {offset} does not fit in 64 bits")]
    VarIntOverflow { offset: usize },

    #[error("Expected {needed} bytes at offset {offset}, only {available} remain")]
    UnexpectedEndOfBuffer {
        offset: usize,
        needed: usize,
        available: usize,
    },

    #[error("Length invariant violated: {0}")]
    LengthInvariantViolated(String),

    #[error("Malformed outpoint key: {0}")]
    MalformedOutpoint(String),

    #[error("{remaining} trailing bytes after the record height")]
    TrailingBytesMismatch { remaining: usize },

    #[error("Record ended before its {field} could be read")]
    PrematureEnd { field: &'static str },

    #[error("Script payload of {actual} bytes is invalid for output type {out_type} (expected {expected})")]
    BadScriptLength {
        out_type: u64,
        expected: usize,
        actual: usize,
    },

    #[error("Public key is not a point on the curve: {0}")]
    InvalidPublicKey(String),

    #[error("Amount does not fit in 64 bits: {0}")]
    AmountOverflow(String),

    #[error("Height {0} is out of range")]
    HeightOutOfRange(u64),

    #[error("Invalid obfuscation key record: {0}")]
    InvalidObfuscationKey(String),
}
