//! Output amount compression
//!
//! Amounts are stored with their trailing decimal zeros folded into an
//! exponent. Round values such as 50 BTC shrink to a single byte varint.
//!
//! ```text
//! n = 0                    ->  0
//! n = d * 10^e, e < 9      ->  1 + (floor(n/10) * 9 + d - 1) * 10 + e   (d = last non-zero digit)
//! n = m * 10^9             ->  1 + (m - 1) * 10 + 9
//! ```
//!
//! The compressed domain is wider than 64 bits for amounts close to
//! `u64::MAX`, so it is carried as `u128`. Everything read from disk fits in
//! a `u64` varint and widens losslessly.

use super::error::{CodecError, CodecResult};

/// Compress a satoshi amount
pub fn compress(satoshis: u64) -> u128 {
    if satoshis == 0 {
        return 0;
    }

    let mut n = u128::from(satoshis);
    let mut exponent = 0u128;
    while n % 10 == 0 && exponent < 9 {
        n /= 10;
        exponent += 1;
    }

    if exponent < 9 {
        let digit = n % 10;
        n /= 10;
        1 + (n * 9 + digit - 1) * 10 + exponent
    } else {
        1 + (n - 1) * 10 + 9
    }
}

/// Reverse [`compress`]
///
/// Fails with `AmountOverflow` when `compressed` is not the image of any
/// `u64` amount.
pub fn decompress(compressed: u128) -> CodecResult<u64> {
    if compressed == 0 {
        return Ok(0);
    }

    let mut x = compressed - 1;
    let exponent = x % 10;
    x /= 10;

    let mut n = if exponent < 9 {
        let digit = x % 9 + 1;
        x /= 9;
        x.checked_mul(10).and_then(|v| v.checked_add(digit))
    } else {
        x.checked_add(1)
    };

    for _ in 0..exponent {
        n = n.and_then(|v| v.checked_mul(10));
    }

    n.and_then(|v| u64::try_from(v).ok()).ok_or_else(|| {
        CodecError::AmountOverflow(format!("compressed amount {} is out of range", compressed))
    })
}

/// Compress an amount into the `u64` range a chainstate varint can carry
pub fn compress_to_u64(satoshis: u64) -> CodecResult<u64> {
    u64::try_from(compress(satoshis)).map_err(|_| {
        CodecError::AmountOverflow(format!("{} has no 64-bit compressed form", satoshis))
    })
}
