//! Share-of-total helpers for report rows

/// `part` as a percentage of `total`; an empty total yields 0
///
/// Totals past 2^53 lose precision in the division, which is below what
/// the reports display.
///
/// ```
/// use utxo_dust_analyser::utils::math::percentage;
///
/// assert_eq!(percentage(3, 12), 25.0);
/// assert_eq!(percentage(7, 0), 0.0);
/// ```
#[inline]
pub fn percentage(part: u64, total: u64) -> f64 {
    match total {
        0 => 0.0,
        total => part as f64 * 100.0 / total as f64,
    }
}
