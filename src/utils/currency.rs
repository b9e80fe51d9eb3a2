//! Satoshi amount rendering

const SATS_PER_BTC: u64 = 100_000_000;

/// Exact BTC amount followed by the raw satoshi count
///
/// ```
/// use utxo_dust_analyser::utils::currency::format_sats_as_btc;
///
/// assert_eq!(format_sats_as_btc(5_000_000_000), "50.00000000 BTC (5000000000 sats)");
/// assert_eq!(format_sats_as_btc(546), "0.00000546 BTC (546 sats)");
/// ```
pub fn format_sats_as_btc(sats: u64) -> String {
    format!(
        "{}.{:08} BTC ({} sats)",
        sats / SATS_PER_BTC,
        sats % SATS_PER_BTC,
        sats
    )
}
