//! Number and size rendering shared by the report formatters

use crate::errors::AppResult;
use serde::Serialize;

const BYTE_UNITS: [(&str, u64); 3] = [("GB", 1 << 30), ("MB", 1 << 20), ("KB", 1 << 10)];

/// Group digits in threes, e.g. for UTXO counts and satoshi totals
///
/// ```
/// # use utxo_dust_analyser::analysis::reports::utils::format_number;
/// assert_eq!(format_number(546), "546");
/// assert_eq!(format_number(81_523_016), "81,523,016");
/// ```
pub fn format_number(n: u64) -> String {
    let digits = n.to_string();
    let head = digits.len() % 3;

    let mut groups: Vec<&str> = Vec::with_capacity(digits.len() / 3 + 1);
    if head > 0 {
        groups.push(&digits[..head]);
    }
    groups.extend(
        digits.as_bytes()[head..]
            .chunks(3)
            .filter_map(|chunk| std::str::from_utf8(chunk).ok()),
    );
    groups.join(",")
}

/// Largest binary unit that keeps the value at or above one, two decimals
pub fn format_bytes(bytes: u64) -> String {
    BYTE_UNITS
        .iter()
        .find(|(_, size)| bytes >= *size)
        .map(|(unit, size)| format!("{:.2} {}", bytes as f64 / *size as f64, unit))
        .unwrap_or_else(|| format!("{} B", bytes))
}

/// Pretty-printed JSON
pub fn export_json<T: Serialize>(data: &T) -> AppResult<String> {
    Ok(serde_json::to_string_pretty(data)?)
}
