//! Size of the input that will eventually spend an output
//!
//! An input is a fixed 40 bytes (previous txid 32, vout 4, nSequence 4) plus
//! a scriptSig and its length prefix. The scriptSig depends on the output
//! template:
//!
//! | Output | Minimum scriptSig | Estimated scriptSig |
//! |--------|-------------------|---------------------|
//! | P2PKH | 138 (uncompressed key era) / 106 | 74 + average key size at height |
//! | P2SH | 1 when counted, skipped otherwise | average P2SH script size |
//! | P2PK | 72 | 73 |
//! | bare multisig (m-of-n) | 1 + 72m | 1 + 73m |
//! | P2WPKH | 27 (witness discount) | 27 |
//! | P2WSH | 0 | average witness size / 4 |
//! | other | 0 | average non-standard size |
//!
//! Minimum sizes assume 71 byte signatures, estimated sizes 72 byte ones.

use super::estimation::EstimationProfile;
use super::script_patterns::{native_segwit, required_sigs, SegwitProgram};
use crate::chainstate::OutputType;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::warn;

/// Previous txid (32) + previous vout (4) + nSequence (4)
pub const FIXED_INPUT_SIZE: u64 = 40;

/// Chain-specific parameters for the minimum estimate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CoinProfile {
    Bitcoin,
    BitcoinCash,
    Litecoin,
    /// Any other chain, with the height compressed keys became the norm
    Custom { compressed_pk_height: u32 },
}

impl CoinProfile {
    /// Resolve a coin name from configuration
    ///
    /// Unknown names become [`CoinProfile::Custom`] with the given height.
    pub fn from_name(name: &str, compressed_pk_height: u32) -> Self {
        match name.to_lowercase().as_str() {
            "bitcoin" | "btc" => CoinProfile::Bitcoin,
            "bitcoincash" | "bch" => CoinProfile::BitcoinCash,
            "litecoin" | "ltc" => CoinProfile::Litecoin,
            other => {
                if compressed_pk_height == 0 {
                    warn!(
                        "Coin '{}' has no known compressed public key height and none was configured; \
                         every P2PKH output will be sized with a compressed key",
                        other
                    );
                }
                CoinProfile::Custom {
                    compressed_pk_height,
                }
            }
        }
    }

    /// First height at which P2PKH spends are assumed to use compressed keys
    pub fn compressed_pk_height(&self) -> u32 {
        match self {
            // Bitcoin Core 0.6.0 (March 2012)
            CoinProfile::Bitcoin | CoinProfile::BitcoinCash => 173_480,
            // Litecoin 0.6.0
            CoinProfile::Litecoin => 110_000,
            CoinProfile::Custom {
                compressed_pk_height,
            } => *compressed_pk_height,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            CoinProfile::Bitcoin => "bitcoin",
            CoinProfile::BitcoinCash => "bitcoincash",
            CoinProfile::Litecoin => "litecoin",
            CoinProfile::Custom { .. } => "custom",
        }
    }
}

impl fmt::Display for CoinProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Size of a spending input
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum InputSize {
    Bytes(f64),
    /// Deliberately excluded from classification (uncounted P2SH)
    Skip,
    /// No data to estimate from
    Unknown,
}

impl InputSize {
    pub fn bytes(&self) -> Option<f64> {
        match self {
            InputSize::Bytes(size) => Some(*size),
            InputSize::Skip | InputSize::Unknown => None,
        }
    }
}

/// Bytes needed to encode the length of a scriptSig, as the analysis counts them
fn length_prefix(script_sig: f64) -> f64 {
    (script_sig / 256.0).ceil()
}

fn with_fixed(script_sig: f64, prefix: f64) -> InputSize {
    InputSize::Bytes(FIXED_INPUT_SIZE as f64 + prefix + script_sig)
}

/// Smallest input that could spend this output
pub fn min_input_size(
    out_type: OutputType,
    payload: &[u8],
    height: u32,
    count_p2sh: bool,
    coin: CoinProfile,
) -> InputSize {
    match out_type {
        OutputType::P2pkh => {
            // PUSH sig (1) + sig (71) + PUSH pk (1) + pk (65 or 33)
            let script_sig = if height < coin.compressed_pk_height() {
                138.0
            } else {
                106.0
            };
            with_fixed(script_sig, 1.0)
        }
        OutputType::P2sh => {
            if count_p2sh {
                // Smallest redeem script is a single opcode
                with_fixed(1.0, 1.0)
            } else {
                InputSize::Skip
            }
        }
        OutputType::P2pkCompressedEven
        | OutputType::P2pkCompressedOdd
        | OutputType::P2pkUncompressedEven
        | OutputType::P2pkUncompressedOdd => with_fixed(72.0, 1.0),
        OutputType::Other(_) => {
            if let Some(m) = required_sigs(payload) {
                // OP_0 + m * (PUSH sig + sig)
                let script_sig = 1.0 + f64::from(m) * 72.0;
                with_fixed(script_sig, length_prefix(script_sig))
            } else if native_segwit(payload) == Some(SegwitProgram::P2wpkh) {
                // 106 bytes of witness at a quarter of the weight
                with_fixed(27.0, 1.0)
            } else {
                with_fixed(0.0, 1.0)
            }
        }
    }
}

/// Expected input size from on-chain averages
///
/// Returns [`InputSize::Unknown`] without a profile.
pub fn estimated_input_size(
    out_type: OutputType,
    payload: &[u8],
    height: u32,
    profile: Option<&EstimationProfile>,
) -> InputSize {
    let Some(profile) = profile else {
        return InputSize::Unknown;
    };

    match out_type {
        OutputType::P2pkh => {
            // PUSH sig (1) + sig (72) + PUSH pk (1) + pk
            with_fixed(74.0 + profile.p2pkh_pubkey_size(height), 1.0)
        }
        OutputType::P2sh => {
            let script_sig = profile.p2sh_script_size();
            with_fixed(script_sig, length_prefix(script_sig))
        }
        OutputType::P2pkCompressedEven
        | OutputType::P2pkCompressedOdd
        | OutputType::P2pkUncompressedEven
        | OutputType::P2pkUncompressedOdd => with_fixed(73.0, 1.0),
        OutputType::Other(_) => {
            if let Some(m) = required_sigs(payload) {
                let script_sig = 1.0 + f64::from(m) * 73.0;
                with_fixed(script_sig, length_prefix(script_sig))
            } else {
                match native_segwit(payload) {
                    Some(SegwitProgram::P2wpkh) => with_fixed(27.0, 1.0),
                    Some(SegwitProgram::P2wsh) => {
                        let script_sig = (profile.p2wsh_script_size() / 4.0).ceil();
                        with_fixed(script_sig, length_prefix(script_sig))
                    }
                    None => {
                        let script_sig = profile.nonstd_script_size();
                        with_fixed(script_sig, length_prefix(script_sig))
                    }
                }
            }
        }
    }
}
