//! Fee-rate classification of unspent outputs
//!
//! Every output gets three threshold fee rates (sat/byte), each rounded up to
//! the histogram step:
//!
//! - **dust**: the rate at which relay policy considers the output dust
//! - **non-profitable**: the rate at which spending it with the smallest
//!   possible input costs more than it is worth (`amount / min_input_size`)
//! - **non-profitable (estimated)**: the same with an input size estimated
//!   from on-chain averages
//!
//! An output is dust (or non-profitable) at every fee rate greater than or
//! equal to its threshold.

use super::estimation::EstimationProfile;
use super::input_size::{estimated_input_size, min_input_size, CoinProfile, InputSize};
use crate::chainstate::script::decompress_script;
use crate::chainstate::{CodecResult, OutputType, UtxoRecord};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Dust definition to apply
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DustPolicy {
    /// Pre-0.15 relay rule: dust when spending costs more than a third of the value
    /// (`amount / (3 * input_size)`)
    Legacy,
    /// Current relay rule: the output and its spending input together
    /// (`amount / (output_size + input_size)`)
    Current,
}

impl DustPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            DustPolicy::Legacy => "legacy",
            DustPolicy::Current => "current",
        }
    }
}

impl fmt::Display for DustPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DustPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "legacy" => Ok(DustPolicy::Legacy),
            "current" => Ok(DustPolicy::Current),
            other => Err(format!(
                "Unknown dust policy '{}' (expected 'legacy' or 'current')",
                other
            )),
        }
    }
}

/// Threshold fee rate of one classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Rate {
    /// Classified at this rate and every higher one
    Value(u64),
    /// Excluded by configuration (uncounted P2SH)
    Skipped,
    /// Not computable, e.g. no estimation data
    Unknown,
}

impl Rate {
    pub fn value(&self) -> Option<u64> {
        match self {
            Rate::Value(rate) => Some(*rate),
            Rate::Skipped | Rate::Unknown => None,
        }
    }

    /// Whether the output falls in this class at `fee_rate`
    pub fn is_classified_at(&self, fee_rate: u64) -> bool {
        matches!(self, Rate::Value(rate) if *rate <= fee_rate)
    }
}

/// Round a raw rate up to the next multiple of `fee_step`
///
/// Zero stays zero. A rate that already is a multiple moves up one step, so
/// the result is always strictly above a non-zero input. NaN and infinities
/// are [`Rate::Unknown`].
pub fn round_up_to_step(rate: f64, fee_step: u64) -> Rate {
    if !rate.is_finite() || rate < 0.0 {
        return Rate::Unknown;
    }
    if rate == 0.0 {
        return Rate::Value(0);
    }

    let step = fee_step as f64;
    if rate % step == 0.0 {
        Rate::Value((rate as u64).saturating_add(fee_step))
    } else {
        Rate::Value(((rate / step).ceil() as u64).saturating_mul(fee_step))
    }
}

/// Bytes of a CompactSize length prefix
pub fn compact_size_len(n: u64) -> u64 {
    match n {
        0..=0xfc => 1,
        0xfd..=0xffff => 3,
        0x1_0000..=0xffff_ffff => 5,
        _ => 9,
    }
}

fn output_size_for_script(script_len: u64) -> u64 {
    // value (8) + script length prefix + script
    8 + compact_size_len(script_len) + script_len
}

/// Serialized size of the uncompressed output, from the template alone
pub fn serialized_output_size(out_type: OutputType, payload: &[u8]) -> u64 {
    let script_len = match out_type {
        OutputType::P2pkh => 25,
        OutputType::P2sh => 23,
        OutputType::P2pkCompressedEven | OutputType::P2pkCompressedOdd => 35,
        OutputType::P2pkUncompressedEven | OutputType::P2pkUncompressedOdd => 67,
        OutputType::Other(_) => payload.len() as u64,
    };
    output_size_for_script(script_len)
}

/// Serialized size of the uncompressed output, by decompressing the script
pub fn serialized_output_size_exact(out_type: OutputType, payload: &[u8]) -> CodecResult<u64> {
    let script = decompress_script(out_type, payload)?;
    Ok(output_size_for_script(script.len() as u64))
}

fn rate_for(amount: u64, size: InputSize, divisor: impl Fn(f64) -> f64, fee_step: u64) -> Rate {
    match size {
        InputSize::Bytes(bytes) => round_up_to_step(amount as f64 / divisor(bytes), fee_step),
        InputSize::Skip => Rate::Skipped,
        InputSize::Unknown => Rate::Unknown,
    }
}

/// Dust threshold rate of an output
pub fn dust_rate(
    amount: u64,
    input_size: InputSize,
    output_size: u64,
    policy: DustPolicy,
    fee_step: u64,
) -> Rate {
    match policy {
        DustPolicy::Legacy => rate_for(amount, input_size, |s| 3.0 * s, fee_step),
        DustPolicy::Current => {
            rate_for(amount, input_size, |s| output_size as f64 + s, fee_step)
        }
    }
}

/// Rate at which spending costs exactly the output's value
pub fn breakeven_rate(amount: u64, input_size: InputSize, fee_step: u64) -> Rate {
    rate_for(amount, input_size, |s| s, fee_step)
}

/// All classifications of one output
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Classification {
    pub dust: Rate,
    pub non_profitable: Rate,
    pub non_profitable_est: Rate,
    pub min_input_size: InputSize,
    pub est_input_size: InputSize,
}

/// Parameters shared by every classification in a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassifierSettings {
    pub fee_step: u64,
    pub dust_policy: DustPolicy,
    pub count_p2sh: bool,
    pub coin: CoinProfile,
}

/// Classifies records against fixed settings and optional estimation data
#[derive(Debug, Clone, Copy)]
pub struct Classifier<'a> {
    settings: ClassifierSettings,
    estimation: Option<&'a EstimationProfile>,
}

impl<'a> Classifier<'a> {
    pub fn new(settings: ClassifierSettings, estimation: Option<&'a EstimationProfile>) -> Self {
        Self {
            settings,
            estimation,
        }
    }

    pub fn settings(&self) -> &ClassifierSettings {
        &self.settings
    }

    pub fn classify(&self, record: &UtxoRecord) -> Classification {
        let out_type = record.out_type();
        let payload = record.script_payload();
        let amount = record.amount();
        let fee_step = self.settings.fee_step;

        let min_input_size = min_input_size(
            out_type,
            payload,
            record.height(),
            self.settings.count_p2sh,
            self.settings.coin,
        );
        let est_input_size =
            estimated_input_size(out_type, payload, record.height(), self.estimation);
        let output_size = serialized_output_size(out_type, payload);

        Classification {
            dust: dust_rate(
                amount,
                min_input_size,
                output_size,
                self.settings.dust_policy,
                fee_step,
            ),
            non_profitable: breakeven_rate(amount, min_input_size, fee_step),
            non_profitable_est: breakeven_rate(amount, est_input_size, fee_step),
            min_input_size,
            est_input_size,
        }
    }
}
