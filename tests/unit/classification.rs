//! Input sizing and fee-rate classification

use utxo_dust_analyser::analysis::classifier::dust_rate;
use utxo_dust_analyser::analysis::input_size::{estimated_input_size, min_input_size};
use utxo_dust_analyser::analysis::script_patterns::{parse_multisig, required_sigs};
use utxo_dust_analyser::analysis::{
    Classifier, CoinProfile, DustPolicy, EstimationProfile, InputSize, Rate,
};
use utxo_dust_analyser::chainstate::{CoinRecord, Outpoint, OutputType, UtxoRecord};

use crate::common::{bare_multisig, bitcoin_settings, p2wpkh_script, txid};

fn record(amount: u64, out_type: OutputType, payload: Vec<u8>, height: u32) -> UtxoRecord {
    UtxoRecord {
        outpoint: Outpoint {
            tx_id: txid(0x01),
            index: 0,
        },
        coin: CoinRecord::new(height, false, amount, out_type, payload).unwrap(),
        serialized_length: 60,
    }
}

#[test]
fn test_dust_rate_of_typical_input() {
    // 1000 / (3 * 148) = 2.25, rounded up to the 10 sat/byte step
    assert_eq!(
        dust_rate(1000, InputSize::Bytes(148.0), 34, DustPolicy::Legacy, 10),
        Rate::Value(10)
    );
}

#[test]
fn test_two_of_three_multisig_sizing() {
    let script = bare_multisig(2, 3);
    let info = parse_multisig(&script).unwrap();
    assert_eq!(info.required_sigs, 2);
    assert_eq!(info.total_pubkeys, 3);
    assert_eq!(required_sigs(&script), Some(2));

    // outpoint + sequence (40) + length prefix (1) + OP_0 and two signatures (145)
    let size = min_input_size(
        OutputType::Other(script.len()),
        &script,
        500_000,
        false,
        CoinProfile::Bitcoin,
    );
    assert_eq!(size, InputSize::Bytes(186.0));
}

#[test]
fn test_p2pkh_size_depends_on_height() {
    let early = min_input_size(OutputType::P2pkh, &[0; 20], 100_000, false, CoinProfile::Bitcoin);
    let late = min_input_size(OutputType::P2pkh, &[0; 20], 300_000, false, CoinProfile::Bitcoin);
    assert_eq!(early, InputSize::Bytes(179.0));
    assert_eq!(late, InputSize::Bytes(147.0));

    // Litecoin switched to compressed keys earlier
    let litecoin = min_input_size(OutputType::P2pkh, &[0; 20], 150_000, false, CoinProfile::Litecoin);
    assert_eq!(litecoin, InputSize::Bytes(147.0));
}

#[test]
fn test_p2sh_skipped_unless_counted() {
    assert_eq!(
        min_input_size(OutputType::P2sh, &[0; 20], 1, false, CoinProfile::Bitcoin),
        InputSize::Skip
    );
    assert_eq!(
        min_input_size(OutputType::P2sh, &[0; 20], 1, true, CoinProfile::Bitcoin),
        InputSize::Bytes(42.0)
    );
}

#[test]
fn test_p2wpkh_witness_is_discounted() {
    let script = p2wpkh_script();
    assert_eq!(
        min_input_size(OutputType::Other(22), &script, 1, false, CoinProfile::Bitcoin),
        InputSize::Bytes(68.0)
    );
}

#[test]
fn test_classification_never_undusts() {
    let classifier = Classifier::new(bitcoin_settings(1), None);
    let multisig = bare_multisig(1, 2);
    let records = [
        record(546, OutputType::P2pkh, vec![0; 20], 400_000),
        record(1, OutputType::P2pkh, vec![0; 20], 100),
        record(20_000, OutputType::Other(multisig.len()), multisig, 400_000),
        record(300, OutputType::Other(22), p2wpkh_script(), 600_000),
        record(0, OutputType::Other(2), vec![0x6a, 0x00], 600_000),
    ];

    for record in &records {
        let classification = classifier.classify(record);
        for rate in [classification.dust, classification.non_profitable] {
            let mut seen = false;
            for fee_rate in 0..=500 {
                let classified = rate.is_classified_at(fee_rate);
                assert!(!seen || classified, "{:?} undusted at {}", rate, fee_rate);
                seen |= classified;
            }
        }
    }
}

#[test]
fn test_estimated_rate_unknown_without_profile() {
    let classifier = Classifier::new(bitcoin_settings(10), None);
    let classification = classifier.classify(&record(1000, OutputType::P2pkh, vec![0; 20], 1));
    assert_eq!(classification.non_profitable_est, Rate::Unknown);
    assert_ne!(classification.non_profitable, Rate::Unknown);
}

#[test]
fn test_estimated_rate_with_profile() -> anyhow::Result<()> {
    let profile = EstimationProfile::new(vec![33.0; 10], 100.0, 50.0, 120.0)?;

    // PUSH sig (1) + sig (72) + PUSH pk (1) + average key (33)
    assert_eq!(
        estimated_input_size(OutputType::P2pkh, &[0; 20], 5, Some(&profile)),
        InputSize::Bytes(148.0)
    );
    // Heights past the data reuse its last value
    assert_eq!(
        estimated_input_size(OutputType::P2pkh, &[0; 20], 500_000, Some(&profile)),
        InputSize::Bytes(148.0)
    );

    let classifier = Classifier::new(bitcoin_settings(10), Some(&profile));
    let classification = classifier.classify(&record(1480, OutputType::P2pkh, vec![0; 20], 5));
    // 1480 / 148 = 10, exact multiples move up one step
    assert_eq!(classification.non_profitable_est, Rate::Value(20));
    Ok(())
}
