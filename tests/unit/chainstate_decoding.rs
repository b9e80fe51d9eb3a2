//! Decoding of hand-assembled chainstate entries
//!
//! The byte strings here are written out by hand rather than produced by the
//! crate's own encoders, so they pin the on-disk layout independently.

use utxo_dust_analyser::analysis::for_each_entry;
use utxo_dust_analyser::chainstate::{
    decode_entry, lookup_utxo, ChainstateFormat, CodecError, DecodedEntry, ObfuscationKey, Outpoint,
    OutputType, RawEntry,
};
use utxo_dust_analyser::errors::AppError;

use crate::common::{p2pkh, p2sh, raw_script, txid, ChainstateBuilder, TEST_OBFUSCATION_KEY};

fn modern_key(tx: u8, index: u8) -> Vec<u8> {
    let mut key = vec![b'C'];
    key.extend_from_slice(&[tx; 32]);
    key.push(index);
    key
}

fn legacy_key(tx: u8) -> Vec<u8> {
    let mut key = vec![b'c'];
    key.extend_from_slice(&[tx; 32]);
    key
}

#[test]
fn test_modern_p2pkh_entry() {
    // height 1, not coinbase | 50 BTC | P2PKH | hash160
    let mut value = vec![0x02, 0x32, 0x00];
    value.extend_from_slice(&[0xab; 20]);

    let entry = RawEntry::new(modern_key(0x11, 0), value);
    let records = decode_entry(ChainstateFormat::Modern, &ObfuscationKey::none(), &entry)
        .unwrap()
        .into_records();

    assert_eq!(records.len(), 1);
    let record = &records[0];
    assert_eq!(record.outpoint.index, 0);
    assert_eq!(record.amount(), 5_000_000_000);
    assert_eq!(record.height(), 1);
    assert!(!record.coin.is_coinbase);
    assert_eq!(record.out_type(), OutputType::P2pkh);
    assert_eq!(record.script_payload(), &[0xab; 20]);
    assert_eq!(record.serialized_length, 34 + 23);
}

#[test]
fn test_legacy_coinbase_first_output() {
    // version 1 | coinbase, vout0 unspent | 50 BTC P2PKH | height 100
    let mut value = vec![0x01, 0x03, 0x32, 0x00];
    value.extend_from_slice(&[0xcd; 20]);
    value.push(0x64);

    let entry = RawEntry::new(legacy_key(0x22), value);
    let decoded = decode_entry(ChainstateFormat::Legacy, &ObfuscationKey::none(), &entry).unwrap();
    let DecodedEntry::Legacy(legacy) = &decoded else {
        panic!("expected a legacy entry");
    };
    assert_eq!(legacy.version, 1);
    assert_eq!(legacy.height, 100);

    let records = decoded.into_records();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].outpoint.index, 0);
    assert!(records[0].coin.is_coinbase);
    assert_eq!(records[0].amount(), 5_000_000_000);
}

#[test]
fn test_legacy_code_five_marks_second_output() {
    // bit 2 of the code is vout[1], not vout[0]
    let mut value = vec![0x01, 0x05, 0x32, 0x00];
    value.extend_from_slice(&[0xcd; 20]);
    value.push(0x64);

    let records = decode_entry(
        ChainstateFormat::Legacy,
        &ObfuscationKey::none(),
        &RawEntry::new(legacy_key(0x22), value),
    )
    .unwrap()
    .into_records();

    assert_eq!(records.len(), 1);
    assert_eq!(records[0].outpoint.index, 1);
    assert!(records[0].coin.is_coinbase);
}

#[test]
fn test_legacy_bitvector_with_zero_byte() {
    // vout 2 and vout 20: bitvector 01 00 04 holds two non-zero bytes,
    // stored as N - 1 = 1 because neither vout[0] nor vout[1] is unspent
    let mut value = vec![0x01, 0x08, 0x01, 0x00, 0x04];
    for _ in 0..2 {
        value.extend_from_slice(&[0x09, 0x01]);
        value.extend_from_slice(&[0x55; 20]);
    }
    value.push(0x0a);

    let records = decode_entry(
        ChainstateFormat::Legacy,
        &ObfuscationKey::none(),
        &RawEntry::new(legacy_key(0x33), value),
    )
    .unwrap()
    .into_records();

    let indices: Vec<u32> = records.iter().map(|r| r.outpoint.index).collect();
    assert_eq!(indices, vec![2, 20]);
    assert!(records.iter().all(|r| r.out_type() == OutputType::P2sh));
    assert!(records.iter().all(|r| r.height() == 10));
}

#[test]
fn test_raw_script_length_from_type() {
    // out_type 9 is a raw script of 9 - 6 = 3 bytes
    let value = vec![0x02, 0x00, 0x09, 0x51, 0x52, 0x93];
    let records = decode_entry(
        ChainstateFormat::Modern,
        &ObfuscationKey::none(),
        &RawEntry::new(modern_key(0x44, 1), value),
    )
    .unwrap()
    .into_records();

    assert_eq!(records[0].out_type(), OutputType::Other(3));
    assert_eq!(records[0].script_payload(), &[0x51, 0x52, 0x93]);
    assert_eq!(records[0].amount(), 0);

    let short = vec![0x02, 0x00, 0x09, 0x51, 0x52];
    let err = decode_entry(
        ChainstateFormat::Modern,
        &ObfuscationKey::none(),
        &RawEntry::new(modern_key(0x44, 1), short),
    )
    .unwrap_err();
    assert!(matches!(err, CodecError::UnexpectedEndOfBuffer { .. }));
}

#[test]
fn test_deobfuscation_is_an_involution() {
    let key = ObfuscationKey::new(TEST_OBFUSCATION_KEY.to_vec());
    for value in [vec![], vec![0xff], (0u8..=200).collect::<Vec<u8>>()] {
        let masked = key.deobfuscate(&value);
        assert_eq!(key.deobfuscate(&masked), value);
    }
}

#[test]
fn test_obfuscated_store_decodes_like_plain_store() {
    let builder = ChainstateBuilder::new(ChainstateFormat::Modern)
        .coin(1, 0, 400_000, false, p2pkh(12_345))
        .coin(1, 3, 400_000, false, p2sh(600))
        .coin(2, 0, 10, true, raw_script(1, vec![0x6a, 0x01, 0x00]));

    let collect = |builder: ChainstateBuilder| {
        let mut records = Vec::new();
        let mut source = builder.memory();
        for_each_entry(&mut source, ChainstateFormat::Modern, true, |entry| {
            records.extend(entry.into_records());
            Ok(())
        })
        .unwrap();
        records
    };

    let obfuscated = collect(builder.clone());
    let plain = collect(builder.without_obfuscation());
    assert_eq!(obfuscated.len(), 3);
    assert_eq!(obfuscated, plain);
}

#[test]
fn test_truncated_entry_aborts_strict_scan() {
    // A lone continuation byte is a truncated varint under either mask
    let mut source = ChainstateBuilder::new(ChainstateFormat::Modern)
        .coin(1, 0, 400_000, false, p2pkh(12_345))
        .raw(modern_key(0x02, 0), vec![0x80])
        .coin(3, 0, 400_000, false, p2pkh(54_321))
        .memory();

    let result = for_each_entry(&mut source, ChainstateFormat::Modern, true, |_| Ok(()));
    assert!(matches!(result, Err(AppError::InvalidRecord { index: 1, .. })));

    let mut decoded = 0;
    let stats = for_each_entry(&mut source, ChainstateFormat::Modern, false, |_| {
        decoded += 1;
        Ok(())
    })
    .unwrap();
    assert_eq!(decoded, 2);
    assert_eq!(stats.entries_scanned, 3);
    assert_eq!(stats.decode_errors, 1);
}

#[test]
fn test_lookup_in_obfuscated_modern_store() {
    let mut source = ChainstateBuilder::new(ChainstateFormat::Modern)
        .coin(7, 0, 500_000, false, p2pkh(1_000))
        .coin(7, 1, 500_000, false, p2sh(2_000))
        .memory();

    let found = lookup_utxo(
        &mut source,
        ChainstateFormat::Modern,
        &Outpoint {
            tx_id: txid(7),
            index: 1,
        },
    )
    .unwrap()
    .unwrap();
    assert_eq!(found.amount(), 2_000);
    assert_eq!(found.out_type(), OutputType::P2sh);

    let missing = lookup_utxo(
        &mut source,
        ChainstateFormat::Modern,
        &Outpoint {
            tx_id: txid(7),
            index: 2,
        },
    )
    .unwrap();
    assert!(missing.is_none());
}
