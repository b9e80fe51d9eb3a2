//! Round trips through a real LevelDB directory

use tempfile::TempDir;
use utxo_dust_analyser::analysis::{collect_transactions, run_dust_analysis};
use utxo_dust_analyser::chainstate::{
    lookup_utxo, ChainstateFormat, ChainstateSource, LevelDbSource, ObfuscationKey, Outpoint,
};
use utxo_dust_analyser::errors::AppError;

use crate::common::{analysis_options, ChainstateBuilder, sample_chainstate, txid, SAMPLE_OUTPUTS, TEST_OBFUSCATION_KEY};

fn leveldb_fixture(format: ChainstateFormat) -> anyhow::Result<TempDir> {
    let dir = TempDir::new()?;
    sample_chainstate(format).write_leveldb(dir.path())?;
    Ok(dir)
}

#[test]
fn test_leveldb_matches_memory_store() -> anyhow::Result<()> {
    for format in [ChainstateFormat::Modern, ChainstateFormat::Legacy] {
        let dir = leveldb_fixture(format)?;
        let mut leveldb = LevelDbSource::open(dir.path())?;
        let mut memory = sample_chainstate(format).memory();
        let options = analysis_options(format, 10, 200, 2);

        let from_disk = run_dust_analysis(&mut leveldb, &options, None)?;
        let from_memory = run_dust_analysis(&mut memory, &options, None)?;

        assert_eq!(from_disk.histogram, from_memory.histogram);
        assert_eq!(from_disk.stats.records_decoded, SAMPLE_OUTPUTS);
        assert_eq!(from_disk.stats.decode_errors, 0);
    }
    Ok(())
}

#[test]
fn test_leveldb_reads_obfuscation_key() -> anyhow::Result<()> {
    let dir = leveldb_fixture(ChainstateFormat::Modern)?;
    let mut leveldb = LevelDbSource::open(dir.path())?;
    assert_eq!(
        leveldb.obfuscation_key()?,
        ObfuscationKey::new(TEST_OBFUSCATION_KEY.to_vec())
    );
    Ok(())
}

#[test]
fn test_prefix_scan_ignores_other_records() -> anyhow::Result<()> {
    // The obfuscation key record sorts before 'C' and must not be decoded
    let dir = leveldb_fixture(ChainstateFormat::Modern)?;
    let mut leveldb = LevelDbSource::open(dir.path())?;
    let keys: Vec<Vec<u8>> = leveldb.scan_prefix(b'C')?.map(|entry| entry.key).collect();

    assert_eq!(keys.len() as u64, SAMPLE_OUTPUTS);
    assert!(keys.iter().all(|key| key[0] == b'C'));
    assert!(keys.windows(2).all(|pair| pair[0] < pair[1]));
    Ok(())
}

#[test]
fn test_prefix_scan_starts_at_first_matching_key() -> anyhow::Result<()> {
    let dir = TempDir::new()?;
    ChainstateBuilder::new(ChainstateFormat::Modern)
        .without_obfuscation()
        .raw(b"Bbest".to_vec(), vec![0])
        .raw(b"C1".to_vec(), vec![1])
        .raw(b"C2".to_vec(), vec![2])
        .raw(b"D".to_vec(), vec![3])
        .write_leveldb(dir.path())?;
    let mut leveldb = LevelDbSource::open(dir.path())?;

    let scanned: Vec<(Vec<u8>, Vec<u8>)> = leveldb
        .scan_prefix(b'C')?
        .map(|entry| (entry.key, entry.value))
        .collect();
    assert_eq!(
        scanned,
        vec![(b"C1".to_vec(), vec![1]), (b"C2".to_vec(), vec![2])]
    );

    assert_eq!(leveldb.scan_prefix(b'B')?.count(), 1);
    assert_eq!(leveldb.scan_prefix(b'A')?.count(), 0);
    // No key sorts at or after 'c'
    assert_eq!(leveldb.scan_prefix(b'c')?.count(), 0);
    Ok(())
}

#[test]
fn test_point_lookup_on_disk() -> anyhow::Result<()> {
    let dir = leveldb_fixture(ChainstateFormat::Legacy)?;
    let mut leveldb = LevelDbSource::open(dir.path())?;

    let outpoint = Outpoint {
        tx_id: txid(0x05),
        index: 9,
    };
    let record = lookup_utxo(&mut leveldb, ChainstateFormat::Legacy, &outpoint)?
        .expect("vout 9 is unspent");
    assert_eq!(record.amount(), 3_000);
    assert_eq!(record.height(), 650_000);

    let spent = Outpoint {
        tx_id: txid(0x05),
        index: 1,
    };
    assert!(lookup_utxo(&mut leveldb, ChainstateFormat::Legacy, &spent)?.is_none());
    Ok(())
}

#[test]
fn test_transactions_from_disk() -> anyhow::Result<()> {
    let dir = leveldb_fixture(ChainstateFormat::Modern)?;
    let mut leveldb = LevelDbSource::open(dir.path())?;
    let (summaries, stats) = collect_transactions(&mut leveldb, ChainstateFormat::Modern, true)?;

    assert_eq!(summaries.len(), 5);
    assert_eq!(stats.records_decoded, SAMPLE_OUTPUTS);
    Ok(())
}

#[test]
fn test_missing_directory_is_a_store_error() {
    let dir = TempDir::new().unwrap();
    let result = LevelDbSource::open(&dir.path().join("chainstate"));
    assert!(matches!(result, Err(AppError::Store(_))));
}
