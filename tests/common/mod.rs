//! Common Test Utilities
//!
//! Builders for synthetic chainstates. The same set of entries can be loaded
//! into a [`MemorySource`] or written to a real LevelDB directory, so every
//! pipeline test can run against both stores.

#![allow(dead_code)]

use std::path::Path;

use utxo_dust_analyser::analysis::{
    AnalysisOptions, ClassifierSettings, CoinProfile, DustPolicy, FeeRateRange,
};
use utxo_dust_analyser::chainstate::coin::{encode_coin, encode_txout};
use utxo_dust_analyser::chainstate::obfuscation::OBFUSCATION_KEY_KEY;
use utxo_dust_analyser::chainstate::outpoint::{encode_legacy_key, encode_modern_key};
use utxo_dust_analyser::chainstate::varint;
use utxo_dust_analyser::chainstate::{
    ChainstateFormat, CoinRecord, CompressedTxOut, MemorySource, ObfuscationKey, Outpoint,
    OutputType, TxId,
};

/// 8-byte key, as Bitcoin Core generates
pub const TEST_OBFUSCATION_KEY: [u8; 8] = [0x5a, 0x1f, 0x00, 0xc3, 0x77, 0x02, 0xe9, 0x4b];

pub fn txid(byte: u8) -> TxId {
    TxId([byte; 32])
}

pub fn p2pkh(amount: u64) -> CompressedTxOut {
    CompressedTxOut {
        amount,
        out_type: OutputType::P2pkh,
        script_payload: vec![0x42; 20],
    }
}

pub fn p2sh(amount: u64) -> CompressedTxOut {
    CompressedTxOut {
        amount,
        out_type: OutputType::P2sh,
        script_payload: vec![0x17; 20],
    }
}

/// Raw-script output wrapping `script`
pub fn raw_script(amount: u64, script: Vec<u8>) -> CompressedTxOut {
    CompressedTxOut {
        amount,
        out_type: OutputType::Other(script.len()),
        script_payload: script,
    }
}

/// `OP_m <n compressed keys> OP_n OP_CHECKMULTISIG`
pub fn bare_multisig(m: u8, n: u8) -> Vec<u8> {
    let mut script = vec![0x50 + m];
    for i in 0..n {
        script.push(33);
        script.push(0x02);
        script.extend_from_slice(&[i + 1; 32]);
    }
    script.push(0x50 + n);
    script.push(0xae);
    script
}

/// `OP_0 <20 bytes>`
pub fn p2wpkh_script() -> Vec<u8> {
    let mut script = vec![0x00, 0x14];
    script.extend_from_slice(&[0x33; 20]);
    script
}

/// Value of a legacy `'c'` record holding `outputs` (ascending vout)
pub fn legacy_value(
    version: u64,
    is_coinbase: bool,
    height: u32,
    outputs: &[(u32, CompressedTxOut)],
) -> Vec<u8> {
    let vout0 = outputs.iter().any(|(vout, _)| *vout == 0);
    let vout1 = outputs.iter().any(|(vout, _)| *vout == 1);

    let mut bitvector = Vec::new();
    for (vout, _) in outputs.iter().filter(|(vout, _)| *vout >= 2) {
        let bit = (*vout - 2) as usize;
        if bitvector.len() <= bit / 8 {
            bitvector.resize(bit / 8 + 1, 0u8);
        }
        bitvector[bit / 8] |= 1 << (bit % 8);
    }
    let non_zero = bitvector.iter().filter(|b| **b != 0).count() as u64;
    let stored_n = if vout0 || vout1 { non_zero } else { non_zero - 1 };
    let code = u64::from(is_coinbase) | (u64::from(vout0) << 1) | (u64::from(vout1) << 2) | (stored_n << 3);

    let mut value = varint::encode(version);
    value.extend(varint::encode(code));
    value.extend(bitvector);
    for (_, txout) in outputs {
        value.extend(encode_txout(txout).unwrap());
    }
    value.extend(varint::encode(u64::from(height)));
    value
}

/// Plain-text entries plus the key they will be obfuscated with
#[derive(Debug, Clone)]
pub struct ChainstateBuilder {
    format: ChainstateFormat,
    obfuscation: ObfuscationKey,
    entries: Vec<(Vec<u8>, Vec<u8>)>,
}

impl ChainstateBuilder {
    pub fn new(format: ChainstateFormat) -> Self {
        Self {
            format,
            obfuscation: ObfuscationKey::new(TEST_OBFUSCATION_KEY.to_vec()),
            entries: Vec::new(),
        }
    }

    pub fn without_obfuscation(mut self) -> Self {
        self.obfuscation = ObfuscationKey::none();
        self
    }

    pub fn format(&self) -> ChainstateFormat {
        self.format
    }

    /// Add one modern per-output entry
    pub fn coin(mut self, tx: u8, index: u32, height: u32, is_coinbase: bool, txout: CompressedTxOut) -> Self {
        let coin = CoinRecord::new(height, is_coinbase, txout.amount, txout.out_type, txout.script_payload)
            .unwrap();
        let key = encode_modern_key(&Outpoint {
            tx_id: txid(tx),
            index,
        });
        self.entries.push((key, encode_coin(&coin).unwrap()));
        self
    }

    /// Add one legacy per-transaction entry
    pub fn transaction(
        mut self,
        tx: u8,
        height: u32,
        is_coinbase: bool,
        outputs: &[(u32, CompressedTxOut)],
    ) -> Self {
        let key = encode_legacy_key(&txid(tx));
        self.entries.push((key, legacy_value(1, is_coinbase, height, outputs)));
        self
    }

    /// Add an entry whose value is stored as given, before obfuscation
    pub fn raw(mut self, key: Vec<u8>, value: Vec<u8>) -> Self {
        self.entries.push((key, value));
        self
    }

    fn stored_entries(&self) -> Vec<(Vec<u8>, Vec<u8>)> {
        let mut stored: Vec<(Vec<u8>, Vec<u8>)> = self
            .entries
            .iter()
            .map(|(key, value)| (key.clone(), self.obfuscation.deobfuscate(value)))
            .collect();
        if !self.obfuscation.is_empty() {
            let mut record = vec![self.obfuscation.as_bytes().len() as u8];
            record.extend_from_slice(self.obfuscation.as_bytes());
            stored.push((OBFUSCATION_KEY_KEY.to_vec(), record));
        }
        stored
    }

    pub fn memory(&self) -> MemorySource {
        let mut source = MemorySource::new();
        for (key, value) in self.stored_entries() {
            source.insert(key, value);
        }
        source
    }

    /// Write the entries into a fresh LevelDB under `dir`
    pub fn write_leveldb(&self, dir: &Path) -> anyhow::Result<()> {
        let mut opts = rusty_leveldb::Options::default();
        opts.create_if_missing = true;
        let mut db = rusty_leveldb::DB::open(dir, opts).map_err(|e| anyhow::anyhow!("{}", e))?;
        for (key, value) in self.stored_entries() {
            db.put(&key, &value).map_err(|e| anyhow::anyhow!("{}", e))?;
        }
        db.flush().map_err(|e| anyhow::anyhow!("{}", e))?;
        Ok(())
    }
}

pub fn bitcoin_settings(fee_step: u64) -> ClassifierSettings {
    ClassifierSettings {
        fee_step,
        dust_policy: DustPolicy::Legacy,
        count_p2sh: false,
        coin: CoinProfile::Bitcoin,
    }
}

/// Options for a run over `0..=max_rate` in steps of `fee_step`
pub fn analysis_options(format: ChainstateFormat, fee_step: u64, max_rate: u64, workers: usize) -> AnalysisOptions {
    AnalysisOptions {
        format,
        range: FeeRateRange::new(fee_step, 0, max_rate).unwrap(),
        classifier: bitcoin_settings(fee_step),
        non_std_only: false,
        strict: false,
        workers,
        batch_size: 3,
        progress_interval_ms: 100,
        show_progress: false,
    }
}

/// A small UTXO set mixing every output family, as `(tx, height, coinbase, outputs)`
pub fn sample_transactions() -> Vec<(u8, u32, bool, Vec<(u32, CompressedTxOut)>)> {
    vec![
        (0x01, 120_000, true, vec![(0, p2pkh(5_000_000_000))]),
        (
            0x02,
            350_000,
            false,
            vec![(0, p2pkh(546)), (1, p2sh(1_000)), (4, p2pkh(25_000))],
        ),
        (
            0x03,
            400_000,
            false,
            vec![(1, raw_script(780, bare_multisig(1, 3))), (2, raw_script(600, bare_multisig(2, 3)))],
        ),
        (0x04, 500_000, false, vec![(0, raw_script(294, p2wpkh_script()))]),
        (
            0x05,
            650_000,
            false,
            vec![(0, raw_script(0, vec![0x6a, 0x04, 0xde, 0xad, 0xbe, 0xef])), (9, p2pkh(3_000))],
        ),
    ]
}

/// [`sample_transactions`] laid out in `format`
pub fn sample_chainstate(format: ChainstateFormat) -> ChainstateBuilder {
    let mut builder = ChainstateBuilder::new(format);
    for (tx, height, coinbase, outputs) in sample_transactions() {
        builder = match format {
            ChainstateFormat::Legacy => builder.transaction(tx, height, coinbase, &outputs),
            ChainstateFormat::Modern => outputs.into_iter().fold(builder, |builder, (vout, txout)| {
                builder.coin(tx, vout, height, coinbase, txout)
            }),
        };
    }
    builder
}

/// Outputs in [`sample_transactions`]
pub const SAMPLE_OUTPUTS: u64 = 9;
