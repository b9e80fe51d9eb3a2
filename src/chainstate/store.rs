//! Chainstate key-value store access
//!
//! The analysis only needs two things from the store: an ordered scan of
//! every key under a one-byte prefix, and point lookups (for the obfuscation
//! key and single outpoints). [`ChainstateSource`] captures exactly that, with
//! a LevelDB implementation for real `chainstate/` directories and an
//! in-memory one for tests and offline decoding.

use super::obfuscation::{ObfuscationKey, OBFUSCATION_KEY_KEY};
use super::RawEntry;
use crate::errors::{AppError, AppResult};
use rusty_leveldb::{LdbIterator, Options, DB};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Ordered key-value store holding a chainstate
pub trait ChainstateSource {
    fn get(&mut self, key: &[u8]) -> AppResult<Option<Vec<u8>>>;

    /// Every entry whose key starts with `prefix`, in key order
    fn scan_prefix<'a>(
        &'a mut self,
        prefix: u8,
    ) -> AppResult<Box<dyn Iterator<Item = RawEntry> + 'a>>;

    /// The store's obfuscation key, empty when the record is absent
    fn obfuscation_key(&mut self) -> AppResult<ObfuscationKey> {
        match self.get(OBFUSCATION_KEY_KEY)? {
            Some(raw) => Ok(ObfuscationKey::from_stored_value(&raw)?),
            None => {
                debug!("No obfuscation key record, values are stored in the clear");
                Ok(ObfuscationKey::none())
            }
        }
    }
}

/// Read-only view of a Bitcoin Core `chainstate/` LevelDB directory
pub struct LevelDbSource {
    db: DB,
    path: PathBuf,
}

impl LevelDbSource {
    /// Open an existing chainstate directory
    ///
    /// The node must not be running: LevelDB holds an exclusive lock.
    pub fn open(path: &Path) -> AppResult<Self> {
        if !path.is_dir() {
            return Err(AppError::Store(format!(
                "Chainstate directory does not exist: {}",
                path.display()
            )));
        }

        let mut opts = Options::default();
        opts.create_if_missing = false;
        let db = DB::open(path, opts).map_err(|e| {
            AppError::Store(format!("Failed to open {}: {}", path.display(), e))
        })?;

        info!("Opened chainstate at {}", path.display());
        Ok(Self {
            db,
            path: path.to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ChainstateSource for LevelDbSource {
    fn get(&mut self, key: &[u8]) -> AppResult<Option<Vec<u8>>> {
        Ok(self.db.get(key).map(|value| value.to_vec()))
    }

    fn scan_prefix<'a>(
        &'a mut self,
        prefix: u8,
    ) -> AppResult<Box<dyn Iterator<Item = RawEntry> + 'a>> {
        let mut iter = self
            .db
            .new_iter()
            .map_err(|e| AppError::Store(format!("Failed to create iterator: {}", e)))?;

        // seek leaves the iterator on the first key >= prefix; later items come from next()
        iter.seek(&[prefix]);
        let mut positioned = iter.valid();
        let entries = std::iter::from_fn(move || {
            if std::mem::take(&mut positioned) {
                let (mut key, mut value) = (Vec::new(), Vec::new());
                iter.current(&mut key, &mut value).then_some((key, value))
            } else {
                LdbIterator::next(&mut iter)
            }
        })
        .take_while(move |(key, _)| key.first() == Some(&prefix))
        .map(|(key, value)| RawEntry { key, value });

        Ok(Box::new(entries))
    }
}

/// In-memory chainstate, ordered like LevelDB
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    entries: BTreeMap<Vec<u8>, Vec<u8>>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `key` as the obfuscation key record
    pub fn with_obfuscation_key(mut self, key: &ObfuscationKey) -> Self {
        let mut stored = Vec::with_capacity(key.as_bytes().len() + 1);
        stored.push(key.as_bytes().len() as u8);
        stored.extend_from_slice(key.as_bytes());
        self.entries.insert(OBFUSCATION_KEY_KEY.to_vec(), stored);
        self
    }

    pub fn insert(&mut self, key: Vec<u8>, value: Vec<u8>) {
        self.entries.insert(key, value);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl ChainstateSource for MemorySource {
    fn get(&mut self, key: &[u8]) -> AppResult<Option<Vec<u8>>> {
        Ok(self.entries.get(key).cloned())
    }

    fn scan_prefix<'a>(
        &'a mut self,
        prefix: u8,
    ) -> AppResult<Box<dyn Iterator<Item = RawEntry> + 'a>> {
        let entries = self
            .entries
            .range(vec![prefix]..)
            .take_while(move |(key, _)| key.first() == Some(&prefix))
            .map(|(key, value)| RawEntry {
                key: key.clone(),
                value: value.clone(),
            });
        Ok(Box::new(entries))
    }
}
