//! Empirical input-size data for the estimated non-profitability metric
//!
//! The data is produced offline from spent inputs on the chain and shipped
//! as four JSON files in one directory:
//!
//! - `p2pkh_pubkey_avg_size_height_output.json`: `{"<height>": avg_pubkey_size, ...}`
//!   for every height from 0 to the last analysed block
//! - `p2sh.json`: average P2SH redeem-script-plus-signatures size
//! - `nonstd.json`: average scriptSig size of non-standard outputs
//! - `p2wsh.json`: average P2WSH witness size

use crate::errors::{AppError, AppResult};
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{info, warn};

pub const P2PKH_PUBKEY_FILE: &str = "p2pkh_pubkey_avg_size_height_output.json";
pub const P2SH_FILE: &str = "p2sh.json";
pub const NONSTD_FILE: &str = "nonstd.json";
pub const P2WSH_FILE: &str = "p2wsh.json";

/// Average script sizes observed on chain
#[derive(Debug)]
pub struct EstimationProfile {
    /// Average P2PKH public key size, indexed by height
    p2pkh_pubkey_size: Vec<f64>,
    p2sh_script_size: f64,
    nonstd_script_size: f64,
    p2wsh_script_size: f64,
    clamp_warned: AtomicBool,
}

impl EstimationProfile {
    pub fn new(
        p2pkh_pubkey_size: Vec<f64>,
        p2sh_script_size: f64,
        nonstd_script_size: f64,
        p2wsh_script_size: f64,
    ) -> AppResult<Self> {
        if p2pkh_pubkey_size.is_empty() {
            return Err(AppError::UnknownEstimationData(
                "P2PKH public key sizes are empty".to_string(),
            ));
        }
        Ok(Self {
            p2pkh_pubkey_size,
            p2sh_script_size,
            nonstd_script_size,
            p2wsh_script_size,
            clamp_warned: AtomicBool::new(false),
        })
    }

    /// Load the four estimation files from `dir`
    pub fn load(dir: &Path) -> AppResult<Self> {
        let by_height: HashMap<String, f64> = read_json(&dir.join(P2PKH_PUBKEY_FILE))?;
        let mut p2pkh_pubkey_size = Vec::with_capacity(by_height.len());
        for height in 0..by_height.len() {
            let size = by_height.get(&height.to_string()).ok_or_else(|| {
                AppError::UnknownEstimationData(format!(
                    "{} has no entry for height {}",
                    P2PKH_PUBKEY_FILE, height
                ))
            })?;
            p2pkh_pubkey_size.push(*size);
        }

        let profile = Self::new(
            p2pkh_pubkey_size,
            read_json(&dir.join(P2SH_FILE))?,
            read_json(&dir.join(NONSTD_FILE))?,
            read_json(&dir.join(P2WSH_FILE))?,
        )?;

        info!(
            "Loaded estimation data from {} (heights 0..{})",
            dir.display(),
            profile.max_height()
        );
        Ok(profile)
    }

    /// Load from `dir`, logging and returning `None` when the data is missing
    ///
    /// Without a profile every estimated rate is reported as unknown.
    pub fn load_optional(dir: &Path) -> Option<Self> {
        match Self::load(dir) {
            Ok(profile) => Some(profile),
            Err(e) => {
                warn!(
                    "No estimation data available ({}), estimated non-profitable rates will be unknown",
                    e
                );
                None
            }
        }
    }

    /// First height without its own P2PKH entry
    pub fn max_height(&self) -> u32 {
        self.p2pkh_pubkey_size.len() as u32
    }

    /// Average P2PKH public key size at `height`
    ///
    /// Heights past the data use the last known value.
    pub fn p2pkh_pubkey_size(&self, height: u32) -> f64 {
        let last = self.p2pkh_pubkey_size.len() - 1;
        let index = height as usize;
        if index > last && !self.clamp_warned.swap(true, Ordering::Relaxed) {
            warn!(
                "No estimation data for height {} or later, using the estimate for height {}",
                height, last
            );
        }
        self.p2pkh_pubkey_size[index.min(last)]
    }

    pub fn p2sh_script_size(&self) -> f64 {
        self.p2sh_script_size
    }

    pub fn nonstd_script_size(&self) -> f64 {
        self.nonstd_script_size
    }

    pub fn p2wsh_script_size(&self) -> f64 {
        self.p2wsh_script_size
    }
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> AppResult<T> {
    let content = fs::read_to_string(path).map_err(|e| {
        AppError::UnknownEstimationData(format!("{}: {}", path.display(), e))
    })?;
    serde_json::from_str(&content)
        .map_err(|e| AppError::UnknownEstimationData(format!("{}: {}", path.display(), e)))
}
