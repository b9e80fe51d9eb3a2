//! One module per subcommand, plus the argument groups they share

pub mod config;
pub mod decode;
pub mod dust;
pub mod output;
pub mod parse;
pub mod txs;
pub mod utxo;

use crate::analysis::estimation::EstimationProfile;
use crate::chainstate::{ChainstateFormat, LevelDbSource};
use crate::config::AppConfig;
use crate::errors::{AppError, AppResult};
use clap::Args;
use std::path::PathBuf;
use tracing::info;

/// Load configuration, falling back to built-in defaults
fn load_config() -> AppResult<AppConfig> {
    let config = AppConfig::get_defaults()?;
    info!("Configuration loaded successfully");
    Ok(config)
}

/// Where the chainstate lives and how to read it
#[derive(Args, Debug, Clone)]
pub struct ChainstateArgs {
    /// Chainstate directory (overrides config.toml and CHAINSTATE_PATH)
    #[arg(long)]
    pub chainstate_path: Option<PathBuf>,

    /// On-disk layout: "modern" (0.15+) or "legacy" (overrides config.toml)
    #[arg(long)]
    pub chainstate_format: Option<String>,

    /// Abort on the first entry that fails to decode
    #[arg(long)]
    pub strict: bool,
}

impl ChainstateArgs {
    pub fn format(&self, config: &AppConfig) -> AppResult<ChainstateFormat> {
        match &self.chainstate_format {
            Some(format) => format.parse().map_err(AppError::Config),
            None => config.chainstate_format(),
        }
    }

    pub fn strict(&self, config: &AppConfig) -> bool {
        self.strict || config.processing.strict
    }

    /// Open the LevelDB directory
    pub fn open(&self, config: &AppConfig) -> AppResult<LevelDbSource> {
        let path = self
            .chainstate_path
            .clone()
            .unwrap_or_else(|| config.paths.chainstate.clone());
        info!("  Chainstate: {}", path.display());
        LevelDbSource::open(&path)
    }
}

/// Classification settings shared by the commands that classify outputs
#[derive(Args, Debug, Clone)]
pub struct ClassifierArgs {
    /// Fee rate step in sat/byte (overrides config.toml)
    #[arg(long)]
    pub fee_step: Option<u64>,

    /// Dust definition: "legacy" or "current" (overrides config.toml)
    #[arg(long)]
    pub dust_policy: Option<String>,

    /// Size P2SH inputs with a one-byte redeem script instead of skipping them
    #[arg(long)]
    pub count_p2sh: bool,

    /// Coin whose compressed key adoption height applies (bitcoin, bitcoincash, litecoin)
    #[arg(long)]
    pub coin: Option<String>,

    /// Directory with the estimation JSON files (overrides config.toml)
    #[arg(long)]
    pub estimation_dir: Option<PathBuf>,

    /// Do not load estimation data; estimated rates are reported as unknown
    #[arg(long)]
    pub no_estimation: bool,
}

impl ClassifierArgs {
    /// Fold the CLI overrides into `config`
    pub fn apply(&self, config: &mut AppConfig) {
        if let Some(fee_step) = self.fee_step {
            config.analysis.fee_step = fee_step;
        }
        if let Some(policy) = &self.dust_policy {
            config.analysis.dust_policy = policy.clone();
        }
        if let Some(coin) = &self.coin {
            config.analysis.coin = coin.clone();
        }
        if let Some(dir) = &self.estimation_dir {
            config.paths.estimation_dir = dir.clone();
        }
        config.analysis.count_p2sh |= self.count_p2sh;
    }

    pub fn estimation(&self, config: &AppConfig) -> Option<EstimationProfile> {
        if self.no_estimation {
            info!("Estimation data disabled");
            return None;
        }
        EstimationProfile::load_optional(&config.paths.estimation_dir)
    }
}
