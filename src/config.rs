use crate::analysis::classifier::{ClassifierSettings, DustPolicy};
use crate::analysis::histogram::FeeRateRange;
use crate::analysis::input_size::CoinProfile;
use crate::chainstate::ChainstateFormat;
use crate::errors::{AppError, AppResult};
use crate::processor::ConfigValidator;
use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;

/// Application configuration loaded from config.toml or environment variables
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    pub paths: PathsConfig,
    pub analysis: AnalysisConfig,
    pub processing: ProcessingConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PathsConfig {
    /// Bitcoin Core `chainstate/` LevelDB directory
    pub chainstate: PathBuf,
    pub output_dir: PathBuf,
    /// Directory holding the input-size estimation JSON files
    pub estimation_dir: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// "modern" (>= 0.15) or "legacy"
    pub format: String,
    pub fee_step: u64,
    pub min_rate: u64,
    pub max_rate: u64,
    /// "legacy" or "current"
    pub dust_policy: String,
    pub count_p2sh: bool,
    pub coin: String,
    /// Only used for coins without a built-in profile
    pub compressed_pk_height: u32,
    pub non_std_only: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessingConfig {
    pub batch_size: usize,
    pub workers: usize,
    pub progress_interval_ms: u64,
    pub strict: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            paths: PathsConfig {
                chainstate: PathBuf::from("./chainstate"),
                output_dir: PathBuf::from("./output_data"),
                estimation_dir: PathBuf::from("./estimation_data"),
            },
            analysis: AnalysisConfig {
                format: "modern".to_string(),
                fee_step: 10,
                min_rate: 0,
                max_rate: 350,
                dust_policy: "legacy".to_string(),
                count_p2sh: false,
                coin: "bitcoin".to_string(),
                compressed_pk_height: 0,
                non_std_only: false,
            },
            processing: ProcessingConfig {
                batch_size: 10000,
                workers: 4,
                progress_interval_ms: 500,
                strict: false,
            },
        }
    }
}

impl AppConfig {
    /// Load configuration from config.toml file and environment variables
    /// Environment variables take precedence over file configuration
    pub fn load() -> Result<Self, ConfigError> {
        let defaults = Self::default();
        let config = Config::builder()
            // Start with default values
            .set_default(
                "paths.chainstate",
                defaults.paths.chainstate.to_string_lossy().to_string(),
            )?
            .set_default(
                "paths.output_dir",
                defaults.paths.output_dir.to_string_lossy().to_string(),
            )?
            .set_default(
                "paths.estimation_dir",
                defaults.paths.estimation_dir.to_string_lossy().to_string(),
            )?
            .set_default("analysis.format", defaults.analysis.format)?
            .set_default("analysis.fee_step", defaults.analysis.fee_step)?
            .set_default("analysis.min_rate", defaults.analysis.min_rate)?
            .set_default("analysis.max_rate", defaults.analysis.max_rate)?
            .set_default("analysis.dust_policy", defaults.analysis.dust_policy)?
            .set_default("analysis.count_p2sh", defaults.analysis.count_p2sh)?
            .set_default("analysis.coin", defaults.analysis.coin)?
            .set_default(
                "analysis.compressed_pk_height",
                defaults.analysis.compressed_pk_height as i64,
            )?
            .set_default("analysis.non_std_only", defaults.analysis.non_std_only)?
            .set_default("processing.batch_size", defaults.processing.batch_size as i64)?
            .set_default("processing.workers", defaults.processing.workers as i64)?
            .set_default(
                "processing.progress_interval_ms",
                defaults.processing.progress_interval_ms,
            )?
            .set_default("processing.strict", defaults.processing.strict)?
            // Load from config.toml if it exists
            .add_source(File::with_name("config").required(false))
            // DUST_ANALYSIS__FEE_STEP=20 overrides analysis.fee_step
            .add_source(
                Environment::with_prefix("DUST")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let mut app_config: AppConfig = config.try_deserialize()?;

        // Check for specific environment variables with custom names
        if let Ok(chainstate) = env::var("CHAINSTATE_PATH") {
            app_config.paths.chainstate = PathBuf::from(chainstate);
        }

        if let Ok(output_dir) = env::var("DUST_OUTPUT_DIR") {
            app_config.paths.output_dir = PathBuf::from(output_dir);
        }

        Ok(app_config)
    }

    /// Get default config values for CLI argument defaults
    pub fn get_defaults() -> Result<Self, ConfigError> {
        // Try to load config for defaults, but don't fail if not found
        match Self::load() {
            Ok(config) => Ok(config),
            Err(e) => {
                tracing::warn!("Ignoring unreadable configuration ({}), using defaults", e);
                Ok(Self::default())
            }
        }
    }

    /// Check every setting that has a restricted value set
    pub fn validate(&self) -> AppResult<()> {
        self.chainstate_format()?;
        self.dust_policy()?;
        self.fee_rate_range()?;
        if self.processing.workers == 0 {
            return Err(AppError::Config(
                "Worker count must be greater than 0".to_string(),
            ));
        }
        ConfigValidator::validate_batch_config(
            self.processing.batch_size,
            self.processing.progress_interval_ms,
        )
    }

    pub fn chainstate_format(&self) -> AppResult<ChainstateFormat> {
        self.analysis.format.parse().map_err(AppError::Config)
    }

    pub fn dust_policy(&self) -> AppResult<DustPolicy> {
        self.analysis.dust_policy.parse().map_err(AppError::Config)
    }

    pub fn coin_profile(&self) -> CoinProfile {
        CoinProfile::from_name(&self.analysis.coin, self.analysis.compressed_pk_height)
    }

    pub fn fee_rate_range(&self) -> AppResult<FeeRateRange> {
        FeeRateRange::new(
            self.analysis.fee_step,
            self.analysis.min_rate,
            self.analysis.max_rate,
        )
    }

    pub fn classifier_settings(&self) -> AppResult<ClassifierSettings> {
        Ok(ClassifierSettings {
            fee_step: self.analysis.fee_step,
            dust_policy: self.dust_policy()?,
            count_p2sh: self.analysis.count_p2sh,
            coin: self.coin_profile(),
        })
    }

    /// Render the built-in defaults as a config.toml
    pub fn sample_toml() -> AppResult<String> {
        Ok(toml::to_string_pretty(&Self::default())?)
    }
}
