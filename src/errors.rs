use crate::chainstate::CodecError;
use thiserror::Error;

/// Application-wide error type - single point of truth
#[derive(Error, Debug)]
pub enum AppError {
    /// Chainstate record decoding
    #[error("Decode error: {0}")]
    Codec(#[from] CodecError),

    /// File I/O operations
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV output
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// JSON input and output
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration issues
    #[error("Configuration error: {0}")]
    Config(String),

    /// Chainstate store access
    #[error("Store error: {0}")]
    Store(String),

    /// Data validation/parsing
    #[error("Invalid data: {0}")]
    InvalidData(String),

    /// Estimation data missing or malformed
    #[error("Unknown estimation data: {0}")]
    UnknownEstimationData(String),

    /// Store entry that failed to decode in strict mode
    #[error("Invalid chainstate entry #{index}: {reason}")]
    InvalidRecord { index: usize, reason: String },
}

/// Application-wide result type - single point of truth
pub type AppResult<T> = Result<T, AppError>;

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        AppError::Config(err.to_string())
    }
}

impl From<toml::ser::Error> for AppError {
    fn from(err: toml::ser::Error) -> Self {
        AppError::Config(format!("TOML error: {}", err))
    }
}
