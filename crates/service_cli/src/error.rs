//! CLI error types

use thiserror::Error;

use crate::config::ConfigError;

/// Errors raised by CLI commands
#[derive(Debug, Error)]
pub enum CliError {
    /// Input file does not exist
    #[error("File not found: {0}")]
    FileNotFound(String),

    /// Command-line argument rejected
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Configuration file or environment rejected
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Storage facility could not be built
    #[error(transparent)]
    Storage(#[from] storage_models::StorageError),

    /// Price model could not be built
    #[error(transparent)]
    Model(#[from] storage_models::ModelError),

    /// Curve could not be built
    #[error(transparent)]
    MarketData(#[from] storage_core::market_data::MarketDataError),

    /// Valuation failed
    #[error(transparent)]
    Valuation(#[from] storage_pricing::ValuationError),

    /// Result could not be written
    #[error("Output error: {0}")]
    Output(String),
}

impl From<std::io::Error> for CliError {
    fn from(err: std::io::Error) -> Self {
        CliError::Output(err.to_string())
    }
}

impl From<serde_json::Error> for CliError {
    fn from(err: serde_json::Error) -> Self {
        CliError::Output(err.to_string())
    }
}

/// Result alias for CLI commands
pub type Result<T> = std::result::Result<T, CliError>;
