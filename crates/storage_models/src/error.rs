//! Error types for price models and storage definitions.

use storage_core::market_data::MarketDataError;
use storage_core::types::Date;
use thiserror::Error;

use crate::models::correlation::CorrelationError;

/// Errors raised by the multi-factor price model.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ModelError {
    /// Malformed model inputs: dimension mismatches, negative mean reversion,
    /// or a negative implied variance from ill-conditioned correlations.
    #[error("Model configuration error: {0}")]
    ModelConfiguration(String),

    /// The factor structure cannot be simulated, e.g. the correlation matrix is
    /// not positive semi-definite after tolerance adjustment.
    #[error("Invalid factor configuration: {0}")]
    InvalidFactorConfiguration(String),

    /// Correlation matrix failed validation.
    #[error("Correlation error: {0}")]
    Correlation(#[from] CorrelationError),

    /// A volatility curve lookup failed.
    #[error("Volatility curve error: {0}")]
    MarketData(#[from] MarketDataError),
}

/// Errors raised while building or interrogating a storage facility.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum StorageError {
    /// Malformed storage inputs caught at construction.
    #[error("Invalid storage configuration: {0}")]
    InvalidStorageConfiguration(String),

    /// No inventory path satisfies the constraints on `date`.
    #[error("Infeasible storage constraint on {date}: {reason}")]
    InfeasibleConstraint {
        /// First date on which the constraints cannot be met.
        date: Date,
        /// What could not be satisfied.
        reason: String,
    },

    /// An inventory bound series lookup failed.
    #[error("Inventory bound lookup failed: {0}")]
    MarketData(#[from] MarketDataError),
}

impl StorageError {
    /// Shorthand for [`StorageError::InvalidStorageConfiguration`].
    pub fn config(msg: impl Into<String>) -> Self {
        StorageError::InvalidStorageConfiguration(msg.into())
    }
}
