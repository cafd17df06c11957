//! Error types for the storage valuation engine.
//!
//! [`ConfigError`] covers invalid [`LsmcConfig`](super::LsmcConfig) values
//! caught at construction; [`ValuationError`] is what a valuation call returns.

use std::fmt;

use storage_core::market_data::MarketDataError;
use storage_core::types::Date;
use storage_models::{ModelError, StorageError};
use thiserror::Error;

use crate::basis::BasisError;

/// Configuration error for the LSMC engine.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ConfigError {
    /// Path count outside valid range [1, 10_000_000].
    InvalidPathCount(usize),
    /// Fewer than 3 inventory grid points.
    InvalidGridPoints(usize),
    /// Invalid parameter value with name and description.
    InvalidParameter {
        /// Parameter name.
        name: &'static str,
        /// Description of the invalid value.
        value: String,
    },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidPathCount(count) => {
                write!(
                    f,
                    "Invalid path count {}: must be in range [1, 10_000_000]",
                    count
                )
            }
            Self::InvalidGridPoints(count) => {
                write!(f, "Invalid grid point count {}: must be at least 3", count)
            }
            Self::InvalidParameter { name, value } => {
                write!(f, "Invalid parameter '{}': {}", name, value)
            }
        }
    }
}

impl std::error::Error for ConfigError {}

/// Errors returned by a storage valuation.
///
/// No partial result accompanies an error.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValuationError {
    /// Invalid engine configuration.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Invalid valuation inputs, e.g. a negative starting inventory.
    #[error("Invalid valuation request: {0}")]
    InvalidRequest(String),

    /// The basis expression failed to parse.
    #[error("Basis function error: {0}")]
    Basis(#[from] BasisError),

    /// Price model misconfiguration.
    #[error("Model error: {0}")]
    Model(#[from] ModelError),

    /// Storage misconfiguration or infeasible constraints.
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// A curve does not cover a required date.
    #[error("Market data error: {0}")]
    MarketData(#[from] MarketDataError),

    /// The regression design matrix is rank deficient.
    #[error("Regression design matrix for {date} has rank {rank} with {columns} basis functions")]
    RegressionSingularity {
        /// Decision date whose continuation values were being fitted.
        date: Date,
        /// Numerical rank found.
        rank: usize,
        /// Number of basis columns after merging constant columns.
        columns: usize,
    },

    /// The progress callback asked to stop.
    #[error("Valuation cancelled")]
    Cancelled,
}

impl ValuationError {
    /// True for errors caused by malformed inputs rather than by the data
    /// encountered during the valuation.
    pub fn is_configuration_error(&self) -> bool {
        match self {
            ValuationError::Config(_)
            | ValuationError::InvalidRequest(_)
            | ValuationError::Basis(_)
            | ValuationError::Model(_) => true,
            ValuationError::Storage(e) => matches!(e, StorageError::InvalidStorageConfiguration(_)),
            ValuationError::MarketData(_)
            | ValuationError::RegressionSingularity { .. }
            | ValuationError::Cancelled => false,
        }
    }

    /// True if no feasible inventory path exists.
    pub fn is_infeasible(&self) -> bool {
        matches!(self, ValuationError::Storage(StorageError::InfeasibleConstraint { .. }))
    }
}
