//! Market data error types.
//!
//! This module provides structured error handling for lookups on date-indexed
//! series, forward curves and interest-rate curves.

use crate::types::{Date, InterpolationError};
use thiserror::Error;

/// Market data operation errors.
///
/// # Variants
///
/// - `Empty`: Series constructed without any points
/// - `UnsortedDates`: Dates not strictly increasing
/// - `MissingDate`: Query date not covered by the series
/// - `InvalidValue`: Non-finite or otherwise unusable value
/// - `Interpolation`: Wrapped interpolation error
///
/// # Examples
///
/// ```
/// use storage_core::market_data::MarketDataError;
/// use storage_core::types::Date;
///
/// let err = MarketDataError::MissingDate { date: Date::from_ymd(2020, 1, 1).unwrap() };
/// assert!(format!("{}", err).contains("2020-01-01"));
/// ```
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MarketDataError {
    /// Series constructed without any points.
    #[error("Series contains no points")]
    Empty,

    /// Dates are not strictly increasing.
    #[error("Series dates must be strictly increasing: {date} at index {index}")]
    UnsortedDates {
        /// Offending date
        date: Date,
        /// Index of the offending date
        index: usize,
    },

    /// Query date not covered by the series.
    #[error("No data for date {date}")]
    MissingDate {
        /// The date that was looked up
        date: Date,
    },

    /// Non-finite or otherwise unusable value.
    #[error("Invalid value {value} on {date}: {reason}")]
    InvalidValue {
        /// Date of the value
        date: Date,
        /// The value itself
        value: f64,
        /// Why the value was rejected
        reason: &'static str,
    },

    /// Interpolation error.
    #[error("Interpolation error: {0}")]
    Interpolation(#[from] InterpolationError),
}
