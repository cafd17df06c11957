//! Core time and error types.
//!
//! This module provides:
//! - `time`: Time types (Date, DayCountConvention) and the Act/365 time function
//! - `error`: Structured error types for date and interpolation operations
//!
//! # Re-exports
//!
//! For convenience, commonly used types are re-exported at this module level:
//! - [`Date`], [`DayCountConvention`], [`act_365`] from `time`
//! - [`DateError`], [`InterpolationError`] from `error`

pub mod error;
pub mod time;

// Re-export commonly used types at module level
pub use error::{DateError, InterpolationError};
pub use time::{act_365, Date, DayCountConvention};
