//! # storage_core: Foundation Types for Commodity Storage Valuation
//!
//! ## Layer 1 (Foundation) Role
//!
//! storage_core is the bottom layer of the storage valuation workspace, providing:
//! - Time types: `Date`, `DayCountConvention` and the Act/365 time function (`types::time`)
//! - Error types: `DateError`, `InterpolationError` (`types::error`)
//! - Grid bracketing for piecewise linear interpolation (`math::interpolators`)
//! - Date-indexed series, forward curves and interest-rate curves (`market_data`)
//!
//! ## Zero Dependency Principle
//!
//! Layer 1 has no dependencies on other storage_* crates, with minimal external dependencies:
//! - num-traits: Traits for generic numerical computation
//! - chrono: Date arithmetic
//! - thiserror: Error derivation
//! - serde: Serialisation support (optional)
//!
//! ## Usage Examples
//!
//! ```rust
//! use storage_core::market_data::{ForwardCurve, InterestRateCurve};
//! use storage_core::types::{act_365, Date};
//!
//! let val_date = Date::from_ymd(2020, 8, 5).unwrap();
//! let end = Date::from_ymd(2021, 8, 5).unwrap();
//! assert_eq!(act_365(val_date, end), 1.0);
//!
//! let rates = InterestRateCurve::flat(0.05);
//! let df = rates.discount_factor(val_date, end).unwrap();
//! assert!((df - (-0.05_f64).exp()).abs() < 1e-12);
//!
//! let fwd = ForwardCurve::from_points(vec![(val_date, 56.85), (end, 59.08)]).unwrap();
//! assert_eq!(fwd.price(val_date.add_days(10)).unwrap(), 56.85);
//! ```
//!
//! ## Feature Flags
//!
//! - `serde` (default): Enable serialisation for Date, DayCountConvention and series

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(rustdoc::private_intra_doc_links)]

pub mod market_data;
pub mod math;
pub mod types;
