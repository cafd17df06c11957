//! Market data structures for commodity storage valuation.
//!
//! All market inputs are plain date-indexed series built outside the engine.
//!
//! # Components
//!
//! - [`series`]: Strictly increasing date-indexed series with exact, step or linear lookup
//! - [`curves`]: Forward price curve and interest-rate curve
//! - [`error`]: Market data error types (MarketDataError)
//!
//! # Example
//!
//! ```
//! use storage_core::market_data::{ForwardCurve, InterestRateCurve};
//! use storage_core::types::Date;
//!
//! let start = Date::from_ymd(2019, 12, 1).unwrap();
//! let curve = ForwardCurve::daily(start, vec![20.0; 31]).unwrap();
//! assert_eq!(curve.price(start.add_days(30)).unwrap(), 20.0);
//!
//! let rates = InterestRateCurve::flat(0.03);
//! assert_eq!(rates.discount_factor(start, start).unwrap(), 1.0);
//! ```

pub mod curves;
pub mod error;
pub mod series;

pub use curves::{ForwardCurve, InterestRateCurve};
pub use error::MarketDataError;
pub use series::{Lookup, TimeSeries};
