//! Curve abstractions consumed by the storage valuation engine.
//!
//! This module provides:
//! - [`ForwardCurve`]: Commodity forward prices indexed by delivery date
//! - [`InterestRateCurve`]: Continuously compounded rates for discounting cash flows

mod forward;
mod rates;

pub use forward::ForwardCurve;
pub use rates::InterestRateCurve;
