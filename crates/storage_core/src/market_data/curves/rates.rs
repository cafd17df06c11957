//! Interest-rate curve used for discounting storage cash flows.

use crate::market_data::error::MarketDataError;
use crate::market_data::series::{Lookup, TimeSeries};
use crate::types::{act_365, Date};

/// Continuously compounded Act/365 rates.
///
/// The discount factor from `from` to `to` is `exp(-r(to) * act365(from, to))`,
/// where `r` is either a constant or linearly interpolated between dated
/// pillars (held flat beyond the first and last pillar).
///
/// # Example
///
/// ```
/// use storage_core::market_data::InterestRateCurve;
/// use storage_core::types::Date;
///
/// let curve = InterestRateCurve::flat(0.03);
/// let from = Date::from_ymd(2019, 12, 1).unwrap();
/// let to = Date::from_ymd(2020, 12, 1).unwrap();
///
/// let df = curve.discount_factor(from, to).unwrap();
/// assert!((df - (-0.03 * 366.0 / 365.0_f64).exp()).abs() < 1e-14);
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum InterestRateCurve {
    /// The same rate for every maturity.
    Flat(f64),
    /// Rates at dated pillars.
    Pillars(TimeSeries),
}

impl InterestRateCurve {
    /// Constant rate curve.
    pub fn flat(rate: f64) -> Self {
        InterestRateCurve::Flat(rate)
    }

    /// Curve from `(date, rate)` pillars in increasing date order.
    pub fn from_pillars(points: Vec<(Date, f64)>) -> Result<Self, MarketDataError> {
        Ok(InterestRateCurve::Pillars(TimeSeries::new(points)?))
    }

    /// Zero rate applying to cash paid on `date`.
    pub fn rate(&self, date: Date) -> Result<f64, MarketDataError> {
        match self {
            InterestRateCurve::Flat(r) => Ok(*r),
            InterestRateCurve::Pillars(series) => series.value(date, Lookup::Linear),
        }
    }

    /// Discount factor for cash paid on `to` viewed from `from`.
    ///
    /// Returns exactly 1.0 when `to <= from`; cash already paid is not compounded.
    pub fn discount_factor(&self, from: Date, to: Date) -> Result<f64, MarketDataError> {
        if to <= from {
            return Ok(1.0);
        }
        let r = self.rate(to)?;
        Ok((-r * act_365(from, to)).exp())
    }
}
