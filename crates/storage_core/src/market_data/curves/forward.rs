//! Commodity forward curve.

use crate::market_data::error::MarketDataError;
use crate::market_data::series::{Lookup, TimeSeries};
use crate::types::Date;

/// Forward prices indexed by delivery date.
///
/// Prices apply from their date until the next point (step lookup), so a
/// monthly curve can be given as one point per contract month. Every price
/// must be strictly positive since the simulator works in log space.
///
/// # Example
///
/// ```
/// use storage_core::market_data::ForwardCurve;
/// use storage_core::types::Date;
///
/// let dec = Date::from_ymd(2019, 12, 1).unwrap();
/// let jan = Date::from_ymd(2020, 1, 1).unwrap();
/// let curve = ForwardCurve::from_points(vec![(dec, 18.5), (jan, 19.2)]).unwrap();
///
/// assert_eq!(curve.price(Date::from_ymd(2019, 12, 17).unwrap()).unwrap(), 18.5);
/// assert_eq!(curve.price(jan).unwrap(), 19.2);
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "TimeSeries", into = "TimeSeries"))]
pub struct ForwardCurve {
    series: TimeSeries,
}

impl ForwardCurve {
    /// Build a curve from `(delivery date, price)` points in increasing date order.
    pub fn from_points(points: Vec<(Date, f64)>) -> Result<Self, MarketDataError> {
        TimeSeries::new(points)?.try_into()
    }

    /// Build a curve with one price per day starting at `start`.
    pub fn daily(start: Date, prices: Vec<f64>) -> Result<Self, MarketDataError> {
        TimeSeries::daily(start, prices)?.try_into()
    }

    /// Flat curve with a single price from `start` onwards.
    pub fn flat(start: Date, price: f64) -> Result<Self, MarketDataError> {
        Self::from_points(vec![(start, price)])
    }

    /// Forward price for delivery on `date`.
    ///
    /// # Errors
    ///
    /// `MarketDataError::MissingDate` if `date` precedes the first point.
    pub fn price(&self, date: Date) -> Result<f64, MarketDataError> {
        self.series.value(date, Lookup::Step)
    }

    /// First delivery date covered.
    pub fn start(&self) -> Date {
        self.series.start()
    }

    /// Underlying series.
    pub fn series(&self) -> &TimeSeries {
        &self.series
    }
}

impl TryFrom<TimeSeries> for ForwardCurve {
    type Error = MarketDataError;

    fn try_from(series: TimeSeries) -> Result<Self, Self::Error> {
        if let Some((date, value)) = series.iter().find(|&(_, p)| p <= 0.0) {
            return Err(MarketDataError::InvalidValue {
                date,
                value,
                reason: "forward prices must be positive",
            });
        }
        Ok(Self { series })
    }
}

impl From<ForwardCurve> for TimeSeries {
    fn from(curve: ForwardCurve) -> Self {
        curve.series
    }
}
