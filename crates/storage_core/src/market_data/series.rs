//! Date-indexed numeric series.
//!
//! [`TimeSeries`] is the common representation for every externally built
//! input the valuation consumes: forward prices, interest rates, and
//! inventory bound overrides.

use super::error::MarketDataError;
use crate::types::{act_365, Date};

/// How a [`TimeSeries`] answers a query for a date between its points.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum Lookup {
    /// Only dates present in the series are valid.
    Exact,
    /// The value of the latest point on or before the query date.
    #[default]
    Step,
    /// Linear in Act/365 time between the surrounding points, flat outside.
    Linear,
}

/// Strictly increasing sequence of `(Date, f64)` points.
///
/// # Examples
///
/// ```
/// use storage_core::market_data::{Lookup, TimeSeries};
/// use storage_core::types::Date;
///
/// let d = |m| Date::from_ymd(2020, m, 1).unwrap();
/// let series = TimeSeries::new(vec![(d(1), 10.0), (d(3), 30.0)]).unwrap();
///
/// assert_eq!(series.value(d(2), Lookup::Step).unwrap(), 10.0);
/// assert!(series.value(d(2), Lookup::Exact).is_err());
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TimeSeries {
    dates: Vec<Date>,
    values: Vec<f64>,
}

impl TimeSeries {
    /// Build a series from points that must already be in strictly increasing date order.
    ///
    /// # Errors
    ///
    /// `MarketDataError::Empty` for no points, `MarketDataError::UnsortedDates`
    /// if dates repeat or go backwards, `MarketDataError::InvalidValue` for
    /// non-finite values.
    pub fn new(points: Vec<(Date, f64)>) -> Result<Self, MarketDataError> {
        if points.is_empty() {
            return Err(MarketDataError::Empty);
        }
        for (index, window) in points.windows(2).enumerate() {
            if window[1].0 <= window[0].0 {
                return Err(MarketDataError::UnsortedDates {
                    date: window[1].0,
                    index: index + 1,
                });
            }
        }
        if let Some(&(date, value)) = points.iter().find(|(_, v)| !v.is_finite()) {
            return Err(MarketDataError::InvalidValue {
                date,
                value,
                reason: "values must be finite",
            });
        }
        let (dates, values) = points.into_iter().unzip();
        Ok(Self { dates, values })
    }

    /// Build a series with one value per day starting at `start`.
    pub fn daily(start: Date, values: Vec<f64>) -> Result<Self, MarketDataError> {
        let points = values
            .into_iter()
            .enumerate()
            .map(|(i, v)| (start.add_days(i as i64), v))
            .collect();
        Self::new(points)
    }

    /// First date in the series.
    pub fn start(&self) -> Date {
        self.dates[0]
    }

    /// Last date in the series.
    pub fn end(&self) -> Date {
        self.dates[self.dates.len() - 1]
    }

    /// Number of points.
    pub fn len(&self) -> usize {
        self.dates.len()
    }

    /// Always false for a constructed series.
    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    /// Iterate over the points in date order.
    pub fn iter(&self) -> impl Iterator<Item = (Date, f64)> + '_ {
        self.dates.iter().copied().zip(self.values.iter().copied())
    }

    /// Look up the value for `date` using the given rule.
    ///
    /// # Errors
    ///
    /// `MarketDataError::MissingDate` when the date is absent for
    /// [`Lookup::Exact`] or precedes the first point for [`Lookup::Step`].
    pub fn value(&self, date: Date, lookup: Lookup) -> Result<f64, MarketDataError> {
        let pos = self.dates.partition_point(|&d| d <= date);
        match lookup {
            Lookup::Exact => match self.dates.binary_search(&date) {
                Ok(i) => Ok(self.values[i]),
                Err(_) => Err(MarketDataError::MissingDate { date }),
            },
            Lookup::Step => {
                if pos == 0 {
                    Err(MarketDataError::MissingDate { date })
                } else {
                    Ok(self.values[pos - 1])
                }
            }
            Lookup::Linear => {
                if pos == 0 {
                    return Ok(self.values[0]);
                }
                if pos == self.dates.len() {
                    return Ok(self.values[pos - 1]);
                }
                let (d0, d1) = (self.dates[pos - 1], self.dates[pos]);
                let (v0, v1) = (self.values[pos - 1], self.values[pos]);
                let w = act_365(d0, date) / act_365(d0, d1);
                Ok(v0 + (v1 - v0) * w)
            }
        }
    }

    /// Smallest value in the series.
    pub fn min_value(&self) -> f64 {
        self.values.iter().copied().fold(f64::INFINITY, f64::min)
    }
}
