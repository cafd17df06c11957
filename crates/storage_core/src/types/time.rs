//! Time types and day count conventions for storage valuation.
//!
//! This module provides:
//! - `Date`: Type-safe date wrapper around chrono::NaiveDate
//! - `DayCountConvention`: Year fraction conventions used for discounting and simulation
//! - [`act_365`]: The default time function between two dates
//!
//! # Examples
//!
//! ```
//! use storage_core::types::time::{Date, DayCountConvention};
//!
//! let start = Date::from_ymd(2020, 8, 5).unwrap();
//! let end = Date::from_ymd(2020, 8, 8).unwrap();
//!
//! let yf = DayCountConvention::ActualActual365.year_fraction_dates(start, end);
//! assert_eq!(yf, 3.0 / 365.0);
//! ```

use chrono::{Datelike, Days, Months, NaiveDate};
use std::fmt;
use std::ops::Sub;
use std::str::FromStr;

use super::error::DateError;

/// Type-safe date wrapper around chrono::NaiveDate.
///
/// Storage decisions, forward deliveries and cash settlements are all
/// expressed at daily granularity, so a calendar date is the only time
/// type the engine needs.
///
/// # Examples
///
/// ```
/// use storage_core::types::time::Date;
///
/// let date = Date::from_ymd(2019, 12, 1).unwrap();
/// assert_eq!(date.add_days(31), Date::from_ymd(2020, 1, 1).unwrap());
///
/// let parsed: Date = "2019-12-01".parse().unwrap();
/// assert_eq!(date, parsed);
///
/// let end = Date::from_ymd(2020, 4, 1).unwrap();
/// assert_eq!(end - date, 122);
/// ```
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct Date(NaiveDate);

impl Date {
    /// Creates a Date from year, month, and day components.
    ///
    /// # Returns
    /// `Ok(Date)` if the date is valid, `Err(DateError::InvalidDate)` otherwise.
    ///
    /// # Examples
    ///
    /// ```
    /// use storage_core::types::time::Date;
    ///
    /// assert!(Date::from_ymd(2020, 2, 29).is_ok());
    /// assert!(Date::from_ymd(2021, 2, 29).is_err());
    /// ```
    pub fn from_ymd(year: i32, month: u32, day: u32) -> Result<Self, DateError> {
        NaiveDate::from_ymd_opt(year, month, day)
            .map(Date)
            .ok_or(DateError::InvalidDate { year, month, day })
    }

    /// Parses a date from ISO 8601 format string (YYYY-MM-DD).
    ///
    /// # Examples
    ///
    /// ```
    /// use storage_core::types::time::Date;
    ///
    /// assert_eq!(Date::parse("2021-04-25").unwrap().day(), 25);
    /// assert!(Date::parse("25/04/2021").is_err());
    /// ```
    pub fn parse(s: &str) -> Result<Self, DateError> {
        NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
            .map(Date)
            .map_err(|e| DateError::ParseError(format!("'{}': {}", s, e)))
    }

    /// Returns the underlying NaiveDate.
    pub fn into_inner(self) -> NaiveDate {
        self.0
    }

    /// Returns the year component.
    pub fn year(&self) -> i32 {
        self.0.year()
    }

    /// Returns the month component (1-12).
    pub fn month(&self) -> u32 {
        self.0.month()
    }

    /// Returns the day component (1-31).
    pub fn day(&self) -> u32 {
        self.0.day()
    }

    /// Returns the ordinal day of the year (1-366).
    pub fn day_of_year(&self) -> u32 {
        self.0.ordinal()
    }

    /// Returns the number of days since the preceding Monday (0 for Monday).
    pub fn days_from_monday(&self) -> u32 {
        self.0.weekday().num_days_from_monday()
    }

    /// Returns the date offset by a signed number of days.
    ///
    /// Dates beyond chrono's representable range saturate at the range limits.
    pub fn add_days(self, days: i64) -> Self {
        let shifted = if days >= 0 {
            self.0.checked_add_days(Days::new(days.unsigned_abs()))
        } else {
            self.0.checked_sub_days(Days::new(days.unsigned_abs()))
        };
        Date(shifted.unwrap_or(if days >= 0 {
            NaiveDate::MAX
        } else {
            NaiveDate::MIN
        }))
    }

    /// Returns the date offset by a whole number of months, clamping the day
    /// to the end of the target month where necessary.
    ///
    /// # Examples
    ///
    /// ```
    /// use storage_core::types::time::Date;
    ///
    /// let jan_31 = Date::from_ymd(2020, 1, 31).unwrap();
    /// assert_eq!(jan_31.add_months(1), Date::from_ymd(2020, 2, 29).unwrap());
    /// ```
    pub fn add_months(self, months: u32) -> Self {
        Date(
            self.0
                .checked_add_months(Months::new(months))
                .unwrap_or(NaiveDate::MAX),
        )
    }

    /// Returns the first day of this date's month.
    pub fn first_of_month(self) -> Self {
        Date(self.0.with_day(1).unwrap_or(self.0))
    }

    /// Returns the last day of this date's month.
    ///
    /// # Examples
    ///
    /// ```
    /// use storage_core::types::time::Date;
    ///
    /// let date = Date::from_ymd(2021, 4, 25).unwrap();
    /// assert_eq!(date.last_of_month(), Date::from_ymd(2021, 4, 30).unwrap());
    /// ```
    pub fn last_of_month(self) -> Self {
        self.first_of_month().add_months(1).add_days(-1)
    }
}

impl Sub for Date {
    type Output = i64;

    /// Returns the number of days between two dates.
    ///
    /// The result is positive if `self` is after `other`, negative otherwise.
    fn sub(self, other: Self) -> i64 {
        (self.0 - other.0).num_days()
    }
}

impl From<NaiveDate> for Date {
    fn from(date: NaiveDate) -> Self {
        Date(date)
    }
}

impl FromStr for Date {
    type Err = DateError;

    /// Parses a date from ISO 8601 format string (YYYY-MM-DD).
    fn from_str(s: &str) -> Result<Self, DateError> {
        Date::parse(s)
    }
}

impl fmt::Display for Date {
    /// Formats the date as ISO 8601 (YYYY-MM-DD).
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format("%Y-%m-%d"))
    }
}

/// Day Count Convention (year fraction convention).
///
/// # Variants
/// - `ActualActual365`: Actual days / 365 (the engine default)
/// - `ActualActual360`: Actual days / 360
#[non_exhaustive]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum DayCountConvention {
    /// Actual/365 Fixed: actual_days / 365.0
    #[default]
    ActualActual365,

    /// Actual/360: actual_days / 360.0
    ActualActual360,
}

impl DayCountConvention {
    /// Returns the standard convention name.
    ///
    /// # Examples
    ///
    /// ```
    /// use storage_core::types::time::DayCountConvention;
    ///
    /// assert_eq!(DayCountConvention::ActualActual365.name(), "ACT/365");
    /// assert_eq!(DayCountConvention::ActualActual360.name(), "ACT/360");
    /// ```
    pub fn name(&self) -> &'static str {
        match self {
            DayCountConvention::ActualActual365 => "ACT/365",
            DayCountConvention::ActualActual360 => "ACT/360",
        }
    }

    /// Calculates the signed year fraction between two dates.
    ///
    /// Returns a negative value when `start > end`.
    pub fn year_fraction_dates(&self, start: Date, end: Date) -> f64 {
        let days = (end - start) as f64;
        match self {
            DayCountConvention::ActualActual365 => days / 365.0,
            DayCountConvention::ActualActual360 => days / 360.0,
        }
    }
}

impl FromStr for DayCountConvention {
    type Err = String;

    /// Parses day count convention from string (case-insensitive).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().replace(['/', ' '], "").as_str() {
            "ACT365" | "ACTUAL365" | "A365" => Ok(DayCountConvention::ActualActual365),
            "ACT360" | "ACTUAL360" | "A360" => Ok(DayCountConvention::ActualActual360),
            _ => Err(format!("Unknown day count convention: {}", s)),
        }
    }
}

impl fmt::Display for DayCountConvention {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

#[cfg(feature = "serde")]
mod serde_impl {
    use super::DayCountConvention;
    use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
    use std::str::FromStr;

    impl Serialize for DayCountConvention {
        fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
        where
            S: Serializer,
        {
            serializer.serialize_str(self.name())
        }
    }

    impl<'de> Deserialize<'de> for DayCountConvention {
        fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
        where
            D: Deserializer<'de>,
        {
            let s = String::deserialize(deserializer)?;
            DayCountConvention::from_str(&s).map_err(de::Error::custom)
        }
    }
}

/// Act/365 time function: signed years between two dates.
///
/// This is the time measure used by the multi-factor model, the spot
/// simulator and continuous-compounding discounting unless another
/// convention is plugged in.
///
/// # Examples
///
/// ```
/// use storage_core::types::time::{act_365, Date};
///
/// let start = Date::from_ymd(2020, 8, 5).unwrap();
/// let end = Date::from_ymd(2021, 8, 5).unwrap();
/// assert_eq!(act_365(start, end), 1.0);
/// ```
pub fn act_365(start: Date, end: Date) -> f64 {
    DayCountConvention::ActualActual365.year_fraction_dates(start, end)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn d(y: i32, m: u32, day: u32) -> Date {
        Date::from_ymd(y, m, day).unwrap()
    }

    #[test]
    fn test_act_365_one_year_returns_one() {
        assert_eq!(act_365(d(2020, 8, 5), d(2021, 8, 5)), 1.0);
    }

    #[test]
    fn test_act_365_three_days() {
        assert_eq!(act_365(d(2020, 8, 5), d(2020, 8, 8)), 3.0 / 365.0);
    }

    #[test]
    fn test_act_365_reversed_is_negative() {
        assert_relative_eq!(
            act_365(d(2020, 8, 8), d(2020, 8, 5)),
            -3.0 / 365.0,
            epsilon = 1e-15
        );
    }

    #[test]
    fn test_act_360() {
        let yf = DayCountConvention::ActualActual360.year_fraction_dates(d(2024, 1, 1), d(2024, 7, 1));
        assert_relative_eq!(yf, 182.0 / 360.0, epsilon = 1e-12);
    }

    #[test]
    fn test_add_days_crosses_year() {
        assert_eq!(d(2019, 12, 31).add_days(1), d(2020, 1, 1));
        assert_eq!(d(2020, 1, 1).add_days(-1), d(2019, 12, 31));
    }

    #[test]
    fn test_month_helpers() {
        let date = d(2020, 2, 17);
        assert_eq!(date.first_of_month(), d(2020, 2, 1));
        assert_eq!(date.last_of_month(), d(2020, 2, 29));
        assert_eq!(date.add_months(2), d(2020, 4, 17));
    }

    #[test]
    fn test_day_of_year() {
        assert_eq!(d(2021, 1, 1).day_of_year(), 1);
        assert_eq!(d(2020, 12, 31).day_of_year(), 366);
    }

    #[test]
    fn test_parse_and_display_round_trip() {
        let date = Date::parse("2019-08-29").unwrap();
        assert_eq!(date.to_string(), "2019-08-29");
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(matches!(
            Date::parse("not-a-date"),
            Err(DateError::ParseError(_))
        ));
    }

    #[test]
    fn test_day_count_from_str_aliases() {
        assert_eq!(
            "Act/365".parse::<DayCountConvention>().unwrap(),
            DayCountConvention::ActualActual365
        );
        assert_eq!(
            "a360".parse::<DayCountConvention>().unwrap(),
            DayCountConvention::ActualActual360
        );
        assert!("30/360".parse::<DayCountConvention>().is_err());
    }
}
