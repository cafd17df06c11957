//! Decision frequency of a storage facility.

use std::fmt;
use std::str::FromStr;

use storage_core::types::Date;

/// Granularity at which injection and withdrawal decisions are made.
///
/// Each period starts on a well-defined date: every day, every Monday, the
/// first of each month, or the first of January, April, July and October.
///
/// # Examples
///
/// ```
/// use storage_core::types::Date;
/// use storage_models::schedules::Frequency;
///
/// let date = Date::from_ymd(2020, 2, 17).unwrap();
/// assert_eq!(Frequency::Monthly.period_start(date), Date::from_ymd(2020, 2, 1).unwrap());
/// assert_eq!(Frequency::Quarterly.next_period_start(date), Date::from_ymd(2020, 4, 1).unwrap());
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum Frequency {
    /// One decision per day.
    #[default]
    Daily,
    /// One decision per week, periods starting on Monday.
    Weekly,
    /// One decision per calendar month.
    Monthly,
    /// One decision per calendar quarter.
    Quarterly,
}

impl Frequency {
    /// Start of the period containing `date`.
    pub fn period_start(&self, date: Date) -> Date {
        match self {
            Frequency::Daily => date,
            Frequency::Weekly => date.add_days(-i64::from(date.days_from_monday())),
            Frequency::Monthly => date.first_of_month(),
            Frequency::Quarterly => {
                let month = date.month() - (date.month() - 1) % 3;
                Date::from_ymd(date.year(), month, 1).unwrap_or_else(|_| date.first_of_month())
            }
        }
    }

    /// Start of the period following the one containing `date`.
    pub fn next_period_start(&self, date: Date) -> Date {
        let start = self.period_start(date);
        match self {
            Frequency::Daily => start.add_days(1),
            Frequency::Weekly => start.add_days(7),
            Frequency::Monthly => start.add_months(1),
            Frequency::Quarterly => start.add_months(3),
        }
    }

    /// Period start dates falling in `[from, to)`.
    ///
    /// # Examples
    ///
    /// ```
    /// use storage_core::types::Date;
    /// use storage_models::schedules::Frequency;
    ///
    /// let from = Date::from_ymd(2019, 12, 15).unwrap();
    /// let to = Date::from_ymd(2020, 4, 1).unwrap();
    /// let dates = Frequency::Monthly.period_starts(from, to);
    /// assert_eq!(dates.len(), 3);
    /// assert_eq!(dates[0], Date::from_ymd(2020, 1, 1).unwrap());
    /// ```
    pub fn period_starts(&self, from: Date, to: Date) -> Vec<Date> {
        let mut dates = Vec::new();
        let mut current = self.period_start(from);
        if current < from {
            current = self.next_period_start(current);
        }
        while current < to {
            dates.push(current);
            current = self.next_period_start(current);
        }
        dates
    }

    /// Returns the standard name for this frequency.
    #[inline]
    pub fn name(&self) -> &'static str {
        match self {
            Frequency::Daily => "Daily",
            Frequency::Weekly => "Weekly",
            Frequency::Monthly => "Monthly",
            Frequency::Quarterly => "Quarterly",
        }
    }
}

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for Frequency {
    type Err = String;

    /// Parses a frequency name (case-insensitive).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "daily" | "day" | "d" => Ok(Frequency::Daily),
            "weekly" | "week" | "w" => Ok(Frequency::Weekly),
            "monthly" | "month" | "m" => Ok(Frequency::Monthly),
            "quarterly" | "quarter" | "q" => Ok(Frequency::Quarterly),
            _ => Err(format!("Unknown frequency: {}", s)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> Date {
        Date::from_ymd(y, m, day).unwrap()
    }

    #[test]
    fn test_daily_period_starts() {
        let dates = Frequency::Daily.period_starts(d(2020, 2, 27), d(2020, 3, 2));
        assert_eq!(dates, vec![d(2020, 2, 27), d(2020, 2, 28), d(2020, 2, 29), d(2020, 3, 1)]);
    }

    #[test]
    fn test_weekly_starts_on_monday() {
        // 2020-01-15 is a Wednesday.
        assert_eq!(Frequency::Weekly.period_start(d(2020, 1, 15)), d(2020, 1, 13));
        assert_eq!(Frequency::Weekly.period_start(d(2020, 1, 13)), d(2020, 1, 13));
        assert_eq!(Frequency::Weekly.period_start(d(2020, 1, 19)), d(2020, 1, 13));
    }

    #[test]
    fn test_quarterly_period_start() {
        assert_eq!(Frequency::Quarterly.period_start(d(2020, 6, 30)), d(2020, 4, 1));
        assert_eq!(Frequency::Quarterly.period_start(d(2020, 1, 1)), d(2020, 1, 1));
        assert_eq!(Frequency::Quarterly.next_period_start(d(2020, 11, 5)), d(2021, 1, 1));
    }

    #[test]
    fn test_monthly_period_starts_end_exclusive() {
        let dates = Frequency::Monthly.period_starts(d(2019, 12, 1), d(2020, 4, 1));
        assert_eq!(dates, vec![d(2019, 12, 1), d(2020, 1, 1), d(2020, 2, 1), d(2020, 3, 1)]);
    }

    #[test]
    fn test_from_str() {
        assert_eq!("Monthly".parse::<Frequency>().unwrap(), Frequency::Monthly);
        assert_eq!("d".parse::<Frequency>().unwrap(), Frequency::Daily);
        assert!("hourly".parse::<Frequency>().is_err());
    }
}
