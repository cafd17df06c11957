//! Cash settlement date rules.

use storage_core::types::Date;

/// Maps a delivery (decision) date to the date its commodity cash flow is paid.
///
/// Any `Fn(Date) -> Date + Send + Sync` closure is a settlement rule.
///
/// # Example
///
/// ```
/// use storage_core::types::Date;
/// use storage_pricing::{DaysAfterMonthEnd, SameDay, SettlementRule};
///
/// let delivery = Date::from_ymd(2021, 4, 25).unwrap();
/// assert_eq!(SameDay.settlement_date(delivery), delivery);
/// assert_eq!(
///     DaysAfterMonthEnd(20).settlement_date(delivery),
///     Date::from_ymd(2021, 5, 20).unwrap()
/// );
///
/// let next_day = |d: Date| d.add_days(1);
/// assert_eq!(next_day.settlement_date(delivery), delivery.add_days(1));
/// ```
pub trait SettlementRule: Send + Sync {
    /// Cash settlement date for delivery on `delivery`.
    fn settlement_date(&self, delivery: Date) -> Date;
}

impl<F> SettlementRule for F
where
    F: Fn(Date) -> Date + Send + Sync,
{
    fn settlement_date(&self, delivery: Date) -> Date {
        self(delivery)
    }
}

/// Settle on the delivery date.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SameDay;

impl SettlementRule for SameDay {
    fn settlement_date(&self, delivery: Date) -> Date {
        delivery
    }
}

/// Settle a number of days after the end of the delivery month.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DaysAfterMonthEnd(pub i64);

impl SettlementRule for DaysAfterMonthEnd {
    fn settlement_date(&self, delivery: Date) -> Date {
        delivery.last_of_month().add_days(self.0)
    }
}
