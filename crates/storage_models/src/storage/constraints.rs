//! Per-date constraint queries on a storage facility.

use storage_core::market_data::Lookup;
use storage_core::types::Date;

use super::ratchet::{InjectWithdrawRange, Ratchet};
use super::specification::StorageSpecification;
use crate::error::StorageError;

/// Constraints faced by a decision taken on one date at one inventory.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PeriodConstraints {
    /// Lowest inventory reachable at the next decision date.
    pub min_next_inventory: f64,
    /// Highest inventory reachable at the next decision date.
    pub max_next_inventory: f64,
    /// Maximum injection this period.
    pub max_injection_rate: f64,
    /// Maximum withdrawal this period.
    pub max_withdrawal_rate: f64,
}

impl StorageSpecification {
    /// Ratchet in force on `date`.
    pub fn ratchet_at(&self, date: Date) -> Result<&Ratchet, StorageError> {
        self.schedule
            .ratchet_at(date)
            .ok_or_else(|| StorageError::config(format!("no ratchet is effective on {}", date)))
    }

    /// Facility `(min, max)` inventory on `date`.
    ///
    /// On or after the end date a must-be-empty facility is bounded to `(0, 0)`.
    pub fn inventory_bounds(&self, date: Date) -> Result<(f64, f64), StorageError> {
        if date >= self.end && self.must_be_empty() {
            return Ok((0.0, 0.0));
        }
        let ratchet = self.ratchet_at(date)?;
        let min = match &self.min_inventory {
            Some(series) => series.value(date, Lookup::Step)?,
            None => ratchet.min_inventory(),
        };
        let max = match &self.max_inventory {
            Some(series) => series.value(date, Lookup::Step)?,
            None => ratchet.max_inventory(),
        };
        Ok((min, max))
    }

    /// Net volume range available on `date` starting from `inventory`,
    /// after any maintenance scaling.
    pub fn inject_withdraw_range(&self, date: Date, inventory: f64) -> Result<InjectWithdrawRange, StorageError> {
        let range = self.ratchet_at(date)?.range_at(inventory);
        Ok(self.apply_maintenance(date, range))
    }

    /// As [`inject_withdraw_range`](Self::inject_withdraw_range) but using the
    /// segment below a step breakpoint.
    pub fn inject_withdraw_range_below(&self, date: Date, inventory: f64) -> Result<InjectWithdrawRange, StorageError> {
        let range = self.ratchet_at(date)?.range_below(inventory);
        Ok(self.apply_maintenance(date, range))
    }

    fn apply_maintenance(&self, date: Date, range: InjectWithdrawRange) -> InjectWithdrawRange {
        self.maintenance
            .iter()
            .filter(|o| o.covers(date))
            .fold(range, |r, o| r.scaled(o.withdrawal_scale, o.injection_scale))
    }

    /// Decision date following `date`, capped at the end date.
    pub fn next_decision_date(&self, date: Date) -> Date {
        self.frequency.next_period_start(date).min(self.end)
    }

    /// Decision dates in `[from, end)`, restricted to the storage's active window.
    pub fn decision_dates(&self, from: Date) -> Vec<Date> {
        self.frequency.period_starts(from.max(self.start), self.end)
    }

    /// Inventory after the per-period loss.
    pub fn after_loss(&self, inventory: f64) -> f64 {
        inventory * (1.0 - self.inventory_loss)
    }

    /// Constraints on a decision taken on `date` with `inventory` in store,
    /// clipped by the facility bounds at the next decision date.
    ///
    /// # Example
    ///
    /// ```
    /// use storage_core::types::Date;
    /// use storage_models::schedules::Frequency;
    /// use storage_models::storage::StorageSpecification;
    ///
    /// let start = Date::from_ymd(2020, 1, 1).unwrap();
    /// let storage = StorageSpecification::builder(Frequency::Daily, start, start.add_days(30))
    ///     .simple_constraints(0.0, 100.0, 20.0, 15.0)
    ///     .build()
    ///     .unwrap();
    ///
    /// let c = storage.constraints_at(start, 90.0).unwrap();
    /// assert_eq!(c.max_next_inventory, 100.0);
    /// assert_eq!(c.min_next_inventory, 75.0);
    /// ```
    pub fn constraints_at(&self, date: Date, inventory: f64) -> Result<PeriodConstraints, StorageError> {
        let range = self.inject_withdraw_range(date, inventory)?;
        let next = self.next_decision_date(date);
        let (min_bound, max_bound) = self.inventory_bounds(next)?;
        let carried = self.after_loss(inventory);
        Ok(PeriodConstraints {
            min_next_inventory: (carried + range.min_rate).max(min_bound),
            max_next_inventory: (carried + range.max_rate).min(max_bound),
            max_injection_rate: range.max_rate,
            max_withdrawal_rate: -range.min_rate,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schedules::Frequency;
    use crate::storage::{ConstraintSchedule, MaintenanceOutage, RatchetInterp, TerminalCondition};
    use approx::assert_relative_eq;

    fn d(y: i32, m: u32, day: u32) -> Date {
        Date::from_ymd(y, m, day).unwrap()
    }

    fn ratchet_storage(interp: RatchetInterp) -> StorageSpecification {
        let schedule = ConstraintSchedule::builder()
            .entry(d(2020, 1, 1))
            .point(0.0, 150.0, 250.0)
            .point(2_000.0, 200.0, 210.0)
            .point(5_000.0, 260.0, 135.0)
            .build(interp)
            .unwrap();
        StorageSpecification::builder(Frequency::Daily, d(2020, 1, 1), d(2020, 2, 1))
            .ratchets(schedule)
            .maintenance(MaintenanceOutage {
                start: d(2020, 1, 10),
                end: d(2020, 1, 12),
                injection_scale: 0.5,
                withdrawal_scale: 0.0,
            })
            .build()
            .unwrap()
    }

    #[test]
    fn test_bounds_from_ratchet_breakpoints() {
        let storage = ratchet_storage(RatchetInterp::Step);
        assert_eq!(storage.inventory_bounds(d(2020, 1, 15)).unwrap(), (0.0, 5_000.0));
        assert_eq!(storage.inventory_bounds(d(2020, 2, 1)).unwrap(), (0.0, 0.0));
    }

    #[test]
    fn test_terminal_value_keeps_bounds_at_end() {
        let schedule = ConstraintSchedule::builder()
            .entry(d(2020, 1, 1))
            .point(0.0, 10.0, 10.0)
            .point(100.0, 10.0, 10.0)
            .build(RatchetInterp::Step)
            .unwrap();
        let storage = StorageSpecification::builder(Frequency::Daily, d(2020, 1, 1), d(2020, 1, 10))
            .ratchets(schedule)
            .terminal(TerminalCondition::value(|spot, inv| spot * inv))
            .build()
            .unwrap();
        assert_eq!(storage.inventory_bounds(d(2020, 1, 10)).unwrap(), (0.0, 100.0));
    }

    #[test]
    fn test_linear_rates_and_clipping() {
        let storage = ratchet_storage(RatchetInterp::Linear);
        let c = storage.constraints_at(d(2020, 1, 2), 4_900.0).unwrap();
        assert_relative_eq!(c.max_injection_rate, 137.5, epsilon = 1e-9);
        assert_eq!(c.max_next_inventory, 5_000.0);
        assert_relative_eq!(c.min_next_inventory, 4_900.0 - 258.0, epsilon = 1e-9);
    }

    #[test]
    fn test_maintenance_scales_rates() {
        let storage = ratchet_storage(RatchetInterp::Step);
        let c = storage.constraints_at(d(2020, 1, 10), 1_000.0).unwrap();
        assert_eq!(c.max_injection_rate, 125.0);
        assert_eq!(c.max_withdrawal_rate, 0.0);
        let after = storage.constraints_at(d(2020, 1, 12), 1_000.0).unwrap();
        assert_eq!(after.max_injection_rate, 250.0);
    }

    #[test]
    fn test_last_period_must_empty() {
        let storage = ratchet_storage(RatchetInterp::Step);
        let c = storage.constraints_at(d(2020, 1, 31), 100.0).unwrap();
        assert_eq!(c.max_next_inventory, 0.0);
        assert_eq!(c.min_next_inventory, 0.0);
    }

    #[test]
    fn test_decision_dates_cover_active_window() {
        let storage = ratchet_storage(RatchetInterp::Step);
        let dates = storage.decision_dates(d(2019, 12, 1));
        assert_eq!(dates.len(), 31);
        assert_eq!(dates[0], d(2020, 1, 1));
        assert_eq!(storage.next_decision_date(d(2020, 1, 31)), d(2020, 2, 1));
    }
}
