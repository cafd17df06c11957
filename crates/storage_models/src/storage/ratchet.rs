//! Inventory-dependent injection and withdrawal rate tables.
//!
//! A ratchet maps inventory level to the maximum withdrawal and injection
//! rates available that period. A [`ConstraintSchedule`] holds one ratchet per
//! effective date; each applies until the next entry's date.

use storage_core::types::Date;

use crate::error::StorageError;

/// How rates are read between two inventory breakpoints.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum RatchetInterp {
    /// Rates of the highest breakpoint at or below the inventory.
    #[default]
    Step,
    /// Linear between the two surrounding breakpoints.
    Linear,
}

/// One row of a ratchet table.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RatchetPoint {
    /// Inventory level of the breakpoint.
    pub inventory: f64,
    /// Maximum volume that can be withdrawn in one period (non-negative).
    pub max_withdrawal_rate: f64,
    /// Maximum volume that can be injected in one period (non-negative).
    pub max_injection_rate: f64,
}

impl RatchetPoint {
    /// Breakpoint at `inventory` with the given rates.
    pub fn new(inventory: f64, max_withdrawal_rate: f64, max_injection_rate: f64) -> Self {
        Self {
            inventory,
            max_withdrawal_rate,
            max_injection_rate,
        }
    }
}

/// Signed range of net volume change available in one period.
///
/// `min_rate` is minus the maximum withdrawal, `max_rate` the maximum injection.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InjectWithdrawRange {
    /// Lowest net change, `-max_withdrawal`.
    pub min_rate: f64,
    /// Highest net change, `max_injection`.
    pub max_rate: f64,
}

impl InjectWithdrawRange {
    /// Range with both ends multiplied by the given factors.
    pub fn scaled(self, withdrawal_scale: f64, injection_scale: f64) -> Self {
        Self {
            min_rate: self.min_rate * withdrawal_scale,
            max_rate: self.max_rate * injection_scale,
        }
    }
}

/// Inventory to rate table for a single effective date.
///
/// A one-point ratchet is a simple, inventory-independent constraint: its
/// rates apply at every inventory and the facility bounds must come from
/// explicit inventory series.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Ratchet {
    points: Vec<RatchetPoint>,
    interp: RatchetInterp,
}

impl Ratchet {
    /// Build a ratchet from breakpoints in strictly increasing inventory order.
    ///
    /// # Errors
    ///
    /// `StorageError::InvalidStorageConfiguration` for an empty table,
    /// unsorted inventories, or negative or non-finite values.
    pub fn new(points: Vec<RatchetPoint>, interp: RatchetInterp) -> Result<Self, StorageError> {
        if points.is_empty() {
            return Err(StorageError::config("ratchet must contain at least one breakpoint"));
        }
        for p in &points {
            let values = [p.inventory, p.max_withdrawal_rate, p.max_injection_rate];
            if values.iter().any(|v| !v.is_finite() || *v < 0.0) {
                return Err(StorageError::config(format!(
                    "ratchet values must be finite and non-negative: inventory {}, withdrawal {}, injection {}",
                    p.inventory, p.max_withdrawal_rate, p.max_injection_rate
                )));
            }
        }
        if let Some(w) = points.windows(2).find(|w| w[1].inventory <= w[0].inventory) {
            return Err(StorageError::config(format!(
                "ratchet inventories must be strictly increasing: {} followed by {}",
                w[0].inventory, w[1].inventory
            )));
        }
        Ok(Self { points, interp })
    }

    /// Inventory-independent rates.
    pub fn constant(max_withdrawal_rate: f64, max_injection_rate: f64) -> Result<Self, StorageError> {
        Self::new(
            vec![RatchetPoint::new(0.0, max_withdrawal_rate, max_injection_rate)],
            RatchetInterp::Step,
        )
    }

    /// Breakpoints in inventory order.
    pub fn points(&self) -> &[RatchetPoint] {
        &self.points
    }

    /// Interpolation mode.
    pub fn interp(&self) -> RatchetInterp {
        self.interp
    }

    /// True for a one-point, inventory-independent ratchet.
    pub fn is_simple(&self) -> bool {
        self.points.len() == 1
    }

    /// Lowest breakpoint inventory.
    pub fn min_inventory(&self) -> f64 {
        self.points[0].inventory
    }

    /// Highest breakpoint inventory.
    pub fn max_inventory(&self) -> f64 {
        self.points[self.points.len() - 1].inventory
    }

    /// Rates available at `inventory`; inventories outside the table take the
    /// nearest end's rates.
    pub fn range_at(&self, inventory: f64) -> InjectWithdrawRange {
        let n = self.points.len();
        let pos = self.points.partition_point(|p| p.inventory <= inventory);
        let point = match self.interp {
            _ if pos == 0 => self.points[0],
            _ if pos == n => self.points[n - 1],
            RatchetInterp::Step => self.points[pos - 1],
            RatchetInterp::Linear => {
                let (lo, hi) = (self.points[pos - 1], self.points[pos]);
                let w = (inventory - lo.inventory) / (hi.inventory - lo.inventory);
                RatchetPoint {
                    inventory,
                    max_withdrawal_rate: lo.max_withdrawal_rate
                        + w * (hi.max_withdrawal_rate - lo.max_withdrawal_rate),
                    max_injection_rate: lo.max_injection_rate
                        + w * (hi.max_injection_rate - lo.max_injection_rate),
                }
            }
        };
        InjectWithdrawRange {
            min_rate: -point.max_withdrawal_rate,
            max_rate: point.max_injection_rate,
        }
    }

    /// Rates of the segment just below `inventory`, which differ from
    /// [`Ratchet::range_at`] only on a step breakpoint.
    pub fn range_below(&self, inventory: f64) -> InjectWithdrawRange {
        match self.interp {
            RatchetInterp::Linear => self.range_at(inventory),
            RatchetInterp::Step => {
                let pos = self.points.partition_point(|p| p.inventory < inventory);
                let point = self.points[pos.saturating_sub(1)];
                InjectWithdrawRange {
                    min_rate: -point.max_withdrawal_rate,
                    max_rate: point.max_injection_rate,
                }
            }
        }
    }
}

/// Ratchet entries ordered by effective date.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ConstraintSchedule {
    entries: Vec<(Date, Ratchet)>,
}

impl ConstraintSchedule {
    /// Start building a schedule.
    ///
    /// # Example
    ///
    /// ```
    /// use storage_core::types::Date;
    /// use storage_models::storage::{ConstraintSchedule, RatchetInterp};
    ///
    /// let schedule = ConstraintSchedule::builder()
    ///     .entry(Date::from_ymd(2019, 12, 1).unwrap())
    ///     .point(0.0, 150.0, 250.0)
    ///     .point(2_000.0, 200.0, 210.0)
    ///     .point(5_000.0, 260.0, 135.0)
    ///     .entry(Date::from_ymd(2020, 3, 1).unwrap())
    ///     .point(0.0, 130.0, 260.0)
    ///     .point(5_000.0, 270.0, 120.0)
    ///     .build(RatchetInterp::Linear)
    ///     .unwrap();
    ///
    /// assert_eq!(schedule.entries().len(), 2);
    /// ```
    pub fn builder() -> ConstraintScheduleBuilder {
        ConstraintScheduleBuilder::default()
    }

    /// Schedule with a single ratchet effective from `date`.
    pub fn single(date: Date, ratchet: Ratchet) -> Self {
        Self {
            entries: vec![(date, ratchet)],
        }
    }

    /// Entries in date order.
    pub fn entries(&self) -> &[(Date, Ratchet)] {
        &self.entries
    }

    /// First effective date.
    pub fn first_date(&self) -> Date {
        self.entries[0].0
    }

    /// Ratchet in force on `date`, if any entry is effective by then.
    pub fn ratchet_at(&self, date: Date) -> Option<&Ratchet> {
        let pos = self.entries.partition_point(|(d, _)| *d <= date);
        pos.checked_sub(1).map(|i| &self.entries[i].1)
    }
}

/// Builder turning dated rows into a [`ConstraintSchedule`].
///
/// Each call to [`entry`](ConstraintScheduleBuilder::entry) opens a new dated
/// ratchet; subsequent [`point`](ConstraintScheduleBuilder::point) calls add
/// breakpoints to it.
#[derive(Debug, Clone, Default)]
pub struct ConstraintScheduleBuilder {
    entries: Vec<(Date, Vec<RatchetPoint>)>,
    orphan_points: usize,
}

impl ConstraintScheduleBuilder {
    /// Open a new entry effective from `date`.
    pub fn entry(mut self, date: Date) -> Self {
        self.entries.push((date, Vec::new()));
        self
    }

    /// Add a breakpoint to the current entry.
    pub fn point(mut self, inventory: f64, max_withdrawal_rate: f64, max_injection_rate: f64) -> Self {
        let point = RatchetPoint::new(inventory, max_withdrawal_rate, max_injection_rate);
        match self.entries.last_mut() {
            Some((_, points)) => points.push(point),
            None => self.orphan_points += 1,
        }
        self
    }

    /// Add a whole dated entry at once.
    pub fn entry_with_points(mut self, date: Date, points: Vec<RatchetPoint>) -> Self {
        self.entries.push((date, points));
        self
    }

    /// Validate and build the schedule.
    ///
    /// # Errors
    ///
    /// `StorageError::InvalidStorageConfiguration` if no entries were given,
    /// points were added before any entry, entry dates are not strictly
    /// increasing, or any ratchet is invalid.
    pub fn build(self, interp: RatchetInterp) -> Result<ConstraintSchedule, StorageError> {
        if self.orphan_points > 0 {
            return Err(StorageError::config(format!(
                "{} ratchet points given before any dated entry",
                self.orphan_points
            )));
        }
        if self.entries.is_empty() {
            return Err(StorageError::config("constraint schedule has no entries"));
        }
        if let Some(w) = self.entries.windows(2).find(|w| w[1].0 <= w[0].0) {
            return Err(StorageError::config(format!(
                "ratchet entry dates must be strictly increasing: {} followed by {}",
                w[0].0, w[1].0
            )));
        }
        let entries = self
            .entries
            .into_iter()
            .map(|(date, points)| Ok((date, Ratchet::new(points, interp)?)))
            .collect::<Result<Vec<_>, StorageError>>()?;
        Ok(ConstraintSchedule { entries })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn d(y: i32, m: u32, day: u32) -> Date {
        Date::from_ymd(y, m, day).unwrap()
    }

    fn table(interp: RatchetInterp) -> Ratchet {
        Ratchet::new(
            vec![
                RatchetPoint::new(0.0, 150.0, 250.0),
                RatchetPoint::new(2_000.0, 200.0, 210.0),
                RatchetPoint::new(5_000.0, 260.0, 135.0),
            ],
            interp,
        )
        .unwrap()
    }

    #[test]
    fn test_step_uses_floor_breakpoint() {
        let r = table(RatchetInterp::Step);
        assert_eq!(r.range_at(1_999.0).max_rate, 250.0);
        assert_eq!(r.range_at(2_000.0).max_rate, 210.0);
        assert_eq!(r.range_at(4_000.0).min_rate, -200.0);
        assert_eq!(r.range_below(2_000.0).max_rate, 250.0);
    }

    #[test]
    fn test_linear_interpolates_between_breakpoints() {
        let r = table(RatchetInterp::Linear);
        let range = r.range_at(1_000.0);
        assert_relative_eq!(range.max_rate, 230.0, epsilon = 1e-12);
        assert_relative_eq!(range.min_rate, -175.0, epsilon = 1e-12);
    }

    #[test]
    fn test_outside_table_clamps_to_end_rates() {
        let r = table(RatchetInterp::Linear);
        assert_eq!(r.range_at(-10.0).max_rate, 250.0);
        assert_eq!(r.range_at(6_000.0).min_rate, -260.0);
    }

    #[test]
    fn test_constant_ratchet_ignores_inventory() {
        let r = Ratchet::constant(45.5, 100.0).unwrap();
        assert!(r.is_simple());
        assert_eq!(r.range_at(1e6), InjectWithdrawRange { min_rate: -45.5, max_rate: 100.0 });
    }

    #[test]
    fn test_rejects_unsorted_and_negative() {
        let unsorted = Ratchet::new(
            vec![RatchetPoint::new(10.0, 1.0, 1.0), RatchetPoint::new(5.0, 1.0, 1.0)],
            RatchetInterp::Step,
        );
        assert!(matches!(unsorted, Err(StorageError::InvalidStorageConfiguration(_))));
        assert!(Ratchet::new(vec![RatchetPoint::new(0.0, -1.0, 1.0)], RatchetInterp::Step).is_err());
        assert!(Ratchet::new(vec![], RatchetInterp::Step).is_err());
    }

    #[test]
    fn test_schedule_lookup_by_date() {
        let schedule = ConstraintSchedule::builder()
            .entry(d(2020, 1, 1))
            .point(0.0, 10.0, 20.0)
            .point(100.0, 10.0, 20.0)
            .entry(d(2020, 2, 1))
            .point(0.0, 30.0, 40.0)
            .point(100.0, 30.0, 40.0)
            .build(RatchetInterp::Step)
            .unwrap();
        assert!(schedule.ratchet_at(d(2019, 12, 31)).is_none());
        assert_eq!(schedule.ratchet_at(d(2020, 1, 31)).unwrap().range_at(50.0).max_rate, 20.0);
        assert_eq!(schedule.ratchet_at(d(2020, 2, 1)).unwrap().range_at(50.0).max_rate, 40.0);
    }

    #[test]
    fn test_builder_rejects_points_without_entry() {
        let result = ConstraintSchedule::builder().point(0.0, 1.0, 1.0).build(RatchetInterp::Step);
        assert!(result.is_err());
    }

    #[test]
    fn test_builder_rejects_unsorted_dates() {
        let result = ConstraintSchedule::builder()
            .entry(d(2020, 2, 1))
            .point(0.0, 1.0, 1.0)
            .entry(d(2020, 1, 1))
            .point(0.0, 1.0, 1.0)
            .build(RatchetInterp::Step);
        assert!(result.is_err());
    }
}
