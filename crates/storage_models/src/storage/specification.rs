//! Storage facility definition and its builder.

use std::fmt;
use std::sync::Arc;

use storage_core::market_data::TimeSeries;
use storage_core::types::Date;

use super::ratchet::{ConstraintSchedule, Ratchet, RatchetInterp, RatchetPoint};
use crate::error::StorageError;
use crate::schedules::Frequency;

/// Value of inventory left at the end date, given spot price and inventory.
pub type TerminalValueFn = Arc<dyn Fn(f64, f64) -> f64 + Send + Sync>;

/// What happens to inventory remaining on the end date.
#[derive(Clone, Default)]
pub enum TerminalCondition {
    /// The facility must be empty at the end.
    #[default]
    MustBeEmpty,
    /// Any inventory within bounds is allowed and is worth
    /// `f(spot, inventory)`, discounted from the end date.
    Value(TerminalValueFn),
}

impl TerminalCondition {
    /// Terminal value function from a closure.
    pub fn value<F>(f: F) -> Self
    where
        F: Fn(f64, f64) -> f64 + Send + Sync + 'static,
    {
        TerminalCondition::Value(Arc::new(f))
    }
}

impl fmt::Debug for TerminalCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TerminalCondition::MustBeEmpty => write!(f, "MustBeEmpty"),
            TerminalCondition::Value(_) => write!(f, "Value(<fn>)"),
        }
    }
}

/// Window during which rates are reduced, e.g. for compressor maintenance.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MaintenanceOutage {
    /// First affected date.
    pub start: Date,
    /// First date after the outage.
    pub end: Date,
    /// Multiplier on the maximum injection rate, in [0, 1].
    pub injection_scale: f64,
    /// Multiplier on the maximum withdrawal rate, in [0, 1].
    pub withdrawal_scale: f64,
}

impl MaintenanceOutage {
    /// Outage that stops all activity in `[start, end)`.
    pub fn full(start: Date, end: Date) -> Self {
        Self {
            start,
            end,
            injection_scale: 0.0,
            withdrawal_scale: 0.0,
        }
    }

    /// True when `date` lies in the outage window.
    pub fn covers(&self, date: Date) -> bool {
        self.start <= date && date < self.end
    }
}

/// Immutable definition of a storage facility.
///
/// Build with [`StorageSpecification::builder`] or [`build_storage`].
#[derive(Debug, Clone)]
pub struct StorageSpecification {
    pub(crate) frequency: Frequency,
    pub(crate) start: Date,
    pub(crate) end: Date,
    pub(crate) injection_cost: f64,
    pub(crate) withdrawal_cost: f64,
    pub(crate) injection_fuel: f64,
    pub(crate) withdrawal_fuel: f64,
    pub(crate) schedule: ConstraintSchedule,
    pub(crate) min_inventory: Option<TimeSeries>,
    pub(crate) max_inventory: Option<TimeSeries>,
    pub(crate) inventory_loss: f64,
    pub(crate) inventory_cost: f64,
    pub(crate) maintenance: Vec<MaintenanceOutage>,
    pub(crate) terminal: TerminalCondition,
}

impl StorageSpecification {
    /// Start building a facility active over `[start, end)`.
    ///
    /// # Example
    ///
    /// ```
    /// use storage_core::types::Date;
    /// use storage_models::schedules::Frequency;
    /// use storage_models::storage::StorageSpecification;
    ///
    /// let storage = StorageSpecification::builder(
    ///     Frequency::Daily,
    ///     Date::from_ymd(2019, 12, 1).unwrap(),
    ///     Date::from_ymd(2020, 4, 1).unwrap(),
    /// )
    /// .simple_constraints(0.0, 100_000.0, 2_500.0, 3_000.0)
    /// .injection_cost(0.01)
    /// .withdrawal_cost(0.025)
    /// .build()
    /// .unwrap();
    ///
    /// assert_eq!(storage.injection_cost(), 0.01);
    /// ```
    pub fn builder(frequency: Frequency, start: Date, end: Date) -> StorageSpecificationBuilder {
        StorageSpecificationBuilder {
            frequency,
            start,
            end,
            injection_cost: 0.0,
            withdrawal_cost: 0.0,
            injection_fuel: 0.0,
            withdrawal_fuel: 0.0,
            schedule: None,
            min_inventory: None,
            max_inventory: None,
            inventory_loss: 0.0,
            inventory_cost: 0.0,
            maintenance: Vec::new(),
            terminal: TerminalCondition::MustBeEmpty,
            error: None,
        }
    }

    /// Decision frequency.
    pub fn frequency(&self) -> Frequency {
        self.frequency
    }

    /// First date of activity.
    pub fn start(&self) -> Date {
        self.start
    }

    /// End date (exclusive); terminal conditions apply here.
    pub fn end(&self) -> Date {
        self.end
    }

    /// Cost per unit injected.
    pub fn injection_cost(&self) -> f64 {
        self.injection_cost
    }

    /// Cost per unit withdrawn.
    pub fn withdrawal_cost(&self) -> f64 {
        self.withdrawal_cost
    }

    /// Fraction of injected volume additionally consumed as fuel.
    pub fn injection_fuel(&self) -> f64 {
        self.injection_fuel
    }

    /// Fraction of withdrawn volume consumed as fuel.
    pub fn withdrawal_fuel(&self) -> f64 {
        self.withdrawal_fuel
    }

    /// Ratchet schedule.
    pub fn schedule(&self) -> &ConstraintSchedule {
        &self.schedule
    }

    /// Fraction of inventory lost each period.
    pub fn inventory_loss(&self) -> f64 {
        self.inventory_loss
    }

    /// Holding cost per unit of inventory per period.
    pub fn inventory_cost(&self) -> f64 {
        self.inventory_cost
    }

    /// Maintenance outages.
    pub fn maintenance(&self) -> &[MaintenanceOutage] {
        &self.maintenance
    }

    /// Terminal condition.
    pub fn terminal(&self) -> &TerminalCondition {
        &self.terminal
    }

    /// True when inventory must be zero on the end date.
    pub fn must_be_empty(&self) -> bool {
        matches!(self.terminal, TerminalCondition::MustBeEmpty)
    }
}

/// Builder for [`StorageSpecification`].
pub struct StorageSpecificationBuilder {
    frequency: Frequency,
    start: Date,
    end: Date,
    injection_cost: f64,
    withdrawal_cost: f64,
    injection_fuel: f64,
    withdrawal_fuel: f64,
    schedule: Option<ConstraintSchedule>,
    min_inventory: Option<TimeSeries>,
    max_inventory: Option<TimeSeries>,
    inventory_loss: f64,
    inventory_cost: f64,
    maintenance: Vec<MaintenanceOutage>,
    terminal: TerminalCondition,
    error: Option<StorageError>,
}

impl StorageSpecificationBuilder {
    /// Per-unit injection cost, paid on the decision date.
    pub fn injection_cost(mut self, cost: f64) -> Self {
        self.injection_cost = cost;
        self
    }

    /// Per-unit withdrawal cost, paid on the decision date.
    pub fn withdrawal_cost(mut self, cost: f64) -> Self {
        self.withdrawal_cost = cost;
        self
    }

    /// Fraction of injected volume consumed as fuel.
    pub fn injection_fuel(mut self, fraction: f64) -> Self {
        self.injection_fuel = fraction;
        self
    }

    /// Fraction of withdrawn volume consumed as fuel.
    pub fn withdrawal_fuel(mut self, fraction: f64) -> Self {
        self.withdrawal_fuel = fraction;
        self
    }

    /// Inventory-dependent ratchet schedule; bounds come from its breakpoints
    /// unless overridden.
    pub fn ratchets(mut self, schedule: ConstraintSchedule) -> Self {
        self.schedule = Some(schedule);
        self
    }

    /// Constant rates and bounds over the whole life of the facility.
    pub fn simple_constraints(
        mut self,
        min_inventory: f64,
        max_inventory: f64,
        max_injection_rate: f64,
        max_withdrawal_rate: f64,
    ) -> Self {
        if min_inventory > max_inventory {
            self.error = Some(StorageError::config(format!(
                "min inventory {} exceeds max inventory {}",
                min_inventory, max_inventory
            )));
            return self;
        }
        let point = RatchetPoint::new(min_inventory, max_withdrawal_rate, max_injection_rate);
        let bounds = TimeSeries::new(vec![(self.start, min_inventory)])
            .and_then(|min| Ok((min, TimeSeries::new(vec![(self.start, max_inventory)])?)));
        match (Ratchet::new(vec![point], RatchetInterp::Step), bounds) {
            (Ok(ratchet), Ok((min, max))) => {
                self.schedule = Some(ConstraintSchedule::single(self.start, ratchet));
                self.min_inventory = Some(min);
                self.max_inventory = Some(max);
            }
            (Err(e), _) => self.error = Some(e),
            (_, Err(e)) => self.error = Some(e.into()),
        }
        self
    }

    /// Override the minimum inventory by date (step lookup).
    pub fn min_inventory(mut self, series: TimeSeries) -> Self {
        self.min_inventory = Some(series);
        self
    }

    /// Override the maximum inventory by date (step lookup).
    pub fn max_inventory(mut self, series: TimeSeries) -> Self {
        self.max_inventory = Some(series);
        self
    }

    /// Fraction of inventory lost each period.
    pub fn inventory_loss(mut self, fraction: f64) -> Self {
        self.inventory_loss = fraction;
        self
    }

    /// Holding cost per unit of inventory per period.
    pub fn inventory_cost(mut self, cost: f64) -> Self {
        self.inventory_cost = cost;
        self
    }

    /// Add a maintenance outage.
    pub fn maintenance(mut self, outage: MaintenanceOutage) -> Self {
        self.maintenance.push(outage);
        self
    }

    /// Terminal condition (must be empty by default).
    pub fn terminal(mut self, terminal: TerminalCondition) -> Self {
        self.terminal = terminal;
        self
    }

    /// Validate and build.
    ///
    /// # Errors
    ///
    /// `StorageError::InvalidStorageConfiguration` if `start >= end`, any
    /// cost, fuel fraction or rate is negative, no constraints were given,
    /// simple ratchets lack bound series, or breakpoint-derived bounds
    /// decrease over time.
    pub fn build(self) -> Result<StorageSpecification, StorageError> {
        if let Some(err) = self.error {
            return Err(err);
        }
        if self.start >= self.end {
            return Err(StorageError::config(format!(
                "start {} must be before end {}",
                self.start, self.end
            )));
        }
        non_negative("injection cost", self.injection_cost)?;
        non_negative("withdrawal cost", self.withdrawal_cost)?;
        non_negative("inventory cost", self.inventory_cost)?;
        fraction("injection fuel", self.injection_fuel)?;
        fraction("withdrawal fuel", self.withdrawal_fuel)?;
        fraction("inventory loss", self.inventory_loss)?;

        let schedule = self.schedule.ok_or_else(|| {
            StorageError::config("no injection/withdrawal constraints were given")
        })?;
        if schedule.first_date() > self.start {
            return Err(StorageError::config(format!(
                "first ratchet entry {} is after the storage start {}",
                schedule.first_date(),
                self.start
            )));
        }

        for series in [&self.min_inventory, &self.max_inventory].into_iter().flatten() {
            if series.start() > self.start {
                return Err(StorageError::config(format!(
                    "inventory bound series starts {} after the storage start {}",
                    series.start(),
                    self.start
                )));
            }
            if series.min_value() < 0.0 {
                return Err(StorageError::config("inventory bounds must be non-negative"));
            }
        }

        let simple = schedule.entries().iter().any(|(_, r)| r.is_simple());
        if simple && (self.min_inventory.is_none() || self.max_inventory.is_none()) {
            return Err(StorageError::config(
                "single-point ratchets need explicit min and max inventory series",
            ));
        }
        for (select, overridden, what) in [
            (Ratchet::min_inventory as fn(&Ratchet) -> f64, self.min_inventory.is_some(), "minimum"),
            (Ratchet::max_inventory as fn(&Ratchet) -> f64, self.max_inventory.is_some(), "maximum"),
        ] {
            if overridden {
                continue;
            }
            let entries = schedule.entries();
            if let Some(w) = entries.windows(2).find(|w| select(&w[1].1) < select(&w[0].1)) {
                return Err(StorageError::config(format!(
                    "{} inventory derived from ratchets decreases on {}; supply an explicit {} inventory series",
                    what, w[1].0, what
                )));
            }
        }

        for outage in &self.maintenance {
            if outage.start >= outage.end {
                return Err(StorageError::config(format!(
                    "maintenance outage start {} must be before its end {}",
                    outage.start, outage.end
                )));
            }
            for scale in [outage.injection_scale, outage.withdrawal_scale] {
                if !(0.0..=1.0).contains(&scale) {
                    return Err(StorageError::config(format!(
                        "maintenance rate scale must be in [0, 1], got {}",
                        scale
                    )));
                }
            }
        }

        Ok(StorageSpecification {
            frequency: self.frequency,
            start: self.start,
            end: self.end,
            injection_cost: self.injection_cost,
            withdrawal_cost: self.withdrawal_cost,
            injection_fuel: self.injection_fuel,
            withdrawal_fuel: self.withdrawal_fuel,
            schedule,
            min_inventory: self.min_inventory,
            max_inventory: self.max_inventory,
            inventory_loss: self.inventory_loss,
            inventory_cost: self.inventory_cost,
            maintenance: self.maintenance,
            terminal: self.terminal,
        })
    }
}

fn non_negative(what: &str, value: f64) -> Result<(), StorageError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(StorageError::config(format!(
            "{} must be finite and non-negative, got {}",
            what, value
        )))
    }
}

fn fraction(what: &str, value: f64) -> Result<(), StorageError> {
    if (0.0..1.0).contains(&value) {
        Ok(())
    } else {
        Err(StorageError::config(format!("{} must be in [0, 1), got {}", what, value)))
    }
}

/// Injection/withdrawal constraints in flat, serialisable form.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(tag = "type", rename_all = "snake_case"))]
pub enum StorageConstraints {
    /// Dated ratchet tables.
    Ratchets {
        /// Entries in date order.
        entries: Vec<RatchetEntry>,
        /// Interpolation between breakpoints.
        #[cfg_attr(feature = "serde", serde(default))]
        interpolation: RatchetInterp,
    },
    /// Constant rates and bounds.
    Simple {
        /// Minimum inventory.
        min_inventory: f64,
        /// Maximum inventory.
        max_inventory: f64,
        /// Maximum injection per period.
        max_injection_rate: f64,
        /// Maximum withdrawal per period.
        max_withdrawal_rate: f64,
    },
}

/// One dated ratchet table.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RatchetEntry {
    /// Effective date.
    pub date: Date,
    /// Breakpoints in inventory order.
    pub points: Vec<RatchetPoint>,
}

/// Flat parameter set accepted by [`build_storage`].
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct StorageParams {
    /// Decision frequency.
    pub frequency: Frequency,
    /// First date of activity.
    pub start: Date,
    /// End date (exclusive).
    pub end: Date,
    /// Cost per unit injected.
    pub injection_cost: f64,
    /// Cost per unit withdrawn.
    pub withdrawal_cost: f64,
    /// Rate and inventory constraints.
    pub constraints: StorageConstraints,
    /// Fraction of injected volume consumed as fuel.
    #[cfg_attr(feature = "serde", serde(default))]
    pub injection_fuel: f64,
    /// Fraction of withdrawn volume consumed as fuel.
    #[cfg_attr(feature = "serde", serde(default))]
    pub withdrawal_fuel: f64,
}

/// Build a facility from flat parameters.
///
/// # Example
///
/// ```
/// use storage_core::types::Date;
/// use storage_models::schedules::Frequency;
/// use storage_models::storage::{build_storage, StorageConstraints, StorageParams};
///
/// let params = StorageParams {
///     frequency: Frequency::Daily,
///     start: Date::from_ymd(2021, 4, 1).unwrap(),
///     end: Date::from_ymd(2022, 4, 1).unwrap(),
///     injection_cost: 0.01,
///     withdrawal_cost: 0.02,
///     constraints: StorageConstraints::Simple {
///         min_inventory: 0.0,
///         max_inventory: 1_000.0,
///         max_injection_rate: 25.0,
///         max_withdrawal_rate: 30.0,
///     },
///     injection_fuel: 0.0,
///     withdrawal_fuel: 0.0,
/// };
/// assert!(build_storage(&params).is_ok());
/// ```
pub fn build_storage(params: &StorageParams) -> Result<StorageSpecification, StorageError> {
    let builder = StorageSpecification::builder(params.frequency, params.start, params.end)
        .injection_cost(params.injection_cost)
        .withdrawal_cost(params.withdrawal_cost)
        .injection_fuel(params.injection_fuel)
        .withdrawal_fuel(params.withdrawal_fuel);
    let builder = match &params.constraints {
        StorageConstraints::Ratchets {
            entries,
            interpolation,
        } => {
            let schedule = entries
                .iter()
                .fold(ConstraintSchedule::builder(), |b, e| {
                    b.entry_with_points(e.date, e.points.clone())
                })
                .build(*interpolation)?;
            builder.ratchets(schedule)
        }
        StorageConstraints::Simple {
            min_inventory,
            max_inventory,
            max_injection_rate,
            max_withdrawal_rate,
        } => {
            builder.simple_constraints(*min_inventory, *max_inventory, *max_injection_rate, *max_withdrawal_rate)
        }
    };
    builder.build()
}
