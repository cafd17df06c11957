//! Reachable inventory ranges over the decision dates.
//!
//! A forward pass from the starting inventory finds every level reachable
//! under maximum rates; a backward pass then drops levels from which the
//! following date's range (ultimately the terminal condition) cannot be hit.
//! The backward pass assumes the reach functions `v(1 - loss) + rate(v)`
//! are non-decreasing in `v`.

use storage_core::types::Date;
use tracing::debug;

use super::specification::StorageSpecification;
use crate::error::StorageError;

/// Feasible `[min, max]` inventory for each date of a valuation schedule.
#[derive(Debug, Clone, PartialEq)]
pub struct InventorySpace {
    dates: Vec<Date>,
    bounds: Vec<(f64, f64)>,
}

impl InventorySpace {
    /// Dates covered, ending with the terminal date.
    pub fn dates(&self) -> &[Date] {
        &self.dates
    }

    /// `(min, max)` per date.
    pub fn bounds(&self) -> &[(f64, f64)] {
        &self.bounds
    }

    /// Smallest lower bound over all dates.
    pub fn global_min(&self) -> f64 {
        self.bounds.iter().map(|b| b.0).fold(f64::INFINITY, f64::min)
    }

    /// Largest upper bound over all dates.
    pub fn global_max(&self) -> f64 {
        self.bounds.iter().map(|b| b.1).fold(f64::NEG_INFINITY, f64::max)
    }
}

impl StorageSpecification {
    /// Compute the feasible inventory space over `dates` (decision dates
    /// followed by the terminal date) starting from `start_inventory`.
    ///
    /// # Errors
    ///
    /// `StorageError::InfeasibleConstraint` if the starting inventory lies
    /// outside the facility bounds, or if on some date no level within the
    /// bounds can be reached.
    ///
    /// # Example
    ///
    /// ```
    /// use storage_core::types::Date;
    /// use storage_models::schedules::Frequency;
    /// use storage_models::storage::StorageSpecification;
    ///
    /// let start = Date::from_ymd(2020, 1, 1).unwrap();
    /// let end = start.add_days(3);
    /// let storage = StorageSpecification::builder(Frequency::Daily, start, end)
    ///     .simple_constraints(0.0, 100.0, 10.0, 10.0)
    ///     .build()
    ///     .unwrap();
    ///
    /// let dates = vec![start, start.add_days(1), start.add_days(2), end];
    /// let space = storage.inventory_space(&dates, 0.0, 1e-10).unwrap();
    /// assert_eq!(space.bounds()[1], (0.0, 10.0));
    /// // Must be empty at the end, so at most 10 can be held the day before.
    /// assert_eq!(space.bounds()[2], (0.0, 10.0));
    /// ```
    pub fn inventory_space(&self, dates: &[Date], start_inventory: f64, tol: f64) -> Result<InventorySpace, StorageError> {
        let Some(&first) = dates.first() else {
            return Ok(InventorySpace {
                dates: Vec::new(),
                bounds: Vec::new(),
            });
        };

        let (min0, max0) = self.inventory_bounds(first)?;
        if start_inventory < min0 - tol || start_inventory > max0 + tol {
            return Err(StorageError::InfeasibleConstraint {
                date: first,
                reason: format!(
                    "starting inventory {} outside [{}, {}]",
                    start_inventory, min0, max0
                ),
            });
        }

        let mut bounds = Vec::with_capacity(dates.len());
        bounds.push((start_inventory, start_inventory));
        for window in dates.windows(2) {
            let (date, next) = (window[0], window[1]);
            let (lo, hi) = bounds[bounds.len() - 1];
            let (reach_lo, reach_hi) = self.reach(date, lo, hi)?;
            let (min_b, max_b) = self.inventory_bounds(next)?;
            let next_lo = reach_lo.max(min_b);
            let next_hi = reach_hi.min(max_b);
            if next_lo > next_hi + tol {
                return Err(StorageError::InfeasibleConstraint {
                    date: next,
                    reason: format!(
                        "reachable inventory [{}, {}] does not meet bounds [{}, {}]",
                        reach_lo, reach_hi, min_b, max_b
                    ),
                });
            }
            bounds.push((next_lo.min(next_hi), next_hi.max(next_lo)));
        }

        for k in (0..dates.len().saturating_sub(1)).rev() {
            let (target_lo, target_hi) = bounds[k + 1];
            let (lo, hi) = bounds[k];
            let date = dates[k];
            let narrowed_lo = self.lowest_reaching(date, lo, hi, target_lo, tol)?;
            let narrowed_hi = self.highest_reaching(date, lo, hi, target_hi, tol)?;
            match (narrowed_lo, narrowed_hi) {
                (Some(new_lo), Some(new_hi)) if new_lo <= new_hi + tol => {
                    bounds[k] = (new_lo, new_hi.max(new_lo));
                }
                _ => {
                    return Err(StorageError::InfeasibleConstraint {
                        date: dates[k + 1],
                        reason: format!(
                            "no inventory in [{}, {}] on {} can reach [{}, {}]",
                            lo, hi, date, target_lo, target_hi
                        ),
                    });
                }
            }
        }

        debug!(
            dates = dates.len(),
            start_inventory,
            "inventory space computed"
        );
        Ok(InventorySpace {
            dates: dates.to_vec(),
            bounds,
        })
    }

    /// Lowest and highest next-date inventory reachable from anywhere in `[lo, hi]`.
    fn reach(&self, date: Date, lo: f64, hi: f64) -> Result<(f64, f64), StorageError> {
        let ratchet = self.ratchet_at(date)?;
        let mut candidates = vec![lo, hi];
        candidates.extend(
            ratchet
                .points()
                .iter()
                .map(|p| p.inventory)
                .filter(|&v| v > lo && v < hi),
        );

        let mut reach_lo = f64::INFINITY;
        let mut reach_hi = f64::NEG_INFINITY;
        for v in candidates {
            let carried = self.after_loss(v);
            for range in [
                self.inject_withdraw_range(date, v)?,
                self.inject_withdraw_range_below(date, v)?,
            ] {
                reach_lo = reach_lo.min(carried + range.min_rate);
                reach_hi = reach_hi.max(carried + range.max_rate);
            }
        }
        Ok((reach_lo, reach_hi))
    }

    /// Segment ends of the ratchet on `date` restricted to `[lo, hi]`, ascending.
    fn segments(&self, date: Date, lo: f64, hi: f64) -> Result<Vec<f64>, StorageError> {
        let mut knots = vec![lo];
        knots.extend(
            self.ratchet_at(date)?
                .points()
                .iter()
                .map(|p| p.inventory)
                .filter(|&v| v > lo && v < hi),
        );
        if hi > lo {
            knots.push(hi);
        }
        Ok(knots)
    }

    /// Smallest `v` in `[lo, hi]` whose maximum injection reaches `target`.
    ///
    /// The reach functions are linear between ratchet breakpoints, so each
    /// segment is solved exactly.
    fn lowest_reaching(&self, date: Date, lo: f64, hi: f64, target: f64, tol: f64) -> Result<Option<f64>, StorageError> {
        let knots = self.segments(date, lo, hi)?;
        let at = |v: f64| -> Result<f64, StorageError> {
            Ok(self.after_loss(v) + self.inject_withdraw_range(date, v)?.max_rate)
        };
        let below = |v: f64| -> Result<f64, StorageError> {
            Ok(self.after_loss(v) + self.inject_withdraw_range_below(date, v)?.max_rate)
        };
        if at(lo)? >= target - tol {
            return Ok(Some(lo));
        }
        for w in knots.windows(2) {
            let (a, b) = (w[0], w[1]);
            let (fa, fb) = (at(a)?, below(b)?);
            if fa >= target - tol {
                return Ok(Some(a));
            }
            if fb >= target - tol {
                return Ok(Some(solve_linear(a, fa, b, fb, target)));
            }
        }
        if at(hi)? >= target - tol {
            return Ok(Some(hi));
        }
        Ok(None)
    }

    /// Largest `v` in `[lo, hi]` whose maximum withdrawal reaches `target`.
    fn highest_reaching(&self, date: Date, lo: f64, hi: f64, target: f64, tol: f64) -> Result<Option<f64>, StorageError> {
        let knots = self.segments(date, lo, hi)?;
        let at = |v: f64| -> Result<f64, StorageError> {
            Ok(self.after_loss(v) + self.inject_withdraw_range(date, v)?.min_rate)
        };
        let below = |v: f64| -> Result<f64, StorageError> {
            Ok(self.after_loss(v) + self.inject_withdraw_range_below(date, v)?.min_rate)
        };
        if at(hi)? <= target + tol {
            return Ok(Some(hi));
        }
        for w in knots.windows(2).rev() {
            let (a, b) = (w[0], w[1]);
            let (fa, fb) = (at(a)?, below(b)?);
            if fb <= target + tol {
                return Ok(Some(b));
            }
            if fa <= target + tol {
                return Ok(Some(solve_linear(a, fa, b, fb, target)));
            }
        }
        if at(lo)? <= target + tol {
            return Ok(Some(lo));
        }
        Ok(None)
    }
}

/// Root of the line through `(a, fa)` and `(b, fb)` at `target`, clamped to `[a, b]`.
fn solve_linear(a: f64, fa: f64, b: f64, fb: f64, target: f64) -> f64 {
    if (fb - fa).abs() <= f64::EPSILON * fa.abs().max(fb.abs()).max(1.0) {
        return a;
    }
    (a + (target - fa) * (b - a) / (fb - fa)).clamp(a, b)
}
