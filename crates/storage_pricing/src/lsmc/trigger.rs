//! Trigger prices from the fitted continuation values.
//!
//! The regressed continuation value is linear in the design row, so its mean
//! over the paths equals its value at the mean design row. The marginal value
//! of moving a full period's volume at the expected inventory then gives the
//! spot price at which the move breaks even.

use super::engine::{DecisionRule, StorageEngine};
use super::error::ValuationError;
use super::result::{StorageProfile, TriggerPrices};
use crate::simulation::SimulatedPaths;

impl StorageEngine<'_> {
    /// Trigger prices per decision date at the profile's expected inventory.
    pub(crate) fn trigger_prices(
        &self,
        paths: &SimulatedPaths,
        rule: &DecisionRule,
        profile: &StorageProfile,
    ) -> Result<Vec<TriggerPrices>, ValuationError> {
        let storage = self.storage();
        let tol = self.tol();
        let n = paths.num_paths();
        let mut triggers = Vec::with_capacity(rule.dates.len());
        let mut row = Vec::new();

        for (k, date_rule) in rule.dates.iter().enumerate() {
            let columns = date_rule.layout.columns();
            let raw = self.raw_basis(paths, k);
            let num_terms = raw.len() / n;
            let mut mean_row = vec![0.0; columns];
            for p in 0..n {
                date_rule.layout.row(&raw[p * num_terms..(p + 1) * num_terms], &mut row);
                for (acc, x) in mean_row.iter_mut().zip(&row) {
                    *acc += x / n as f64;
                }
            }

            let inventory = profile.inventory[k];
            let (lo, hi) = self.volume_range(k, inventory)?;
            let carried = storage.after_loss(inventory);
            let base = 0.0_f64.max(lo).min(hi);
            let next_grid = self.grid(k + 1);
            let continuation = |volume: f64| date_rule.continuation(next_grid, &mean_row, carried + volume, tol);
            let period = &self.periods()[k];
            let at_base = continuation(base);

            let mut trigger = TriggerPrices::default();
            let inject = hi - base;
            if inject > tol {
                let gain = continuation(hi) - at_base;
                trigger.inject_volume = Some(inject);
                trigger.inject_price = Some(
                    (gain - storage.injection_cost() * inject * period.df_decision)
                        / (inject * (1.0 + storage.injection_fuel()) * period.df_settle),
                );
            }
            let withdraw = base - lo;
            if withdraw > tol {
                let loss = at_base - continuation(lo);
                trigger.withdraw_volume = Some(withdraw);
                trigger.withdraw_price = Some(
                    (loss + storage.withdrawal_cost() * withdraw * period.df_decision)
                        / (withdraw * (1.0 - storage.withdrawal_fuel()) * period.df_settle),
                );
            }
            triggers.push(trigger);
        }
        Ok(triggers)
    }
}
