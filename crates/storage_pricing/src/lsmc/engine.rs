//! Backward induction over the inventory grid and forward replay of the
//! resulting decision rule.
//!
//! The value stored at a grid node is, per path, the discounted cash flow of
//! the chosen action plus the realised value of the next node reached. The
//! regressed continuation value only selects the action; it is never stored,
//! which keeps the in-sample estimate free of regression bias.

use rayon::prelude::*;
use storage_core::types::Date;
use storage_models::storage::{StorageSpecification, TerminalCondition};
use tracing::debug;

use super::config::{LsmcConfig, RegressionFallback};
use super::error::ValuationError;
use super::grid::InventoryGrid;
use super::regression::{ContinuationRegression, DesignLayout};
use super::request::ValuationRequest;
use super::result::{SimulationPanels, StorageProfile};
use super::{report_progress, ProgressCallback};
use crate::basis::BasisFunctions;
use crate::simulation::SimulatedPaths;

/// Market data attached to one decision date.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Period {
    pub(crate) date: Date,
    /// Model time from the valuation date, the basis variable `t`.
    pub(crate) years: f64,
    pub(crate) forward: f64,
    /// Discount factor of the commodity cash flow's settlement date.
    pub(crate) df_settle: f64,
    /// Discount factor of the decision date, used for costs.
    pub(crate) df_decision: f64,
}

/// Regression fitted on one decision date.
#[derive(Debug, Clone)]
pub(crate) struct DateRule {
    pub(crate) layout: DesignLayout,
    /// Coefficients per next-date inventory level.
    pub(crate) betas: Vec<Vec<f64>>,
}

impl DateRule {
    /// Continuation value at inventory `x` on the next date for a design row.
    pub(crate) fn continuation(&self, next_grid: &InventoryGrid, row: &[f64], x: f64, tol: f64) -> f64 {
        next_grid.interpolate(x, tol, |j| DesignLayout::predict(row, &self.betas[j]))
    }
}

/// Decision rule produced by the backward pass.
#[derive(Debug, Clone)]
pub(crate) struct DecisionRule {
    pub(crate) dates: Vec<DateRule>,
    /// Mean of the stored values at the starting node.
    pub(crate) in_sample_npv: f64,
}

/// Aggregates of the forward pass.
#[derive(Debug, Clone)]
pub(crate) struct ForwardOutcome {
    pub(crate) npv: f64,
    pub(crate) std_error: f64,
    pub(crate) profile: StorageProfile,
    pub(crate) deltas: Vec<f64>,
    pub(crate) panels: Option<SimulationPanels>,
}

/// One path of the forward pass.
struct PathRecord {
    inventory: Vec<f64>,
    volume: Vec<f64>,
    cash: Vec<f64>,
    end_inventory: f64,
    terminal: f64,
}

pub(crate) struct StorageEngine<'a> {
    request: ValuationRequest<'a>,
    basis: BasisFunctions,
    tol: f64,
    extra_decisions: usize,
    fallback: RegressionFallback,
    discount_deltas: bool,
    periods: Vec<Period>,
    /// Feasible inventory per decision date, then the end date.
    bounds: Vec<(f64, f64)>,
    grids: Vec<InventoryGrid>,
    terminal_df: f64,
}

impl<'a> StorageEngine<'a> {
    /// Lay out decision dates, feasible inventory and grids.
    ///
    /// Infeasible constraints are reported here, before any simulation.
    pub(crate) fn new(
        request: ValuationRequest<'a>,
        config: &LsmcConfig,
        basis: BasisFunctions,
    ) -> Result<Self, ValuationError> {
        let storage = request.storage;
        let valuation_date = request.valuation_date;
        let tol = config.numerical_tolerance();

        let decision_dates = storage.decision_dates(valuation_date);
        let mut all_dates = decision_dates.clone();
        all_dates.push(storage.end());
        let space = storage.inventory_space(&all_dates, request.inventory, tol)?;

        let spacing = (space.global_max() - space.global_min()) / (config.grid_points() - 1) as f64;
        let grids: Vec<InventoryGrid> = space
            .bounds()
            .iter()
            .enumerate()
            .map(|(k, &(lo, hi))| {
                if k == 0 {
                    InventoryGrid::single(request.inventory)
                } else {
                    InventoryGrid::fixed_spacing(lo, hi, spacing, tol)
                }
            })
            .collect();

        let rates = request.interest_rates;
        let mut periods = Vec::with_capacity(decision_dates.len());
        for &date in &decision_dates {
            let settlement = request.settlement_rule.settlement_date(date);
            periods.push(Period {
                date,
                years: request.model.time(valuation_date, date),
                forward: request.forward_curve.price(date)?,
                df_settle: rates.discount_factor(valuation_date, settlement)?,
                df_decision: rates.discount_factor(valuation_date, date)?,
            });
        }
        let terminal_df = rates.discount_factor(valuation_date, storage.end())?;

        debug!(
            decision_dates = periods.len(),
            spacing,
            max_levels = grids.iter().map(InventoryGrid::len).max().unwrap_or(0),
            "inventory grid built"
        );

        Ok(Self {
            request,
            basis,
            tol,
            extra_decisions: config.extra_decisions(),
            fallback: config.regression_fallback(),
            discount_deltas: config.discount_deltas(),
            periods,
            bounds: space.bounds().to_vec(),
            grids,
            terminal_df,
        })
    }

    pub(crate) fn storage(&self) -> &StorageSpecification {
        self.request.storage
    }

    pub(crate) fn periods(&self) -> &[Period] {
        &self.periods
    }

    pub(crate) fn tol(&self) -> f64 {
        self.tol
    }

    pub(crate) fn grid(&self, index: usize) -> &InventoryGrid {
        &self.grids[index]
    }

    pub(crate) fn decision_dates(&self) -> Vec<Date> {
        self.periods.iter().map(|p| p.date).collect()
    }

    fn has_terminal_value(&self) -> bool {
        matches!(self.storage().terminal(), TerminalCondition::Value(_))
    }

    /// Dates prices are needed on: decision dates, plus the end date when
    /// leftover inventory has a value.
    pub(crate) fn simulation_dates(&self) -> Vec<Date> {
        let mut dates = self.decision_dates();
        if self.has_terminal_value() {
            dates.push(self.storage().end());
        }
        dates
    }

    /// The forward curve as a single zero-volatility path.
    pub(crate) fn deterministic_paths(&self) -> Result<SimulatedPaths, ValuationError> {
        let dates = self.simulation_dates();
        let prices = dates
            .iter()
            .map(|&d| self.request.forward_curve.price(d))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(SimulatedPaths::deterministic(dates, prices, self.request.model.num_factors()))
    }

    /// Net volume range on decision date `k` from `inventory`, clipped so the
    /// next inventory stays feasible.
    pub(crate) fn volume_range(&self, k: usize, inventory: f64) -> Result<(f64, f64), ValuationError> {
        let storage = self.storage();
        let range = storage.inject_withdraw_range(self.periods[k].date, inventory)?;
        let carried = storage.after_loss(inventory);
        let (next_lo, next_hi) = self.bounds[k + 1];
        let lo = range.min_rate.max(next_lo - carried);
        let hi = range.max_rate.min(next_hi - carried);
        Ok((lo.min(hi), hi))
    }

    /// No action, full withdrawal, full injection, then interior volumes.
    ///
    /// The order is the tie-break priority.
    pub(crate) fn candidate_volumes(&self, lo: f64, hi: f64, out: &mut Vec<f64>) {
        out.clear();
        out.push(0.0_f64.max(lo).min(hi));
        out.push(lo);
        out.push(hi);
        let n = self.extra_decisions;
        out.extend((1..=n).map(|i| lo + (hi - lo) * i as f64 / (n + 1) as f64));
    }

    /// Discounted cash flow of moving `volume` on decision date `k`.
    pub(crate) fn cash_flow(&self, k: usize, spot: f64, inventory: f64, volume: f64) -> f64 {
        let storage = self.storage();
        let period = &self.periods[k];
        let holding = storage.inventory_cost() * inventory * period.df_decision;
        let trade = if volume > 0.0 {
            -volume * (1.0 + storage.injection_fuel()) * spot * period.df_settle
                - storage.injection_cost() * volume * period.df_decision
        } else {
            let withdrawn = -volume;
            withdrawn * (1.0 - storage.withdrawal_fuel()) * spot * period.df_settle
                - storage.withdrawal_cost() * withdrawn * period.df_decision
        };
        trade - holding
    }

    /// Commodity bought (negative) or sold (positive) by moving `volume`.
    fn commodity_volume(&self, volume: f64) -> f64 {
        let storage = self.storage();
        if volume > 0.0 {
            -volume * (1.0 + storage.injection_fuel())
        } else {
            -volume * (1.0 - storage.withdrawal_fuel())
        }
    }

    fn fuel(&self, volume: f64) -> f64 {
        let storage = self.storage();
        if volume > 0.0 {
            volume * storage.injection_fuel()
        } else {
            -volume * storage.withdrawal_fuel()
        }
    }

    /// Basis values for one path on decision date `k`.
    fn basis_row(&self, paths: &SimulatedPaths, k: usize, path: usize, values: &mut [f64], out: &mut [f64]) {
        let num_factors = paths.num_factors();
        for (f, slot) in values.iter_mut().take(num_factors).enumerate() {
            *slot = paths.factor_on(k, f)[path];
        }
        values[num_factors] = paths.spots_on(k)[path];
        values[num_factors + 1] = self.periods[k].years;
        self.basis.evaluate_into(values, out);
    }

    /// Basis values for every path on decision date `k`, path-major.
    pub(crate) fn raw_basis(&self, paths: &SimulatedPaths, k: usize) -> Vec<f64> {
        let num_terms = self.basis.len();
        let mut raw = vec![0.0; paths.num_paths() * num_terms];
        raw.par_chunks_mut(num_terms).enumerate().for_each_init(
            || vec![0.0; self.basis.num_values()],
            |values, (p, out)| self.basis_row(paths, k, p, values, out),
        );
        raw
    }

    /// Per-level, per-path values on the end date.
    fn terminal_values(&self, paths: &SimulatedPaths) -> Vec<Vec<f64>> {
        let m = self.periods.len();
        let grid = &self.grids[m];
        let n = paths.num_paths();
        match self.storage().terminal() {
            TerminalCondition::MustBeEmpty => vec![vec![0.0; n]; grid.len()],
            TerminalCondition::Value(f) => {
                let spots = paths.spots_on(m);
                grid.levels()
                    .iter()
                    .map(|&v| spots.iter().map(|&s| f(s, v) * self.terminal_df).collect())
                    .collect()
            }
        }
    }

    fn terminal_value(&self, paths: &SimulatedPaths, path: usize, inventory: f64) -> f64 {
        match self.storage().terminal() {
            TerminalCondition::MustBeEmpty => 0.0,
            TerminalCondition::Value(f) => f(paths.spot(path, self.periods.len()), inventory) * self.terminal_df,
        }
    }

    /// Backward induction from the end date to the first decision date.
    pub(crate) fn backward(
        &self,
        paths: &SimulatedPaths,
        progress: Option<&ProgressCallback>,
    ) -> Result<DecisionRule, ValuationError> {
        let m = self.periods.len();
        let n = paths.num_paths();
        let storage = self.storage();
        let tol = self.tol;
        let mut next_values = self.terminal_values(paths);
        let mut rules = Vec::with_capacity(m);

        for k in (0..m).rev() {
            let date = self.periods[k].date;
            let raw = self.raw_basis(paths, k);
            let regression = ContinuationRegression::prepare(date, &raw, n, self.basis.len(), tol, self.fallback)?;
            let betas: Vec<Vec<f64>> = next_values.par_iter().map(|y| regression.coefficients(y)).collect();
            let continuation: Vec<Vec<f64>> = betas.par_iter().map(|b| regression.fitted(b)).collect();

            let next_grid = &self.grids[k + 1];
            let spots = paths.spots_on(k);
            let values = self.grids[k]
                .levels()
                .par_iter()
                .map(|&inventory| {
                    let (lo, hi) = self.volume_range(k, inventory)?;
                    let mut candidates = Vec::new();
                    self.candidate_volumes(lo, hi, &mut candidates);
                    let carried = storage.after_loss(inventory);
                    let located: Vec<(usize, usize, f64)> =
                        candidates.iter().map(|&c| next_grid.locate(carried + c, tol)).collect();
                    let level_values = (0..n)
                        .map(|p| {
                            let spot = spots[p];
                            let best = pick_best(
                                candidates.iter().zip(&located).map(|(&c, &(j0, j1, w))| {
                                    self.cash_flow(k, spot, inventory, c)
                                        + lerp(continuation[j0][p], continuation[j1][p], w)
                                }),
                                tol,
                            );
                            let (j0, j1, w) = located[best];
                            self.cash_flow(k, spot, inventory, candidates[best])
                                + lerp(next_values[j0][p], next_values[j1][p], w)
                        })
                        .collect::<Vec<f64>>();
                    Ok::<_, ValuationError>(level_values)
                })
                .collect::<Result<Vec<_>, ValuationError>>()?;

            debug!(
                %date,
                levels = values.len(),
                columns = regression.layout().columns(),
                "backward step"
            );
            rules.push(DateRule {
                layout: regression.into_layout(),
                betas,
            });
            next_values = values;
            report_progress(progress, (m - k) as f64 / (m + 1) as f64)?;
        }
        rules.reverse();

        let in_sample_npv = next_values.first().map_or(0.0, |v| mean(v));
        Ok(DecisionRule {
            dates: rules,
            in_sample_npv,
        })
    }

    fn replay_path(&self, paths: &SimulatedPaths, rule: &DecisionRule, path: usize) -> Result<PathRecord, ValuationError> {
        let m = self.periods.len();
        let storage = self.storage();
        let tol = self.tol;
        let mut values = vec![0.0; self.basis.num_values()];
        let mut raw = vec![0.0; self.basis.len()];
        let mut row = Vec::new();
        let mut candidates = Vec::new();
        let mut record = PathRecord {
            inventory: Vec::with_capacity(m),
            volume: Vec::with_capacity(m),
            cash: Vec::with_capacity(m),
            end_inventory: 0.0,
            terminal: 0.0,
        };

        let mut inventory = self.request.inventory;
        for (k, date_rule) in rule.dates.iter().enumerate() {
            let (lo_k, hi_k) = self.bounds[k];
            inventory = inventory.max(lo_k).min(hi_k);
            self.basis_row(paths, k, path, &mut values, &mut raw);
            date_rule.layout.row(&raw, &mut row);

            let (lo, hi) = self.volume_range(k, inventory)?;
            self.candidate_volumes(lo, hi, &mut candidates);
            let carried = storage.after_loss(inventory);
            let spot = paths.spot(path, k);
            let next_grid = &self.grids[k + 1];
            let best = pick_best(
                candidates.iter().map(|&c| {
                    self.cash_flow(k, spot, inventory, c) + date_rule.continuation(next_grid, &row, carried + c, tol)
                }),
                tol,
            );
            let volume = candidates[best];

            record.inventory.push(inventory);
            record.volume.push(volume);
            record.cash.push(self.cash_flow(k, spot, inventory, volume));
            inventory = carried + volume;
        }

        let (lo_end, hi_end) = self.bounds[m];
        inventory = inventory.max(lo_end).min(hi_end);
        record.end_inventory = inventory;
        record.terminal = self.terminal_value(paths, path, inventory);
        Ok(record)
    }

    /// Replay `rule` along every path of `paths`.
    pub(crate) fn forward(
        &self,
        paths: &SimulatedPaths,
        rule: &DecisionRule,
        keep_panels: bool,
    ) -> Result<ForwardOutcome, ValuationError> {
        let m = self.periods.len();
        let n = paths.num_paths();
        let records = (0..n)
            .into_par_iter()
            .map(|p| self.replay_path(paths, rule, p))
            .collect::<Result<Vec<_>, ValuationError>>()?;

        let totals: Vec<f64> = records
            .iter()
            .map(|r| r.cash.iter().sum::<f64>() + r.terminal)
            .collect();
        let npv = mean(&totals);
        let std_error = if n > 1 {
            let var = totals.iter().map(|t| (t - npv).powi(2)).sum::<f64>() / (n - 1) as f64;
            (var / n as f64).sqrt()
        } else {
            0.0
        };

        let storage = self.storage();
        let inv_n = 1.0 / n as f64;
        let mut profile = StorageProfile::with_len(m);
        let mut deltas = vec![0.0; m];
        let mut panels = keep_panels.then(|| SimulationPanels::zeros(m, n));
        for (p, record) in records.iter().enumerate() {
            for k in 0..m {
                let inventory = record.inventory[k];
                let volume = record.volume[k];
                let spot = paths.spot(p, k);
                let injected = volume.max(0.0);
                let withdrawn = (-volume).max(0.0);
                let consumed = self.fuel(volume);
                let loss = inventory - storage.after_loss(inventory);

                profile.inventory[k] += inventory * inv_n;
                profile.injected[k] += injected * inv_n;
                profile.withdrawn[k] += withdrawn * inv_n;
                profile.consumed[k] += consumed * inv_n;
                profile.loss[k] += loss * inv_n;
                profile.net_volume[k] += volume * inv_n;
                profile.pv[k] += record.cash[k] * inv_n;
                deltas[k] += self.commodity_volume(volume) * spot / self.periods[k].forward * inv_n;

                if let Some(panels) = panels.as_mut() {
                    panels.spot.set(k, p, spot);
                    panels.inventory.set(k, p, inventory);
                    panels.injected.set(k, p, injected);
                    panels.withdrawn.set(k, p, withdrawn);
                    panels.consumed.set(k, p, consumed);
                    panels.loss.set(k, p, loss);
                    panels.net_volume.set(k, p, volume);
                }
            }
            profile.end_inventory += record.end_inventory * inv_n;
        }
        if self.discount_deltas {
            for (delta, period) in deltas.iter_mut().zip(&self.periods) {
                *delta *= period.df_settle;
            }
        }

        debug!(num_paths = n, npv, std_error, "forward pass complete");
        Ok(ForwardOutcome {
            npv,
            std_error,
            profile,
            deltas,
            panels,
        })
    }
}

/// Index of the highest score; a later score must beat the best by more than
/// the tolerance, relative to its size, to win.
fn pick_best(scores: impl Iterator<Item = f64>, tol: f64) -> usize {
    let mut best_index = 0;
    let mut best = f64::NEG_INFINITY;
    for (i, score) in scores.enumerate() {
        if i == 0 || score > best + tol * best.abs().max(1.0) {
            best_index = i;
            best = score;
        }
    }
    best_index
}

#[inline]
fn lerp(a: f64, b: f64, w: f64) -> f64 {
    if w == 0.0 {
        a
    } else {
        (1.0 - w) * a + w * b
    }
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<f64>() / values.len() as f64
    }
}
