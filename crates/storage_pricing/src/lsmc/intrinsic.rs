//! Intrinsic valuation: the same dynamic programme on the forward curve.

use std::time::Instant;

use tracing::info;

use super::config::LsmcConfig;
use super::engine::{DecisionRule, ForwardOutcome, StorageEngine};
use super::error::ValuationError;
use super::request::ValuationRequest;
use super::result::ValuationResult;
use super::prepare_engine;
use crate::simulation::SimulatedPaths;

/// Intrinsic run: the single deterministic path, its rule and replay.
pub(crate) struct IntrinsicRun {
    pub(crate) paths: SimulatedPaths,
    pub(crate) rule: DecisionRule,
    pub(crate) outcome: ForwardOutcome,
}

impl StorageEngine<'_> {
    /// Optimise against the forward curve with no volatility.
    pub(crate) fn intrinsic(&self, keep_panels: bool) -> Result<IntrinsicRun, ValuationError> {
        let paths = self.deterministic_paths()?;
        let rule = self.backward(&paths, None)?;
        let outcome = self.forward(&paths, &rule, keep_panels)?;
        Ok(IntrinsicRun { paths, rule, outcome })
    }
}

/// Value `request` against its forward curve only.
///
/// Only the numerical settings of `config` that affect the grid, tolerance
/// and decision set are used; no paths are simulated. The returned result
/// has `npv == intrinsic_npv`, a zero extrinsic value and the intrinsic
/// schedule as both profiles.
///
/// # Errors
///
/// As [`value_storage`](super::value_storage), except that simulation and
/// regression failures cannot occur.
pub fn intrinsic_value(request: &ValuationRequest<'_>, config: &LsmcConfig) -> Result<ValuationResult, ValuationError> {
    let started = Instant::now();
    let Some(engine) = prepare_engine(request, config)? else {
        return Ok(ValuationResult::expired());
    };
    let run = engine.intrinsic(config.keep_panels())?;
    let trigger_prices = engine.trigger_prices(&run.paths, &run.rule, &run.outcome.profile)?;
    let npv = run.outcome.npv;

    info!(
        npv,
        elapsed_ms = started.elapsed().as_millis() as u64,
        "intrinsic valuation complete"
    );
    Ok(ValuationResult {
        npv,
        npv_std_error: 0.0,
        intrinsic_npv: npv,
        extrinsic_npv: 0.0,
        dates: engine.decision_dates(),
        deltas: run.outcome.deltas,
        expected_profile: run.outcome.profile.clone(),
        intrinsic_profile: run.outcome.profile,
        trigger_prices,
        panels: run.outcome.panels,
    })
}
