//! Least-squares Monte Carlo storage valuation.
//!
//! # Algorithm
//!
//! 1. Lay out the decision dates and the feasible inventory range on each,
//!    failing early if no inventory path satisfies the constraints.
//! 2. Simulate spot prices on the decision dates.
//! 3. Walk backwards from the end date. On each date the values of the next
//!    date's inventory levels are regressed on the basis functions; each
//!    path then takes the action maximising cash flow plus regressed
//!    continuation, and is credited with the realised next-date value.
//! 4. Replay the fitted rule forwards, on the same or an independent path
//!    set, for the NPV, deltas and expected profile.
//! 5. Repeat on the forward curve alone for the intrinsic value.
//!
//! # Example
//!
//! ```no_run
//! use storage_core::market_data::{ForwardCurve, InterestRateCurve};
//! use storage_core::types::Date;
//! use storage_models::models::MultiFactorModel;
//! use storage_models::schedules::Frequency;
//! use storage_models::storage::StorageSpecification;
//! use storage_pricing::{value_storage, LsmcConfig, SameDay, ValuationRequest};
//!
//! let start = Date::from_ymd(2020, 1, 1).unwrap();
//! let storage = StorageSpecification::builder(Frequency::Daily, start, start.add_days(60))
//!     .simple_constraints(0.0, 1_000.0, 50.0, 50.0)
//!     .build()
//!     .unwrap();
//! let forward = ForwardCurve::flat(start, 20.0).unwrap();
//! let rates = InterestRateCurve::flat(0.02);
//! let model = MultiFactorModel::three_factor_seasonal(16.2, 1.15, 0.14, 0.25).unwrap();
//!
//! let request = ValuationRequest {
//!     storage: &storage,
//!     valuation_date: start,
//!     inventory: 0.0,
//!     forward_curve: &forward,
//!     interest_rates: &rates,
//!     settlement_rule: &SameDay,
//!     model: &model,
//!     basis: "1 + x_st + x_lt + x_sw + s + s**2",
//! };
//! let config = LsmcConfig::builder().num_paths(1_000).seed(11).build().unwrap();
//! let result = value_storage(&request, &config, None).unwrap();
//! println!("NPV {:.2} (intrinsic {:.2})", result.npv, result.intrinsic_npv);
//! ```

mod config;
mod engine;
mod error;
mod grid;
mod intrinsic;
mod regression;
mod request;
mod result;
mod settlement;
mod trigger;

pub use config::{LsmcConfig, LsmcConfigBuilder, RegressionFallback, DEFAULT_GRID_POINTS, DEFAULT_NUMERICAL_TOLERANCE, MAX_PATHS};
pub use error::{ConfigError, ValuationError};
pub use intrinsic::intrinsic_value;
pub use request::ValuationRequest;
pub use result::{Panel, SimulationPanels, StorageProfile, TriggerPrices, ValuationResult};
pub use settlement::{DaysAfterMonthEnd, SameDay, SettlementRule};

use std::ops::ControlFlow;
use std::time::Instant;

use tracing::info;

use crate::basis::{BasisFunctions, BasisVariables};
use crate::simulation::SpotSimulator;
use engine::StorageEngine;

/// Progress observer: receives the completed fraction, in `[0, 1]` and
/// ascending, about once per decision date. Returning
/// `ControlFlow::Break(())` cancels the valuation.
pub type ProgressCallback<'a> = dyn Fn(f64) -> ControlFlow<()> + Send + Sync + 'a;

pub(crate) fn report_progress(progress: Option<&ProgressCallback>, fraction: f64) -> Result<(), ValuationError> {
    match progress {
        Some(callback) if callback(fraction).is_break() => Err(ValuationError::Cancelled),
        _ => Ok(()),
    }
}

/// Validate inputs and lay out the engine; `None` if the storage has expired.
pub(crate) fn prepare_engine<'a>(
    request: &ValuationRequest<'a>,
    config: &LsmcConfig,
) -> Result<Option<StorageEngine<'a>>, ValuationError> {
    config.validate()?;
    request.validate()?;
    let variables = BasisVariables::for_model(request.model);
    let basis = BasisFunctions::parse(request.basis, &variables)?;
    if request.valuation_date > request.storage.end() {
        info!(
            valuation_date = %request.valuation_date,
            end = %request.storage.end(),
            "storage has expired"
        );
        return Ok(None);
    }
    StorageEngine::new(*request, config, basis).map(Some)
}

/// Value a storage facility by least-squares Monte Carlo.
///
/// # Errors
///
/// - `ValuationError::Config`, `InvalidRequest`, `Basis` or `Model` for
///   malformed inputs, before any simulation
/// - `ValuationError::Storage` with `InfeasibleConstraint` if no inventory
///   path satisfies the constraints from the starting inventory
/// - `ValuationError::MarketData` if a curve does not cover a needed date
/// - `ValuationError::RegressionSingularity` for a rank deficient basis,
///   unless [`RegressionFallback::ReducedBasis`] is configured
/// - `ValuationError::Cancelled` if `progress` asks to stop
pub fn value_storage(
    request: &ValuationRequest<'_>,
    config: &LsmcConfig,
    progress: Option<&ProgressCallback>,
) -> Result<ValuationResult, ValuationError> {
    let started = Instant::now();
    let Some(engine) = prepare_engine(request, config)? else {
        report_progress(progress, 1.0)?;
        return Ok(ValuationResult::expired());
    };
    info!(
        valuation_date = %request.valuation_date,
        inventory = request.inventory,
        num_paths = config.num_paths(),
        decision_dates = engine.periods().len(),
        "storage valuation started"
    );

    let simulator = SpotSimulator::new(
        request.model,
        request.forward_curve,
        request.valuation_date,
        engine.simulation_dates(),
    )?;
    let paths = simulator.simulate(config.num_paths(), config.seed());
    let rule = engine.backward(&paths, progress)?;

    let independent;
    let forward_paths = match config.forward_seed() {
        Some(seed) => {
            independent = simulator.simulate(config.num_paths(), seed);
            &independent
        }
        None => &paths,
    };
    let outcome = engine.forward(forward_paths, &rule, config.keep_panels())?;
    let trigger_prices = engine.trigger_prices(forward_paths, &rule, &outcome.profile)?;
    let intrinsic = engine.intrinsic(false)?;
    report_progress(progress, 1.0)?;

    let intrinsic_npv = intrinsic.outcome.npv;
    info!(
        npv = outcome.npv,
        std_error = outcome.std_error,
        in_sample_npv = rule.in_sample_npv,
        intrinsic_npv,
        elapsed_ms = started.elapsed().as_millis() as u64,
        "storage valuation complete"
    );

    Ok(ValuationResult {
        npv: outcome.npv,
        npv_std_error: outcome.std_error,
        intrinsic_npv,
        extrinsic_npv: outcome.npv - intrinsic_npv,
        dates: engine.decision_dates(),
        deltas: outcome.deltas,
        expected_profile: outcome.profile,
        intrinsic_profile: intrinsic.outcome.profile,
        trigger_prices,
        panels: outcome.panels,
    })
}
