//! Spot price simulator for the multi-factor model.
//!
//! Each factor is carried as a unit-volatility Ornstein-Uhlenbeck state
//! `y_i` started at zero on the valuation date and stepped exactly between
//! simulation dates:
//!
//! ```text
//! y_i(t + Δ) = exp(-κ_i Δ) · y_i(t) + ε_i
//! Cov(ε_i, ε_j) = ρ_ij · (1 - exp(-(κ_i + κ_j) Δ)) / (κ_i + κ_j)
//! ```
//!
//! The spot for delivery `T` is then
//!
//! ```text
//! S(T) = F(T) · exp(Σ_i σ_i(T) · y_i(T) - ½ · V(T))
//! ```
//!
//! where `V(T)` is the model's integrated variance from the valuation date to
//! `T`, so that `E[S(T)] = F(T)`.

use rayon::prelude::*;
use storage_core::market_data::ForwardCurve;
use storage_core::types::Date;
use storage_models::models::{semi_definite_cholesky, CholeskyFactor, MultiFactorModel};
use storage_models::ModelError;
use tracing::debug;

use super::paths::SimulatedPaths;
use crate::rng::PathRng;

/// Pivot tolerance for the step covariance decompositions.
const CHOLESKY_TOL: f64 = 1e-10;

/// Mean-reversion sums below this use the Brownian limit of the OU window.
const KAPPA_EPS: f64 = 1e-12;

/// Exact transition from the previous simulation date to one date.
#[derive(Debug, Clone)]
struct Step {
    decay: Vec<f64>,
    chol: CholeskyFactor,
    /// `ln F(T) - ½ V(T)`
    log_drift: f64,
    /// `σ_i(T)`
    vols: Vec<f64>,
}

/// Simulates spot prices on a fixed list of dates.
///
/// All per-date quantities (decays, step covariance factors, drift
/// corrections) are computed once at construction; [`simulate`](Self::simulate)
/// only draws normals.
///
/// # Example
///
/// ```
/// use storage_core::market_data::ForwardCurve;
/// use storage_core::types::Date;
/// use storage_models::models::{Factor, MultiFactorModel};
/// use storage_pricing::simulation::SpotSimulator;
///
/// let val = Date::from_ymd(2020, 1, 1).unwrap();
/// let dates: Vec<Date> = (1..=10).map(|d| val.add_days(d)).collect();
/// let model = MultiFactorModel::new(vec![Factor::new(10.0, 0.8), Factor::new(0.0, 0.2)], 0.5).unwrap();
/// let forward = ForwardCurve::flat(val, 20.0).unwrap();
///
/// let simulator = SpotSimulator::new(&model, &forward, val, dates).unwrap();
/// let paths = simulator.simulate(100, 7);
/// assert_eq!(paths.num_paths(), 100);
/// assert_eq!(paths, simulator.simulate(100, 7));
/// ```
#[derive(Debug, Clone)]
pub struct SpotSimulator {
    valuation_date: Date,
    dates: Vec<Date>,
    steps: Vec<Step>,
    num_factors: usize,
}

impl SpotSimulator {
    /// Prepare a simulator for `dates`, which must be strictly increasing and
    /// not before `valuation_date`.
    ///
    /// # Errors
    ///
    /// - `ModelError::ModelConfiguration` for badly ordered dates
    /// - `ModelError::InvalidFactorConfiguration` if the correlation matrix, or
    ///   a step covariance built from it, is not positive semi-definite
    /// - `ModelError::MarketData` if the forward curve or a volatility curve
    ///   does not cover a date
    pub fn new(
        model: &MultiFactorModel,
        forward: &ForwardCurve,
        valuation_date: Date,
        dates: Vec<Date>,
    ) -> Result<Self, ModelError> {
        if let Some(&first) = dates.first() {
            if first < valuation_date {
                return Err(ModelError::ModelConfiguration(format!(
                    "simulation date {} precedes valuation date {}",
                    first, valuation_date
                )));
            }
        }
        if let Some(w) = dates.windows(2).find(|w| w[1] <= w[0]) {
            return Err(ModelError::ModelConfiguration(format!(
                "simulation dates must be strictly increasing: {} followed by {}",
                w[0], w[1]
            )));
        }
        let n = model.num_factors();
        model
            .correlation()
            .cholesky(CHOLESKY_TOL)
            .map_err(|e| ModelError::InvalidFactorConfiguration(e.to_string()))?;

        let kappas: Vec<f64> = model.factors().iter().map(|f| f.mean_reversion).collect();
        let mut steps = Vec::with_capacity(dates.len());
        let mut prev = valuation_date;
        for &date in &dates {
            let dt = model.time(prev, date);
            let decay = kappas.iter().map(|k| (-k * dt).exp()).collect();
            let mut cov = vec![0.0; n * n];
            for i in 0..n {
                for j in 0..n {
                    let k_sum = kappas[i] + kappas[j];
                    let window = if k_sum < KAPPA_EPS {
                        dt
                    } else {
                        -(-k_sum * dt).exp_m1() / k_sum
                    };
                    cov[i * n + j] = model.correlation().get(i, j) * window;
                }
            }
            let chol = semi_definite_cholesky(&cov, n, CHOLESKY_TOL).map_err(|e| {
                ModelError::InvalidFactorConfiguration(format!("step covariance to {}: {}", date, e))
            })?;
            let variance = model.integrated_variance(valuation_date, date, date)?;
            let log_drift = forward.price(date)?.ln() - 0.5 * variance;
            steps.push(Step {
                decay,
                chol,
                log_drift,
                vols: model.factor_vols(date)?,
            });
            prev = date;
        }

        Ok(Self {
            valuation_date,
            dates,
            steps,
            num_factors: n,
        })
    }

    /// Valuation date the factors start from.
    pub fn valuation_date(&self) -> Date {
        self.valuation_date
    }

    /// Simulation dates.
    pub fn dates(&self) -> &[Date] {
        &self.dates
    }

    /// Simulate `num_paths` paths from `seed`.
    ///
    /// Paths run in parallel; path `p` always draws from stream `p` of the
    /// seed, so the output is independent of the thread count.
    pub fn simulate(&self, num_paths: usize, seed: u64) -> SimulatedPaths {
        let per_path: Vec<(Vec<f64>, Vec<f64>)> = (0..num_paths)
            .into_par_iter()
            .map(|p| self.simulate_path(seed, p as u64))
            .collect();
        debug!(
            num_paths,
            num_dates = self.dates.len(),
            seed,
            "spot paths simulated"
        );
        SimulatedPaths::from_paths(self.dates.clone(), self.num_factors, per_path)
    }

    fn simulate_path(&self, seed: u64, path: u64) -> (Vec<f64>, Vec<f64>) {
        let n = self.num_factors;
        let mut rng = PathRng::for_path(seed, path);
        let mut state = vec![0.0; n];
        let mut z = vec![0.0; n];
        let mut shock = vec![0.0; n];
        let mut spots = Vec::with_capacity(self.steps.len());
        let mut factors = Vec::with_capacity(self.steps.len() * n);

        for step in &self.steps {
            rng.fill_normal(&mut z);
            step.chol.transform_into(&z, &mut shock);
            let mut log_spot = step.log_drift;
            for i in 0..n {
                state[i] = step.decay[i] * state[i] + shock[i];
                let contribution = step.vols[i] * state[i];
                factors.push(contribution);
                log_spot += contribution;
            }
            spots.push(log_spot.exp());
        }
        (spots, factors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use storage_models::models::{Factor, VolCurve};

    fn val() -> Date {
        Date::from_ymd(2020, 1, 1).unwrap()
    }

    fn monthly_dates() -> Vec<Date> {
        (1..=6).map(|m| val().add_months(m)).collect()
    }

    #[test]
    fn test_reproducible_for_seed() {
        let model = MultiFactorModel::new(vec![Factor::new(5.0, 0.6), Factor::new(0.0, 0.2)], 0.3).unwrap();
        let forward = ForwardCurve::flat(val(), 15.0).unwrap();
        let sim = SpotSimulator::new(&model, &forward, val(), monthly_dates()).unwrap();
        let a = sim.simulate(50, 11);
        let b = sim.simulate(50, 11);
        let c = sim.simulate(50, 12);
        assert_eq!(a, b);
        assert_ne!(a.path(0), c.path(0));
    }

    #[test]
    fn test_first_paths_do_not_depend_on_path_count() {
        let model = MultiFactorModel::one_factor(3.0, VolCurve::Constant(0.4)).unwrap();
        let forward = ForwardCurve::flat(val(), 15.0).unwrap();
        let sim = SpotSimulator::new(&model, &forward, val(), monthly_dates()).unwrap();
        let few = sim.simulate(5, 3);
        let many = sim.simulate(500, 3);
        for p in 0..5 {
            assert_eq!(few.path(p), many.path(p));
        }
    }

    #[test]
    fn test_mean_matches_forward() {
        let model = MultiFactorModel::new(vec![Factor::new(8.0, 0.9), Factor::new(0.0, 0.25)], 0.6).unwrap();
        let forward = ForwardCurve::from_points(vec![(val(), 10.0), (val().add_months(3), 12.0)]).unwrap();
        let sim = SpotSimulator::new(&model, &forward, val(), monthly_dates()).unwrap();
        let paths = sim.simulate(40_000, 2024);
        for (d, &date) in monthly_dates().iter().enumerate() {
            let fwd = forward.price(date).unwrap();
            let spots = paths.spots_on(d);
            let mean = paths.mean_spot(d);
            let sd = (spots.iter().map(|s| (s - mean).powi(2)).sum::<f64>() / spots.len() as f64).sqrt();
            let se = sd / (spots.len() as f64).sqrt();
            assert!((mean - fwd).abs() < 4.0 * se, "date {}: mean {} vs forward {}", date, mean, fwd);
        }
    }

    #[test]
    fn test_log_variance_matches_model() {
        let model = MultiFactorModel::new(vec![Factor::new(4.0, 0.7), Factor::new(0.0, 0.2)], 0.4).unwrap();
        let forward = ForwardCurve::flat(val(), 20.0).unwrap();
        let dates = monthly_dates();
        let sim = SpotSimulator::new(&model, &forward, val(), dates.clone()).unwrap();
        let paths = sim.simulate(40_000, 99);
        let last = dates.len() - 1;
        let logs: Vec<f64> = paths.spots_on(last).iter().map(|s| s.ln()).collect();
        let mean = logs.iter().sum::<f64>() / logs.len() as f64;
        let var = logs.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / (logs.len() - 1) as f64;
        let expected = model.integrated_variance(val(), dates[last], dates[last]).unwrap();
        assert!((var / expected - 1.0).abs() < 0.03, "var {} expected {}", var, expected);
    }

    #[test]
    fn test_zero_vol_reproduces_forward() {
        let model = MultiFactorModel::one_factor(0.0, VolCurve::Constant(0.0)).unwrap();
        let forward = ForwardCurve::flat(val(), 17.5).unwrap();
        let sim = SpotSimulator::new(&model, &forward, val(), monthly_dates()).unwrap();
        let paths = sim.simulate(3, 1);
        for d in 0..paths.num_dates() {
            for &s in paths.spots_on(d) {
                assert_relative_eq!(s, 17.5, max_relative = 1e-14);
            }
        }
    }

    #[test]
    fn test_perfect_correlation_is_simulable() {
        let model = MultiFactorModel::new(vec![Factor::new(2.0, 0.5), Factor::new(2.0, 0.1)], 1.0).unwrap();
        let forward = ForwardCurve::flat(val(), 10.0).unwrap();
        assert!(SpotSimulator::new(&model, &forward, val(), monthly_dates()).is_ok());
    }

    #[test]
    fn test_not_psd_correlation_rejected() {
        let rows = vec![
            vec![1.0, 0.9, 0.9],
            vec![0.9, 1.0, -0.9],
            vec![0.9, -0.9, 1.0],
        ];
        let model = MultiFactorModel::new(
            vec![Factor::new(1.0, 0.2), Factor::new(1.0, 0.2), Factor::new(1.0, 0.2)],
            rows,
        )
        .unwrap();
        let forward = ForwardCurve::flat(val(), 10.0).unwrap();
        let err = SpotSimulator::new(&model, &forward, val(), monthly_dates()).unwrap_err();
        assert!(matches!(err, ModelError::InvalidFactorConfiguration(_)));
    }

    #[test]
    fn test_dates_before_valuation_rejected() {
        let model = MultiFactorModel::one_factor(1.0, VolCurve::Constant(0.2)).unwrap();
        let forward = ForwardCurve::flat(val().add_days(-30), 10.0).unwrap();
        let err = SpotSimulator::new(&model, &forward, val(), vec![val().add_days(-1)]).unwrap_err();
        assert!(matches!(err, ModelError::ModelConfiguration(_)));
    }
}
