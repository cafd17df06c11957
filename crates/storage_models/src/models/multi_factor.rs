//! Multi-factor mean-reverting forward price model.
//!
//! The log of the forward price for delivery `T` observed at time `t` is driven by
//!
//! ```text
//! dF(t, T) / F(t, T) = Σ_i σ_i(T) · exp(-κ_i (T - t)) · dW_i(t)
//! ```
//!
//! with correlations `dW_i dW_j = ρ_ij dt`. Each factor is an Ornstein-Uhlenbeck
//! process with mean reversion `κ_i >= 0` (zero gives a Brownian factor) and a
//! volatility curve indexed by delivery date.
//!
//! The integrated moments over an observation window `[t1, t2]` have closed forms:
//!
//! ```text
//! Cov = Σ_ij ρ_ij σ_i(T1) σ_j(T2) · exp(-κ_i (T1 - t2) - κ_j (T2 - t2))
//!                                   · (1 - exp(-(κ_i + κ_j)(t2 - t1))) / (κ_i + κ_j)
//! ```
//!
//! where the last factor becomes `(t2 - t1)` when `κ_i + κ_j = 0`.

use storage_core::market_data::{Lookup, TimeSeries};
use storage_core::types::{Date, DayCountConvention};

use crate::error::ModelError;
use crate::models::correlation::CorrelationMatrix;

/// Mean-reversion sums below this are treated as zero in the moment formulas.
const KAPPA_EPS: f64 = 1e-12;

/// Volatility of one factor as a function of forward delivery date.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum VolCurve {
    /// Same volatility for every delivery date.
    Constant(f64),
    /// Volatility looked up by delivery date (step lookup).
    Series(TimeSeries),
    /// `amplitude · cos(2π (day_of_year - 1) / 365)`, peaking on 1 January.
    Seasonal {
        /// Peak volatility.
        amplitude: f64,
    },
}

impl VolCurve {
    /// Volatility for delivery on `date`.
    pub fn vol(&self, date: Date) -> Result<f64, ModelError> {
        match self {
            VolCurve::Constant(v) => Ok(*v),
            VolCurve::Series(series) => Ok(series.value(date, Lookup::Step)?),
            VolCurve::Seasonal { amplitude } => {
                let phase = 2.0 * std::f64::consts::PI * f64::from(date.day_of_year() - 1) / 365.0;
                Ok(amplitude * phase.cos())
            }
        }
    }
}

/// One Ornstein-Uhlenbeck factor.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Factor {
    /// Mean-reversion rate; 0 for a non-mean-reverting factor.
    pub mean_reversion: f64,
    /// Volatility by forward delivery date.
    pub vol: VolCurve,
}

impl Factor {
    /// Factor with a constant volatility.
    pub fn new(mean_reversion: f64, vol: f64) -> Self {
        Self {
            mean_reversion,
            vol: VolCurve::Constant(vol),
        }
    }

    /// Factor with a delivery-date dependent volatility curve.
    pub fn with_curve(mean_reversion: f64, vol: VolCurve) -> Self {
        Self { mean_reversion, vol }
    }
}

/// Correlation specification accepted by [`MultiFactorModel::new`].
///
/// A scalar (or integer) applies to every pair of distinct factors, so for a
/// two-factor model `0.5`, `1` and the explicit matrix are interchangeable.
#[derive(Debug, Clone, PartialEq)]
pub enum CorrelationInput {
    /// Same correlation between every pair of factors.
    Scalar(f64),
    /// Explicit matrix rows.
    Matrix(Vec<Vec<f64>>),
}

impl From<f64> for CorrelationInput {
    fn from(rho: f64) -> Self {
        CorrelationInput::Scalar(rho)
    }
}

impl From<i32> for CorrelationInput {
    fn from(rho: i32) -> Self {
        CorrelationInput::Scalar(f64::from(rho))
    }
}

impl From<Vec<Vec<f64>>> for CorrelationInput {
    fn from(rows: Vec<Vec<f64>>) -> Self {
        CorrelationInput::Matrix(rows)
    }
}

/// Sum of correlated Ornstein-Uhlenbeck factors driving log forward prices.
///
/// # Example
///
/// ```
/// use storage_core::types::Date;
/// use storage_models::models::{Factor, MultiFactorModel};
///
/// let model = MultiFactorModel::new(
///     vec![Factor::new(16.2, 1.15), Factor::new(0.0, 0.14)],
///     0.64,
/// )
/// .unwrap();
///
/// let t1 = Date::from_ymd(2019, 12, 1).unwrap();
/// let t2 = Date::from_ymd(2020, 1, 1).unwrap();
/// let fwd = Date::from_ymd(2020, 3, 1).unwrap();
///
/// let var = model.integrated_variance(t1, t2, fwd).unwrap();
/// assert!(var > 0.0);
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MultiFactorModel {
    factors: Vec<Factor>,
    correlation: CorrelationMatrix,
    day_count: DayCountConvention,
    factor_names: Vec<String>,
}

impl MultiFactorModel {
    /// Build a model from its factors and their correlations.
    ///
    /// # Errors
    ///
    /// `ModelError::ModelConfiguration` for no factors, negative or
    /// non-finite mean reversion, or a correlation matrix whose size differs
    /// from the factor count; `ModelError::Correlation` for a malformed matrix.
    pub fn new(factors: Vec<Factor>, correlation: impl Into<CorrelationInput>) -> Result<Self, ModelError> {
        let n = factors.len();
        if n == 0 {
            return Err(ModelError::ModelConfiguration(
                "at least one factor is required".to_string(),
            ));
        }
        for (i, factor) in factors.iter().enumerate() {
            if !factor.mean_reversion.is_finite() || factor.mean_reversion < 0.0 {
                return Err(ModelError::ModelConfiguration(format!(
                    "factor {} mean reversion must be finite and non-negative, got {}",
                    i, factor.mean_reversion
                )));
            }
            if let VolCurve::Constant(v) = factor.vol {
                if !v.is_finite() || v < 0.0 {
                    return Err(ModelError::ModelConfiguration(format!(
                        "factor {} volatility must be finite and non-negative, got {}",
                        i, v
                    )));
                }
            }
        }
        let correlation = match correlation.into() {
            CorrelationInput::Scalar(rho) => CorrelationMatrix::uniform(n, rho)?,
            CorrelationInput::Matrix(rows) => {
                if rows.len() != n {
                    return Err(ModelError::ModelConfiguration(format!(
                        "correlation matrix has {} rows but the model has {} factors",
                        rows.len(),
                        n
                    )));
                }
                CorrelationMatrix::from_rows(&rows)?
            }
        };
        let factor_names = (0..n).map(|i| format!("x{}", i)).collect();
        Ok(Self {
            factors,
            correlation,
            day_count: DayCountConvention::ActualActual365,
            factor_names,
        })
    }

    /// Single factor model.
    pub fn one_factor(mean_reversion: f64, vol: VolCurve) -> Result<Self, ModelError> {
        Self::new(vec![Factor::with_curve(mean_reversion, vol)], 1.0)
    }

    /// Two factor model with correlation `rho`.
    pub fn two_factor(first: Factor, second: Factor, rho: f64) -> Result<Self, ModelError> {
        Self::new(vec![first, second], rho)
    }

    /// Replace the day count used to convert dates to model time.
    pub fn with_day_count(mut self, day_count: DayCountConvention) -> Self {
        self.day_count = day_count;
        self
    }

    /// Rename the factors; the names become basis-function variables.
    pub fn with_factor_names<S: Into<String>>(mut self, names: Vec<S>) -> Result<Self, ModelError> {
        if names.len() != self.factors.len() {
            return Err(ModelError::ModelConfiguration(format!(
                "{} factor names given for {} factors",
                names.len(),
                self.factors.len()
            )));
        }
        self.factor_names = names.into_iter().map(Into::into).collect();
        Ok(self)
    }

    /// Factor names, `x0`, `x1`, ... unless renamed.
    pub fn factor_names(&self) -> &[String] {
        &self.factor_names
    }

    /// Model factors.
    pub fn factors(&self) -> &[Factor] {
        &self.factors
    }

    /// Number of factors.
    pub fn num_factors(&self) -> usize {
        self.factors.len()
    }

    /// Factor correlation matrix.
    pub fn correlation(&self) -> &CorrelationMatrix {
        &self.correlation
    }

    /// Year fraction between two dates under the model's day count.
    pub fn time(&self, from: Date, to: Date) -> f64 {
        self.day_count.year_fraction_dates(from, to)
    }

    /// Volatilities of all factors for delivery on `date`.
    pub fn factor_vols(&self, date: Date) -> Result<Vec<f64>, ModelError> {
        self.factors.iter().map(|f| f.vol.vol(date)).collect()
    }

    /// Integrated variance of `ln F(·, fwd_date)` accumulated over `[obs_start, obs_end]`.
    ///
    /// Observation beyond the delivery date contributes nothing.
    pub fn integrated_variance(&self, obs_start: Date, obs_end: Date, fwd_date: Date) -> Result<f64, ModelError> {
        self.integrated_covariance(obs_start, obs_end, fwd_date, fwd_date)
    }

    /// Integrated covariance of `ln F(·, fwd_date1)` and `ln F(·, fwd_date2)` over
    /// `[obs_start, obs_end]`.
    ///
    /// # Errors
    ///
    /// `ModelError::ModelConfiguration` if `obs_end < obs_start`, or if the
    /// variance implied by the inputs is materially negative.
    pub fn integrated_covariance(
        &self,
        obs_start: Date,
        obs_end: Date,
        fwd_date1: Date,
        fwd_date2: Date,
    ) -> Result<f64, ModelError> {
        if obs_end < obs_start {
            return Err(ModelError::ModelConfiguration(format!(
                "observation end {} precedes observation start {}",
                obs_end, obs_start
            )));
        }
        let obs_end = obs_end.min(fwd_date1).min(fwd_date2);
        if obs_end <= obs_start {
            return Ok(0.0);
        }
        let dt = self.time(obs_start, obs_end);
        let t1 = self.time(obs_end, fwd_date1);
        let t2 = self.time(obs_end, fwd_date2);
        let vols1 = self.factor_vols(fwd_date1)?;
        let vols2 = self.factor_vols(fwd_date2)?;

        let n = self.factors.len();
        let mut cov = 0.0;
        for i in 0..n {
            let k_i = self.factors[i].mean_reversion;
            for j in 0..n {
                let k_j = self.factors[j].mean_reversion;
                let k_sum = k_i + k_j;
                let window = if k_sum < KAPPA_EPS {
                    dt
                } else {
                    -(-k_sum * dt).exp_m1() / k_sum
                };
                cov += self.correlation.get(i, j)
                    * vols1[i]
                    * vols2[j]
                    * (-k_i * t1 - k_j * t2).exp()
                    * window;
            }
        }

        if fwd_date1 == fwd_date2 && cov < 0.0 {
            if cov < -1e-12 {
                return Err(ModelError::ModelConfiguration(format!(
                    "negative integrated variance {} for delivery {}; check factor correlations",
                    cov, fwd_date1
                )));
            }
            return Ok(0.0);
        }
        Ok(cov)
    }

    /// Annualised integrated volatility, `sqrt(variance / (obs_end - obs_start))`.
    pub fn integrated_vol(&self, obs_start: Date, obs_end: Date, fwd_date: Date) -> Result<f64, ModelError> {
        let var = self.integrated_variance(obs_start, obs_end, fwd_date)?;
        let dt = self.time(obs_start, obs_end.min(fwd_date));
        if dt <= 0.0 {
            return Ok(0.0);
        }
        Ok((var / dt).sqrt())
    }

    /// Integrated correlation between two delivery dates over the window.
    ///
    /// Returns 0 when either integrated variance is zero.
    pub fn integrated_correlation(
        &self,
        obs_start: Date,
        obs_end: Date,
        fwd_date1: Date,
        fwd_date2: Date,
    ) -> Result<f64, ModelError> {
        let var1 = self.integrated_variance(obs_start, obs_end, fwd_date1)?;
        let var2 = self.integrated_variance(obs_start, obs_end, fwd_date2)?;
        if var1 <= 0.0 || var2 <= 0.0 {
            return Ok(0.0);
        }
        let cov = self.integrated_covariance(obs_start, obs_end, fwd_date1, fwd_date2)?;
        Ok(cov / (var1 * var2).sqrt())
    }
}
