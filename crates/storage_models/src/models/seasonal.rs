//! Three-factor seasonal spot model.
//!
//! A mean-reverting short-term factor, a non-mean-reverting long-term factor
//! and a non-mean-reverting seasonal factor whose volatility follows the
//! delivery date's position in the year. The factors are uncorrelated.

use super::multi_factor::{Factor, MultiFactorModel, VolCurve};
use crate::error::ModelError;

/// Basis variable naming the short-term factor.
pub const SHORT_TERM: &str = "x_st";
/// Basis variable naming the long-term factor.
pub const LONG_TERM: &str = "x_lt";
/// Basis variable naming the seasonal factor.
pub const SEASONAL: &str = "x_sw";

impl MultiFactorModel {
    /// Three-factor seasonal model with factors named `x_st`, `x_lt` and `x_sw`.
    ///
    /// # Example
    ///
    /// ```
    /// use storage_models::models::MultiFactorModel;
    ///
    /// let model = MultiFactorModel::three_factor_seasonal(16.2, 1.15, 0.14, 0.19).unwrap();
    /// assert_eq!(model.factor_names(), ["x_st", "x_lt", "x_sw"]);
    /// ```
    pub fn three_factor_seasonal(
        spot_mean_reversion: f64,
        spot_vol: f64,
        long_term_vol: f64,
        seasonal_vol: f64,
    ) -> Result<Self, ModelError> {
        let factors = vec![
            Factor::new(spot_mean_reversion, spot_vol),
            Factor::new(0.0, long_term_vol),
            Factor::with_curve(
                0.0,
                VolCurve::Seasonal {
                    amplitude: seasonal_vol,
                },
            ),
        ];
        let identity = vec![
            vec![1.0, 0.0, 0.0],
            vec![0.0, 1.0, 0.0],
            vec![0.0, 0.0, 1.0],
        ];
        MultiFactorModel::new(factors, identity)?.with_factor_names(vec![SHORT_TERM, LONG_TERM, SEASONAL])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use storage_core::types::Date;

    #[test]
    fn test_long_term_only_gives_long_term_vol() {
        let model = MultiFactorModel::three_factor_seasonal(16.2, 0.0, 0.14, 0.0).unwrap();
        let start = Date::from_ymd(2020, 1, 1).unwrap();
        let vol = model
            .integrated_vol(start, start.add_days(90), start.add_days(200))
            .unwrap();
        assert_relative_eq!(vol, 0.14, epsilon = 1e-13);
    }

    #[test]
    fn test_factors_are_uncorrelated() {
        let model = MultiFactorModel::three_factor_seasonal(16.2, 1.15, 0.14, 0.19).unwrap();
        assert_eq!(model.correlation().get(0, 1), 0.0);
        assert_eq!(model.correlation().get(1, 2), 0.0);
        assert_eq!(model.factors()[0].mean_reversion, 16.2);
    }

    #[test]
    fn test_negative_mean_reversion_rejected() {
        assert!(MultiFactorModel::three_factor_seasonal(-1.0, 1.15, 0.14, 0.19).is_err());
    }
}
