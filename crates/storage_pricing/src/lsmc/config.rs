//! LSMC valuation configuration.

use super::error::ConfigError;

/// Maximum number of simulation paths allowed.
pub const MAX_PATHS: usize = 10_000_000;

/// Default number of inventory grid points over the global inventory range.
pub const DEFAULT_GRID_POINTS: usize = 100;

/// Default tolerance for rank detection and inventory comparisons.
pub const DEFAULT_NUMERICAL_TOLERANCE: f64 = 1e-10;

/// Behaviour when a regression design matrix is rank deficient.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum RegressionFallback {
    /// Fail the valuation with `RegressionSingularity`.
    #[default]
    Error,
    /// Drop the directions with negligible singular values and continue.
    ReducedBasis,
}

/// LSMC engine configuration.
///
/// Immutable; use [`LsmcConfigBuilder`] to construct instances.
///
/// # Examples
///
/// ```rust
/// use storage_pricing::LsmcConfig;
///
/// let config = LsmcConfig::builder()
///     .num_paths(500)
///     .seed(11)
///     .grid_points(100)
///     .build()
///     .expect("valid configuration");
///
/// assert_eq!(config.num_paths(), 500);
/// assert_eq!(config.forward_seed(), None);
/// assert_eq!(config.numerical_tolerance(), 1e-10);
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct LsmcConfig {
    num_paths: usize,
    seed: u64,
    forward_seed: Option<u64>,
    grid_points: usize,
    numerical_tolerance: f64,
    discount_deltas: bool,
    regression_fallback: RegressionFallback,
    keep_panels: bool,
    extra_decisions: usize,
}

impl LsmcConfig {
    /// Creates a new configuration builder.
    #[inline]
    pub fn builder() -> LsmcConfigBuilder {
        LsmcConfigBuilder::default()
    }

    /// Number of simulated paths.
    #[inline]
    pub fn num_paths(&self) -> usize {
        self.num_paths
    }

    /// Seed for the regression paths.
    #[inline]
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Seed for an independent path set used by the forward pass, if any.
    #[inline]
    pub fn forward_seed(&self) -> Option<u64> {
        self.forward_seed
    }

    /// Number of inventory grid points over the global inventory range.
    #[inline]
    pub fn grid_points(&self) -> usize {
        self.grid_points
    }

    /// Tolerance for rank detection, ties and inventory comparisons.
    #[inline]
    pub fn numerical_tolerance(&self) -> f64 {
        self.numerical_tolerance
    }

    /// Whether deltas are discounted to the valuation date.
    #[inline]
    pub fn discount_deltas(&self) -> bool {
        self.discount_deltas
    }

    /// Behaviour on a rank deficient regression.
    #[inline]
    pub fn regression_fallback(&self) -> RegressionFallback {
        self.regression_fallback
    }

    /// Whether per-path panels are kept in the result.
    #[inline]
    pub fn keep_panels(&self) -> bool {
        self.keep_panels
    }

    /// Number of evenly spaced interior decisions tried between full
    /// withdrawal and full injection, in addition to the bang-bang set.
    #[inline]
    pub fn extra_decisions(&self) -> usize {
        self.extra_decisions
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if:
    /// - `num_paths` is 0 or greater than 10,000,000
    /// - `grid_points` is less than 3
    /// - `numerical_tolerance` is not positive and finite
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.num_paths == 0 || self.num_paths > MAX_PATHS {
            return Err(ConfigError::InvalidPathCount(self.num_paths));
        }
        if self.grid_points < 3 {
            return Err(ConfigError::InvalidGridPoints(self.grid_points));
        }
        if !(self.numerical_tolerance.is_finite() && self.numerical_tolerance > 0.0) {
            return Err(ConfigError::InvalidParameter {
                name: "numerical_tolerance",
                value: format!("must be positive and finite, got {}", self.numerical_tolerance),
            });
        }
        Ok(())
    }
}

/// Builder for [`LsmcConfig`].
#[derive(Clone, Debug, Default)]
pub struct LsmcConfigBuilder {
    num_paths: Option<usize>,
    seed: u64,
    forward_seed: Option<u64>,
    grid_points: Option<usize>,
    numerical_tolerance: Option<f64>,
    discount_deltas: bool,
    regression_fallback: RegressionFallback,
    keep_panels: bool,
    extra_decisions: usize,
}

impl LsmcConfigBuilder {
    /// Sets the number of simulation paths, in [1, 10_000_000].
    #[inline]
    pub fn num_paths(mut self, num_paths: usize) -> Self {
        self.num_paths = Some(num_paths);
        self
    }

    /// Sets the seed for the regression paths (default 0).
    #[inline]
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Simulate a separate path set with this seed for the forward pass.
    #[inline]
    pub fn forward_seed(mut self, seed: u64) -> Self {
        self.forward_seed = Some(seed);
        self
    }

    /// Sets the inventory grid point count (default 100, at least 3).
    #[inline]
    pub fn grid_points(mut self, grid_points: usize) -> Self {
        self.grid_points = Some(grid_points);
        self
    }

    /// Sets the numerical tolerance (default 1e-10).
    #[inline]
    pub fn numerical_tolerance(mut self, tol: f64) -> Self {
        self.numerical_tolerance = Some(tol);
        self
    }

    /// Discount deltas to the valuation date.
    #[inline]
    pub fn discount_deltas(mut self, discount: bool) -> Self {
        self.discount_deltas = discount;
        self
    }

    /// Sets the behaviour on a rank deficient regression.
    #[inline]
    pub fn regression_fallback(mut self, fallback: RegressionFallback) -> Self {
        self.regression_fallback = fallback;
        self
    }

    /// Keep per-path panels in the result.
    #[inline]
    pub fn keep_panels(mut self, keep: bool) -> Self {
        self.keep_panels = keep;
        self
    }

    /// Sets the number of interior decisions tried (default 0).
    #[inline]
    pub fn extra_decisions(mut self, extra: usize) -> Self {
        self.extra_decisions = extra;
        self
    }

    /// Builds the configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if `num_paths` is not set or any value is invalid.
    pub fn build(self) -> Result<LsmcConfig, ConfigError> {
        let num_paths = self.num_paths.ok_or(ConfigError::InvalidParameter {
            name: "num_paths",
            value: "must be specified".to_string(),
        })?;

        let config = LsmcConfig {
            num_paths,
            seed: self.seed,
            forward_seed: self.forward_seed,
            grid_points: self.grid_points.unwrap_or(DEFAULT_GRID_POINTS),
            numerical_tolerance: self.numerical_tolerance.unwrap_or(DEFAULT_NUMERICAL_TOLERANCE),
            discount_deltas: self.discount_deltas,
            regression_fallback: self.regression_fallback,
            keep_panels: self.keep_panels,
            extra_decisions: self.extra_decisions,
        };

        config.validate()?;
        Ok(config)
    }
}
