//! Valuation configuration management
//!
//! A run is described by one TOML file holding the facility, market data,
//! price model and numerical settings. A few settings can be overridden from
//! the environment:
//!
//! - `STORAGE_VALUER_NUM_PATHS`
//! - `STORAGE_VALUER_SEED`
//! - `STORAGE_VALUER_LOG_LEVEL`

use std::path::Path;
use std::str::FromStr;

use serde::Deserialize;
use thiserror::Error;

use storage_core::market_data::{ForwardCurve, InterestRateCurve, MarketDataError};
use storage_core::types::Date;
use storage_models::models::{CorrelationInput, Factor, MultiFactorModel};
use storage_models::storage::{build_storage, StorageParams, StorageSpecification};
use storage_models::ModelError;
use storage_pricing::{DaysAfterMonthEnd, LsmcConfig, RegressionFallback, SameDay, SettlementRule};

/// Environment variable overriding the number of paths
pub const ENV_NUM_PATHS: &str = "STORAGE_VALUER_NUM_PATHS";
/// Environment variable overriding the seed
pub const ENV_SEED: &str = "STORAGE_VALUER_SEED";
/// Environment variable overriding the log level
pub const ENV_LOG_LEVEL: &str = "STORAGE_VALUER_LOG_LEVEL";

/// Configuration error types
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid log level: {0}. Must be one of: trace, debug, info, warn, error")]
    InvalidLogLevel(String),

    #[error("Configuration file error: {0}")]
    FileError(String),

    #[error("Environment variable error: {0}")]
    EnvError(String),

    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error(transparent)]
    Numerics(#[from] storage_pricing::ConfigError),
}

/// Log levels supported by the CLI
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl FromStr for LogLevel {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "trace" => Ok(LogLevel::Trace),
            "debug" => Ok(LogLevel::Debug),
            "info" => Ok(LogLevel::Info),
            "warn" => Ok(LogLevel::Warn),
            "error" => Ok(LogLevel::Error),
            _ => Err(ConfigError::InvalidLogLevel(s.to_string())),
        }
    }
}

impl LogLevel {
    /// Convert log level to tracing filter string
    pub fn as_filter_str(&self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_filter_str())
    }
}

/// Top-level valuation configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ValuerConfig {
    /// Log level used when `RUST_LOG` is not set
    #[serde(default)]
    pub log_level: LogLevel,
    /// Valuation date, inventory and basis
    pub valuation: ValuationSection,
    /// Facility definition
    pub storage: StorageParams,
    /// Curves and settlement convention
    pub market: MarketSection,
    /// Spot price model
    pub model: ModelConfig,
    /// LSMC settings
    #[serde(default)]
    pub numerics: NumericsConfig,
}

/// What is being valued, and on which date
#[derive(Debug, Clone, Deserialize)]
pub struct ValuationSection {
    pub date: Date,
    pub inventory: f64,
    /// Regression basis expression, e.g. `"1 + s + s**2 + x_st"`
    pub basis: String,
}

/// One forward curve point
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct PricePoint {
    pub date: Date,
    pub price: f64,
}

/// One interest rate pillar
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct RatePoint {
    pub date: Date,
    pub rate: f64,
}

/// When commodity cash flows settle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SettlementConfig {
    #[default]
    SameDay,
    DaysAfterMonthEnd { days: i64 },
}

impl SettlementConfig {
    /// Settlement rule for the request
    pub fn rule(&self) -> Box<dyn SettlementRule> {
        match *self {
            SettlementConfig::SameDay => Box::new(SameDay),
            SettlementConfig::DaysAfterMonthEnd { days } => Box::new(DaysAfterMonthEnd(days)),
        }
    }
}

/// Market data
#[derive(Debug, Clone, Deserialize)]
pub struct MarketSection {
    /// Forward prices, read as a step function between points
    pub forward_curve: Vec<PricePoint>,
    /// Flat continuously compounded rate, used when no pillars are given
    #[serde(default)]
    pub interest_rate: f64,
    #[serde(default)]
    pub rate_pillars: Vec<RatePoint>,
    #[serde(default)]
    pub settlement: SettlementConfig,
}

impl MarketSection {
    /// Build the forward curve
    pub fn forward_curve(&self) -> Result<ForwardCurve, MarketDataError> {
        ForwardCurve::from_points(self.forward_curve.iter().map(|p| (p.date, p.price)).collect())
    }

    /// Build the discount curve
    pub fn interest_rates(&self) -> Result<InterestRateCurve, MarketDataError> {
        if self.rate_pillars.is_empty() {
            Ok(InterestRateCurve::flat(self.interest_rate))
        } else {
            InterestRateCurve::from_pillars(self.rate_pillars.iter().map(|p| (p.date, p.rate)).collect())
        }
    }
}

/// One Ornstein-Uhlenbeck factor
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct FactorConfig {
    pub mean_reversion: f64,
    pub vol: f64,
}

/// Factor correlation: one value for every pair, or explicit rows
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum CorrelationConfig {
    Scalar(f64),
    Matrix(Vec<Vec<f64>>),
}

impl Default for CorrelationConfig {
    fn default() -> Self {
        CorrelationConfig::Scalar(0.0)
    }
}

impl From<CorrelationConfig> for CorrelationInput {
    fn from(config: CorrelationConfig) -> Self {
        match config {
            CorrelationConfig::Scalar(rho) => CorrelationInput::Scalar(rho),
            CorrelationConfig::Matrix(rows) => CorrelationInput::Matrix(rows),
        }
    }
}

/// Spot price model
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ModelConfig {
    ThreeFactorSeasonal {
        spot_mean_reversion: f64,
        spot_vol: f64,
        long_term_vol: f64,
        seasonal_vol: f64,
    },
    MultiFactor {
        factors: Vec<FactorConfig>,
        #[serde(default)]
        correlation: CorrelationConfig,
        /// Basis variable names; `x0`, `x1`, ... when empty
        #[serde(default)]
        names: Vec<String>,
    },
}

impl ModelConfig {
    /// Build the model
    pub fn build(&self) -> Result<MultiFactorModel, ModelError> {
        match self {
            ModelConfig::ThreeFactorSeasonal {
                spot_mean_reversion,
                spot_vol,
                long_term_vol,
                seasonal_vol,
            } => MultiFactorModel::three_factor_seasonal(*spot_mean_reversion, *spot_vol, *long_term_vol, *seasonal_vol),
            ModelConfig::MultiFactor {
                factors,
                correlation,
                names,
            } => {
                let factors = factors.iter().map(|f| Factor::new(f.mean_reversion, f.vol)).collect();
                let model = MultiFactorModel::new(factors, correlation.clone())?;
                if names.is_empty() {
                    Ok(model)
                } else {
                    model.with_factor_names(names.clone())
                }
            }
        }
    }
}

fn default_num_paths() -> usize {
    1_000
}

fn default_seed() -> u64 {
    12
}

fn default_grid_points() -> usize {
    storage_pricing::lsmc::DEFAULT_GRID_POINTS
}

fn default_tolerance() -> f64 {
    storage_pricing::lsmc::DEFAULT_NUMERICAL_TOLERANCE
}

/// LSMC settings
#[derive(Debug, Clone, Deserialize)]
pub struct NumericsConfig {
    #[serde(default = "default_num_paths")]
    pub num_paths: usize,
    #[serde(default = "default_seed")]
    pub seed: u64,
    /// Independent seed for the forward replay
    #[serde(default)]
    pub forward_seed: Option<u64>,
    #[serde(default = "default_grid_points")]
    pub grid_points: usize,
    #[serde(default = "default_tolerance")]
    pub numerical_tolerance: f64,
    #[serde(default)]
    pub discount_deltas: bool,
    #[serde(default)]
    pub regression_fallback: RegressionFallback,
    #[serde(default)]
    pub extra_decisions: usize,
}

impl Default for NumericsConfig {
    fn default() -> Self {
        Self {
            num_paths: default_num_paths(),
            seed: default_seed(),
            forward_seed: None,
            grid_points: default_grid_points(),
            numerical_tolerance: default_tolerance(),
            discount_deltas: false,
            regression_fallback: RegressionFallback::default(),
            extra_decisions: 0,
        }
    }
}

impl NumericsConfig {
    /// Build the engine configuration
    pub fn lsmc(&self, keep_panels: bool) -> Result<LsmcConfig, storage_pricing::ConfigError> {
        let builder = LsmcConfig::builder()
            .num_paths(self.num_paths)
            .seed(self.seed)
            .grid_points(self.grid_points)
            .numerical_tolerance(self.numerical_tolerance)
            .discount_deltas(self.discount_deltas)
            .regression_fallback(self.regression_fallback)
            .keep_panels(keep_panels)
            .extra_decisions(self.extra_decisions);
        match self.forward_seed {
            Some(seed) => builder.forward_seed(seed).build(),
            None => builder.build(),
        }
    }
}

impl ValuerConfig {
    /// Parse configuration from TOML text
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::FileError(format!("Failed to parse TOML: {}", e)))
    }

    /// Load configuration from a TOML file
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::FileError(format!("Failed to read {}: {}", path.display(), e)))?;
        Self::from_toml(&content)
    }

    /// Apply overrides from the process environment
    pub fn apply_env(&mut self) -> Result<(), ConfigError> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides from `lookup`, keyed by environment variable name
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(value) = lookup(ENV_NUM_PATHS) {
            self.numerics.num_paths = value
                .trim()
                .parse()
                .map_err(|_| ConfigError::EnvError(format!("{}={} is not a path count", ENV_NUM_PATHS, value)))?;
        }
        if let Some(value) = lookup(ENV_SEED) {
            self.numerics.seed = value
                .trim()
                .parse()
                .map_err(|_| ConfigError::EnvError(format!("{}={} is not a seed", ENV_SEED, value)))?;
        }
        if let Some(value) = lookup(ENV_LOG_LEVEL) {
            self.log_level = LogLevel::from_str(value.trim())?;
        }
        Ok(())
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.valuation.inventory.is_finite() || self.valuation.inventory < 0.0 {
            return Err(ConfigError::Invalid(format!(
                "inventory must be finite and non-negative, got {}",
                self.valuation.inventory
            )));
        }
        if self.valuation.basis.trim().is_empty() {
            return Err(ConfigError::Invalid("basis expression is empty".to_string()));
        }
        if self.market.forward_curve.is_empty() {
            return Err(ConfigError::Invalid("forward curve has no points".to_string()));
        }
        if !self.market.interest_rate.is_finite() {
            return Err(ConfigError::Invalid("interest rate must be finite".to_string()));
        }
        self.numerics.lsmc(false)?;
        Ok(())
    }
}

/// Everything a request borrows, built from a configuration
pub struct Inputs {
    pub storage: StorageSpecification,
    pub forward_curve: ForwardCurve,
    pub interest_rates: InterestRateCurve,
    pub settlement: Box<dyn SettlementRule>,
    pub model: MultiFactorModel,
}

impl Inputs {
    /// Build the facility, curves and model
    pub fn build(config: &ValuerConfig) -> Result<Self, crate::CliError> {
        Ok(Self {
            storage: build_storage(&config.storage)?,
            forward_curve: config.market.forward_curve()?,
            interest_rates: config.market.interest_rates()?,
            settlement: config.market.settlement.rule(),
            model: config.model.build()?,
        })
    }
}
