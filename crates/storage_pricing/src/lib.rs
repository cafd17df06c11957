//! # Storage Pricing (Layer 3: Valuation Engine)
//!
//! ## Layer 3 Role
//!
//! storage_pricing turns a storage facility and a price model into a value:
//! - Per-path random number streams ([`rng`])
//! - Correlated multi-factor spot simulation ([`simulation`])
//! - Regression basis expressions ([`basis`])
//! - Least-squares Monte Carlo backward induction, forward replay,
//!   intrinsic valuation, deltas and trigger prices ([`lsmc`])
//!
//! ## Usage Example
//!
//! ```rust
//! use storage_core::market_data::{ForwardCurve, InterestRateCurve};
//! use storage_core::types::Date;
//! use storage_models::models::{Factor, MultiFactorModel};
//! use storage_models::schedules::Frequency;
//! use storage_models::storage::StorageSpecification;
//! use storage_pricing::{intrinsic_value, LsmcConfig, SameDay, ValuationRequest};
//!
//! let start = Date::from_ymd(2021, 1, 1).unwrap();
//! let storage = StorageSpecification::builder(Frequency::Monthly, start, Date::from_ymd(2021, 3, 1).unwrap())
//!     .simple_constraints(0.0, 100.0, 100.0, 100.0)
//!     .build()
//!     .unwrap();
//! let forward = ForwardCurve::from_points(vec![
//!     (start, 10.0),
//!     (Date::from_ymd(2021, 2, 1).unwrap(), 15.0),
//! ])
//! .unwrap();
//! let model = MultiFactorModel::new(vec![Factor::new(0.0, 0.3)], 1.0).unwrap();
//! let request = ValuationRequest {
//!     storage: &storage,
//!     valuation_date: start,
//!     inventory: 0.0,
//!     forward_curve: &forward,
//!     interest_rates: &InterestRateCurve::flat(0.0),
//!     settlement_rule: &SameDay,
//!     model: &model,
//!     basis: "1 + s",
//! };
//! let config = LsmcConfig::builder().num_paths(1).build().unwrap();
//!
//! // Buy 100 in January at 10, sell in February at 15.
//! let result = intrinsic_value(&request, &config).unwrap();
//! assert!((result.npv - 500.0).abs() < 1e-9);
//! ```

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(rustdoc::private_intra_doc_links)]
// Allow unknown lints for clippy compatibility across versions
#![allow(unknown_lints)]

pub mod basis;
pub mod lsmc;
pub mod rng;
pub mod simulation;

// Re-export commonly used items for convenience
pub use lsmc::{
    intrinsic_value, value_storage, ConfigError, DaysAfterMonthEnd, LsmcConfig, LsmcConfigBuilder,
    ProgressCallback, RegressionFallback, SameDay, SettlementRule, StorageProfile, TriggerPrices,
    ValuationError, ValuationRequest, ValuationResult,
};
pub use simulation::{SimulatedPaths, SpotSimulator};
