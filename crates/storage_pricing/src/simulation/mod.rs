//! Correlated multi-factor spot price simulation.
//!
//! - [`spot`]: [`SpotSimulator`], exact Ornstein-Uhlenbeck stepping between dates
//! - [`paths`]: [`SimulatedPaths`], date-major storage of spot and factor values

pub mod paths;
pub mod spot;

pub use paths::SimulatedPaths;
pub use spot::SpotSimulator;
