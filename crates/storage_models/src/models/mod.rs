//! Price models driving the spot simulation.
//!
//! - [`multi_factor`]: Correlated Ornstein-Uhlenbeck factor model and its integrated moments
//! - [`correlation`]: Correlation matrices and semi-definite Cholesky decomposition
//! - [`seasonal`]: Three-factor seasonal constructor and its factor names

pub mod correlation;
pub mod multi_factor;
pub mod seasonal;

pub use correlation::{semi_definite_cholesky, CholeskyFactor, CorrelationError, CorrelationMatrix};
pub use multi_factor::{CorrelationInput, Factor, MultiFactorModel, VolCurve};
