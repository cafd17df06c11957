//! Numerical building blocks shared by the storage crates.
//!
//! - `interpolators`: Grid bracketing used by the value-function grid.

pub mod interpolators;
