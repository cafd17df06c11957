//! Interpolation helpers for numerical computation.
//!
//! - [`bracket`]: Locates the grid interval containing a value, snapping to
//!   grid points within a tolerance
//!
//! ## Example
//!
//! ```
//! use storage_core::math::interpolators::bracket;
//!
//! let inventory = [0.0, 50_000.0, 100_000.0];
//! let values: [f64; 3] = [2_000.0, 1_500.0, 1_000.0];
//!
//! let (lo, hi) = bracket(&inventory, 75_000.0, 1e-10).unwrap();
//! let w = (75_000.0 - inventory[lo]) / (inventory[hi] - inventory[lo]);
//! let value = values[lo] + w * (values[hi] - values[lo]);
//! assert!((value - 1_250.0).abs() < 1e-10);
//! ```

mod bracket;

pub use bracket::bracket;
