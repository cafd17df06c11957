//! Inventory levels on which the value function is stored.

use storage_core::math::interpolators::bracket;

/// Increasing inventory levels for one date.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct InventoryGrid {
    levels: Vec<f64>,
}

impl InventoryGrid {
    /// A grid holding a single inventory.
    pub(crate) fn single(inventory: f64) -> Self {
        Self {
            levels: vec![inventory],
        }
    }

    /// Levels `lo, lo + spacing, ...` below `hi`, then `hi` itself.
    ///
    /// A range narrower than `tol`, or a non-positive spacing, gives `[lo]`.
    pub(crate) fn fixed_spacing(lo: f64, hi: f64, spacing: f64, tol: f64) -> Self {
        if hi - lo <= tol || spacing <= 0.0 {
            return Self::single(lo);
        }
        let steps = ((hi - lo) / spacing).ceil() as usize;
        let mut levels = Vec::with_capacity(steps + 1);
        let mut i = 0;
        loop {
            let level = lo + spacing * i as f64;
            if level >= hi - tol {
                break;
            }
            levels.push(level);
            i += 1;
        }
        levels.push(hi);
        Self { levels }
    }

    pub(crate) fn levels(&self) -> &[f64] {
        &self.levels
    }

    pub(crate) fn len(&self) -> usize {
        self.levels.len()
    }

    /// Bracketing level indices and the weight on the upper one.
    ///
    /// `x` is clamped to the grid first.
    pub(crate) fn locate(&self, x: f64, tol: f64) -> (usize, usize, f64) {
        let first = self.levels[0];
        let last = self.levels[self.levels.len() - 1];
        let x = x.clamp(first, last);
        // Non-empty grid and clamped query: bracket cannot fail.
        let (lo, hi) = bracket(&self.levels, x, tol).unwrap_or((0, 0));
        if lo == hi {
            (lo, hi, 0.0)
        } else {
            let w = (x - self.levels[lo]) / (self.levels[hi] - self.levels[lo]);
            (lo, hi, w)
        }
    }

    /// Linear interpolation of per-level values at `x`.
    pub(crate) fn interpolate(&self, x: f64, tol: f64, value: impl Fn(usize) -> f64) -> f64 {
        let (lo, hi, w) = self.locate(x, tol);
        if w == 0.0 {
            value(lo)
        } else {
            (1.0 - w) * value(lo) + w * value(hi)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use proptest::prelude::*;

    #[test]
    fn test_fixed_spacing_appends_upper_bound() {
        let grid = InventoryGrid::fixed_spacing(0.0, 25.0, 10.0, 1e-10);
        assert_eq!(grid.levels(), &[0.0, 10.0, 20.0, 25.0]);

        let grid = InventoryGrid::fixed_spacing(5.0, 25.0, 10.0, 1e-10);
        assert_eq!(grid.levels(), &[5.0, 15.0, 25.0]);
    }

    #[test]
    fn test_degenerate_range() {
        assert_eq!(InventoryGrid::fixed_spacing(3.0, 3.0, 1.0, 1e-10).levels(), &[3.0]);
        assert_eq!(InventoryGrid::fixed_spacing(0.0, 3.0, 0.0, 1e-10).levels(), &[0.0]);
    }

    #[test]
    fn test_locate() {
        let grid = InventoryGrid::fixed_spacing(0.0, 100.0, 25.0, 1e-10);
        assert_eq!(grid.locate(50.0, 1e-10), (2, 2, 0.0));
        let (lo, hi, w) = grid.locate(60.0, 1e-10);
        assert_eq!((lo, hi), (2, 3));
        assert_relative_eq!(w, 0.4, epsilon = 1e-14);
        assert_eq!(grid.locate(-5.0, 1e-10), (0, 0, 0.0));
        let (_, hi, w) = grid.locate(150.0, 1e-10);
        assert_eq!(hi, 4);
        assert_relative_eq!(w, 1.0);
    }

    #[test]
    fn test_interpolate_single_level() {
        let grid = InventoryGrid::single(7.0);
        assert_eq!(grid.interpolate(7.0, 1e-10, |_| 3.5), 3.5);
        assert_eq!(grid.interpolate(9.0, 1e-10, |_| 3.5), 3.5);
    }

    proptest! {
        #[test]
        fn prop_interpolation_reproduces_linear(x in 0.0f64..100.0) {
            let grid = InventoryGrid::fixed_spacing(0.0, 100.0, 7.0, 1e-10);
            let levels = grid.levels().to_vec();
            let y = grid.interpolate(x, 1e-10, |i| 2.0 * levels[i] - 1.0);
            prop_assert!((y - (2.0 * x - 1.0)).abs() < 1e-9);
        }

        #[test]
        fn prop_levels_strictly_increasing(lo in 0.0f64..50.0, width in 0.0f64..500.0, spacing in 0.1f64..40.0) {
            let grid = InventoryGrid::fixed_spacing(lo, lo + width, spacing, 1e-10);
            prop_assert!(grid.levels().windows(2).all(|w| w[1] > w[0]));
            prop_assert_eq!(grid.levels()[0], lo);
        }
    }
}
