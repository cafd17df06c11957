//! Grid bracketing for piecewise linear interpolation.

use crate::types::InterpolationError;
use num_traits::Float;

/// Locate the pair of grid indices bracketing `x` in an ascending grid.
///
/// Returns `(i, i)` when `x` coincides (within `tol`) with a grid point
/// below the top of the grid, and `(i, i + 1)` when it lies strictly between
/// two points or on the top point of a grid with more than one point.
/// Values within `tol` outside the grid snap to the nearest end.
///
/// # Errors
///
/// `InterpolationError::OutOfBounds` if `x` lies further than `tol` outside
/// the grid, `InterpolationError::InsufficientData` if the grid is empty.
///
/// # Example
///
/// ```
/// use storage_core::math::interpolators::bracket;
///
/// let grid = [0.0, 5.3, 9.5, 15.63, 25.8];
/// assert_eq!(bracket(&grid, 10.89, 1e-10).unwrap(), (2, 3));
/// assert_eq!(bracket(&grid, 5.3, 1e-10).unwrap(), (1, 1));
/// assert_eq!(bracket(&grid, 25.8, 1e-10).unwrap(), (3, 4));
/// ```
pub fn bracket<T: Float>(grid: &[T], x: T, tol: T) -> Result<(usize, usize), InterpolationError> {
    let n = grid.len();
    if n == 0 {
        return Err(InterpolationError::InsufficientData { got: 0, need: 1 });
    }
    let (lo_val, hi_val) = (grid[0], grid[n - 1]);
    if x < lo_val - tol || x > hi_val + tol {
        return Err(InterpolationError::OutOfBounds {
            x: x.to_f64().unwrap_or(f64::NAN),
            min: lo_val.to_f64().unwrap_or(f64::NAN),
            max: hi_val.to_f64().unwrap_or(f64::NAN),
        });
    }
    if x <= lo_val {
        return Ok((0, 0));
    }
    if x > hi_val {
        return Ok((n - 1, n - 1));
    }

    let (mut lo, mut hi) = (0, n - 1);
    while hi - lo > 1 {
        let mid = (lo + hi) / 2;
        if x < grid[mid] {
            hi = mid;
        } else {
            lo = mid;
        }
    }
    if (x - grid[lo]).abs() <= tol {
        Ok((lo, lo))
    } else {
        Ok((lo, hi))
    }
}
