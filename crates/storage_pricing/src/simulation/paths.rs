//! Storage for simulated spot prices and factor values.

use storage_core::types::Date;

/// Simulated spot prices and factor values on a list of dates.
///
/// Values are stored date-major so that everything observed on one date is a
/// contiguous slice of length `num_paths`, which is how the backward
/// induction consumes them.
#[derive(Debug, Clone, PartialEq)]
pub struct SimulatedPaths {
    dates: Vec<Date>,
    num_paths: usize,
    num_factors: usize,
    /// `spots[date * num_paths + path]`
    spots: Vec<f64>,
    /// `factors[(date * num_factors + factor) * num_paths + path]`
    factors: Vec<f64>,
}

impl SimulatedPaths {
    /// Assemble from path-major per-path buffers.
    ///
    /// `per_path[p]` holds `(spots, factors)` for path `p`: spots indexed by
    /// date, factors by `date * num_factors + factor`.
    pub(crate) fn from_paths(dates: Vec<Date>, num_factors: usize, per_path: Vec<(Vec<f64>, Vec<f64>)>) -> Self {
        let num_paths = per_path.len();
        let num_dates = dates.len();
        let mut spots = vec![0.0; num_dates * num_paths];
        let mut factors = vec![0.0; num_dates * num_factors * num_paths];
        for (p, (path_spots, path_factors)) in per_path.iter().enumerate() {
            for d in 0..num_dates {
                spots[d * num_paths + p] = path_spots[d];
                for f in 0..num_factors {
                    factors[(d * num_factors + f) * num_paths + p] = path_factors[d * num_factors + f];
                }
            }
        }
        Self {
            dates,
            num_paths,
            num_factors,
            spots,
            factors,
        }
    }

    /// A single path following the given prices with every factor at zero.
    ///
    /// This is the zero-volatility scenario used for intrinsic valuation.
    pub fn deterministic(dates: Vec<Date>, prices: Vec<f64>, num_factors: usize) -> Self {
        let factors = vec![0.0; dates.len() * num_factors];
        Self {
            dates,
            num_paths: 1,
            num_factors,
            spots: prices,
            factors,
        }
    }

    /// Simulation dates.
    pub fn dates(&self) -> &[Date] {
        &self.dates
    }

    /// Number of simulated paths.
    pub fn num_paths(&self) -> usize {
        self.num_paths
    }

    /// Number of simulation dates.
    pub fn num_dates(&self) -> usize {
        self.dates.len()
    }

    /// Number of model factors.
    pub fn num_factors(&self) -> usize {
        self.num_factors
    }

    /// Spot price on path `path` at date index `date_index`.
    ///
    /// # Panics
    ///
    /// If either index is out of range.
    pub fn spot(&self, path: usize, date_index: usize) -> f64 {
        assert!(path < self.num_paths, "path {} out of range", path);
        self.spots[date_index * self.num_paths + path]
    }

    /// All spot prices of one path in date order.
    pub fn path(&self, path: usize) -> Vec<f64> {
        (0..self.num_dates()).map(|d| self.spot(path, d)).collect()
    }

    /// Spot prices of every path on one date.
    pub fn spots_on(&self, date_index: usize) -> &[f64] {
        let start = date_index * self.num_paths;
        &self.spots[start..start + self.num_paths]
    }

    /// Values of one factor for every path on one date.
    pub fn factor_on(&self, date_index: usize, factor: usize) -> &[f64] {
        let start = (date_index * self.num_factors + factor) * self.num_paths;
        &self.factors[start..start + self.num_paths]
    }

    /// Mean spot price on one date.
    pub fn mean_spot(&self, date_index: usize) -> f64 {
        let spots = self.spots_on(date_index);
        if spots.is_empty() {
            return 0.0;
        }
        spots.iter().sum::<f64>() / spots.len() as f64
    }
}
