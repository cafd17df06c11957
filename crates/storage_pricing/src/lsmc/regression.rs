//! Least-squares continuation value regression.
//!
//! On each decision date the basis functions are evaluated on every path to
//! form a design matrix. Columns that do not vary across paths all span the
//! intercept direction, so they are merged into a single intercept column;
//! the remaining columns are scaled to unit root-mean-square before a
//! singular value decomposition. One pseudo-inverse per date then serves the
//! fits for every inventory level.

use nalgebra::{DMatrix, DVector};
use storage_core::types::Date;
use tracing::warn;

use super::config::RegressionFallback;
use super::error::ValuationError;

/// How raw basis values map onto the reduced, scaled design columns.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct DesignLayout {
    intercept: bool,
    terms: Vec<usize>,
    scales: Vec<f64>,
}

impl DesignLayout {
    /// Number of reduced columns.
    pub(crate) fn columns(&self) -> usize {
        usize::from(self.intercept) + self.terms.len()
    }

    /// Reduced design row for one path's raw basis values.
    pub(crate) fn row(&self, raw: &[f64], out: &mut Vec<f64>) {
        out.clear();
        if self.intercept {
            out.push(1.0);
        }
        out.extend(self.terms.iter().zip(&self.scales).map(|(&t, s)| raw[t] / s));
    }

    /// Fitted value of a coefficient vector at a reduced row.
    pub(crate) fn predict(row: &[f64], beta: &[f64]) -> f64 {
        row.iter().zip(beta).map(|(x, b)| x * b).sum()
    }
}

/// Regression prepared for one decision date.
#[derive(Debug, Clone)]
pub(crate) struct ContinuationRegression {
    layout: DesignLayout,
    design: DMatrix<f64>,
    pinv: DMatrix<f64>,
}

impl ContinuationRegression {
    /// Prepare the regression from raw basis values, `raw[path * num_terms + term]`.
    ///
    /// # Errors
    ///
    /// `ValuationError::RegressionSingularity` if the reduced design is rank
    /// deficient and `fallback` is [`RegressionFallback::Error`].
    pub(crate) fn prepare(
        date: Date,
        raw: &[f64],
        num_paths: usize,
        num_terms: usize,
        tol: f64,
        fallback: RegressionFallback,
    ) -> Result<Self, ValuationError> {
        let mut intercept = false;
        let mut terms = Vec::new();
        let mut scales = Vec::new();
        for t in 0..num_terms {
            let first = raw[t];
            let spread = (0..num_paths)
                .map(|p| (raw[p * num_terms + t] - first).abs())
                .fold(0.0, f64::max);
            if spread <= tol * first.abs().max(1.0) {
                intercept |= first != 0.0;
            } else {
                let ms = (0..num_paths).map(|p| raw[p * num_terms + t].powi(2)).sum::<f64>() / num_paths as f64;
                terms.push(t);
                scales.push(ms.sqrt());
            }
        }
        if terms.is_empty() {
            intercept = true;
        }
        let layout = DesignLayout {
            intercept,
            terms,
            scales,
        };

        let columns = layout.columns();
        let mut row = Vec::with_capacity(columns);
        let mut design = DMatrix::zeros(num_paths, columns);
        for p in 0..num_paths {
            layout.row(&raw[p * num_terms..(p + 1) * num_terms], &mut row);
            for (c, &x) in row.iter().enumerate() {
                design[(p, c)] = x;
            }
        }

        let svd = design.clone().svd(true, true);
        let max_sv = svd.singular_values.iter().copied().fold(0.0, f64::max);
        let eps = tol * max_sv;
        let rank = svd.singular_values.iter().filter(|&&s| s > eps).count();
        if rank < columns {
            match fallback {
                RegressionFallback::Error => {
                    return Err(ValuationError::RegressionSingularity { date, rank, columns });
                }
                RegressionFallback::ReducedBasis => {
                    warn!(%date, rank, columns, "rank deficient regression, using reduced basis");
                }
            }
        }
        // Only fails when U or V were not computed.
        let pinv = svd
            .pseudo_inverse(eps)
            .map_err(|_| ValuationError::RegressionSingularity { date, rank, columns })?;

        Ok(Self { layout, design, pinv })
    }

    /// Least-squares coefficients for one target vector.
    pub(crate) fn coefficients(&self, targets: &[f64]) -> Vec<f64> {
        let y = DVector::from_column_slice(targets);
        (&self.pinv * y).iter().copied().collect()
    }

    /// Fitted values on the regression paths.
    pub(crate) fn fitted(&self, beta: &[f64]) -> Vec<f64> {
        let b = DVector::from_column_slice(beta);
        (&self.design * b).iter().copied().collect()
    }

    /// Column layout, kept after the design is dropped.
    pub(crate) fn layout(&self) -> &DesignLayout {
        &self.layout
    }

    pub(crate) fn into_layout(self) -> DesignLayout {
        self.layout
    }
}
