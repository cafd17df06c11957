//! Factor correlation matrices with Cholesky decomposition.
//!
//! ## Mathematical Background
//!
//! Given `n` independent standard normal random variables `Z = [Z1, Z2, ..., Zn]`,
//! correlated normals `W = [W1, W2, ..., Wn]` are generated as:
//!
//! ```text
//! W = L * Z
//! ```
//!
//! where `L` is the lower triangular Cholesky factor of the covariance `C = L * L^T`.
//! Factor correlations are only required to be positive semi-definite, so the
//! decomposition tolerates zero pivots (e.g. two perfectly correlated factors).
//!
//! ## Usage
//!
//! ```
//! use storage_models::models::correlation::CorrelationMatrix;
//!
//! let corr = CorrelationMatrix::new(&[
//!     1.0, 0.64,
//!     0.64, 1.0,
//! ], 2).unwrap();
//!
//! let cholesky = corr.cholesky(1e-10).unwrap();
//! let w = cholesky.transform(&[0.5, 0.8]);
//! assert_eq!(w.len(), 2);
//! assert_eq!(w[0], 0.5);
//! ```

use std::fmt;

/// Error types for correlation operations.
#[derive(Debug, Clone, PartialEq)]
pub enum CorrelationError {
    /// Matrix is not positive semi-definite beyond tolerance.
    NotPositiveSemiDefinite,
    /// Matrix dimensions are invalid.
    InvalidDimensions {
        /// Expected number of elements
        expected: usize,
        /// Number of elements supplied
        got: usize,
    },
    /// Diagonal elements are not 1.0.
    InvalidDiagonal {
        /// Diagonal index
        index: usize,
        /// Value found
        value: f64,
    },
    /// Matrix is not symmetric.
    NotSymmetric {
        /// Row index
        i: usize,
        /// Column index
        j: usize,
    },
    /// Correlation value out of range [-1, 1].
    OutOfRange {
        /// Row index
        i: usize,
        /// Column index
        j: usize,
        /// Value found
        value: f64,
    },
}

impl fmt::Display for CorrelationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CorrelationError::NotPositiveSemiDefinite => {
                write!(f, "Matrix is not positive semi-definite")
            }
            CorrelationError::InvalidDimensions { expected, got } => {
                write!(
                    f,
                    "Invalid matrix dimensions: expected {} elements, got {}",
                    expected, got
                )
            }
            CorrelationError::InvalidDiagonal { index, value } => {
                write!(
                    f,
                    "Diagonal element at index {} is {}, expected 1.0",
                    index, value
                )
            }
            CorrelationError::NotSymmetric { i, j } => {
                write!(f, "Matrix is not symmetric at ({}, {})", i, j)
            }
            CorrelationError::OutOfRange { i, j, value } => {
                write!(
                    f,
                    "Correlation at ({}, {}) is {}, must be in [-1, 1]",
                    i, j, value
                )
            }
        }
    }
}

impl std::error::Error for CorrelationError {}

const VALIDATION_EPS: f64 = 1e-10;

/// Correlation matrix with validation.
///
/// A correlation matrix must be square and symmetric with a unit diagonal and
/// off-diagonal elements in [-1, 1]. Positive semi-definiteness is checked
/// when the matrix is decomposed, not on construction.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CorrelationMatrix {
    data: Vec<f64>,
    dim: usize,
}

impl CorrelationMatrix {
    /// Create a correlation matrix from a flat row-major array of `dim * dim` elements.
    pub fn new(data: &[f64], dim: usize) -> Result<Self, CorrelationError> {
        let expected = dim * dim;
        if data.len() != expected {
            return Err(CorrelationError::InvalidDimensions {
                expected,
                got: data.len(),
            });
        }

        for i in 0..dim {
            let diag = data[i * dim + i];
            if (diag - 1.0).abs() > VALIDATION_EPS {
                return Err(CorrelationError::InvalidDiagonal {
                    index: i,
                    value: diag,
                });
            }
        }

        for i in 0..dim {
            for j in (i + 1)..dim {
                let val_ij = data[i * dim + j];
                if (val_ij - data[j * dim + i]).abs() > VALIDATION_EPS {
                    return Err(CorrelationError::NotSymmetric { i, j });
                }
                if !(-1.0..=1.0).contains(&val_ij) {
                    return Err(CorrelationError::OutOfRange { i, j, value: val_ij });
                }
            }
        }

        Ok(Self {
            data: data.to_vec(),
            dim,
        })
    }

    /// Create a matrix from rows.
    pub fn from_rows(rows: &[Vec<f64>]) -> Result<Self, CorrelationError> {
        let dim = rows.len();
        if let Some(row) = rows.iter().find(|r| r.len() != dim) {
            return Err(CorrelationError::InvalidDimensions {
                expected: dim * dim,
                got: row.len() * dim,
            });
        }
        let flat: Vec<f64> = rows.iter().flatten().copied().collect();
        Self::new(&flat, dim)
    }

    /// Create a matrix with the same correlation between every pair of factors.
    pub fn uniform(dim: usize, rho: f64) -> Result<Self, CorrelationError> {
        let data: Vec<f64> = (0..dim * dim)
            .map(|k| if k / dim == k % dim { 1.0 } else { rho })
            .collect();
        Self::new(&data, dim)
    }

    /// Create an identity correlation matrix (no correlation).
    pub fn identity(dim: usize) -> Self {
        let mut data = vec![0.0; dim * dim];
        for i in 0..dim {
            data[i * dim + i] = 1.0;
        }
        Self { data, dim }
    }

    /// Get matrix dimension.
    pub fn dim(&self) -> usize {
        self.dim
    }

    /// Get element at (i, j).
    pub fn get(&self, i: usize, j: usize) -> f64 {
        self.data[i * self.dim + j]
    }

    /// Cholesky factor of this matrix, tolerating semi-definite input.
    pub fn cholesky(&self, tol: f64) -> Result<CholeskyFactor, CorrelationError> {
        semi_definite_cholesky(&self.data, self.dim, tol)
    }
}

/// Lower triangular Cholesky decomposition of a symmetric positive
/// semi-definite matrix given in row-major order.
///
/// Pivots in `[-tol, tol]` are treated as zero and the corresponding column
/// is zeroed; a pivot below `-tol` fails with
/// [`CorrelationError::NotPositiveSemiDefinite`].
pub fn semi_definite_cholesky(
    matrix: &[f64],
    n: usize,
    tol: f64,
) -> Result<CholeskyFactor, CorrelationError> {
    if matrix.len() != n * n {
        return Err(CorrelationError::InvalidDimensions {
            expected: n * n,
            got: matrix.len(),
        });
    }
    let mut lower = vec![0.0; n * n];

    for j in 0..n {
        let mut sum = 0.0;
        for k in 0..j {
            sum += lower[j * n + k] * lower[j * n + k];
        }
        let pivot = matrix[j * n + j] - sum;
        let scale = tol * matrix[j * n + j].abs().max(1.0);
        if pivot < -scale {
            return Err(CorrelationError::NotPositiveSemiDefinite);
        }
        if pivot <= scale {
            // Column is a combination of earlier ones; the rows below must agree.
            for i in (j + 1)..n {
                let mut off = 0.0;
                for k in 0..j {
                    off += lower[i * n + k] * lower[j * n + k];
                }
                if (matrix[i * n + j] - off).abs() > scale.sqrt().max(scale) {
                    return Err(CorrelationError::NotPositiveSemiDefinite);
                }
            }
            continue;
        }
        let l_jj = pivot.sqrt();
        lower[j * n + j] = l_jj;
        for i in (j + 1)..n {
            let mut off = 0.0;
            for k in 0..j {
                off += lower[i * n + k] * lower[j * n + k];
            }
            lower[i * n + j] = (matrix[i * n + j] - off) / l_jj;
        }
    }

    Ok(CholeskyFactor { data: lower, dim: n })
}

/// Lower triangular Cholesky factor.
///
/// Used to transform independent standard normals into correlated normals.
#[derive(Clone, Debug, PartialEq)]
pub struct CholeskyFactor {
    data: Vec<f64>,
    dim: usize,
}

impl CholeskyFactor {
    /// Matrix dimension.
    pub fn dim(&self) -> usize {
        self.dim
    }

    /// Element (i, j) of the lower triangle.
    pub fn get(&self, i: usize, j: usize) -> f64 {
        self.data[i * self.dim + j]
    }

    /// Transform independent normals `z` into correlated normals `L * z`.
    pub fn transform(&self, z: &[f64]) -> Vec<f64> {
        let mut out = vec![0.0; self.dim];
        self.transform_into(z, &mut out);
        out
    }

    /// Allocation-free form of [`CholeskyFactor::transform`].
    pub fn transform_into(&self, z: &[f64], out: &mut [f64]) {
        let n = self.dim;
        for i in 0..n {
            let mut sum = 0.0;
            for k in 0..=i {
                sum += self.data[i * n + k] * z[k];
            }
            out[i] = sum;
        }
    }
}
