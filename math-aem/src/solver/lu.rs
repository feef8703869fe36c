//! LU decomposition solver
//!
//! LU factorization with partial pivoting for the dense element system. The
//! factorization checks a [`CancelToken`] once per pivot column.

use ndarray::{Array1, Array2};
use thiserror::Error;

use super::CancelToken;

/// Pivots below this fraction of the largest matrix entry count as zero
const SINGULAR_TOLERANCE: f64 = 1e-13;

/// Errors that can occur during LU factorization
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LuError {
    /// No usable pivot was found
    #[error("Matrix is singular or nearly singular")]
    SingularMatrix,
    /// Non-square matrix or right-hand side of the wrong length
    #[error("Matrix dimensions mismatch: expected {expected}, got {got}")]
    DimensionMismatch {
        /// Expected size
        expected: usize,
        /// Actual size
        got: usize,
    },
    /// The cancel token fired during factorization
    #[error("Factorization cancelled")]
    Cancelled,
}

/// LU factorization result
///
/// Stores L and U factors along with pivot information
#[derive(Debug, Clone)]
pub struct LuFactorization {
    /// Combined L and U matrices (L is unit lower triangular, stored below diagonal)
    pub lu: Array2<f64>,
    /// Row permutation applied during pivoting
    pub pivots: Vec<usize>,
    /// Matrix dimension
    pub n: usize,
}

impl LuFactorization {
    /// Solve Ax = b using the pre-computed LU factorization
    pub fn solve(&self, b: &Array1<f64>) -> Result<Array1<f64>, LuError> {
        if b.len() != self.n {
            return Err(LuError::DimensionMismatch {
                expected: self.n,
                got: b.len(),
            });
        }

        // Forward substitution: Ly = Pb
        let mut x = Array1::from_iter(self.pivots.iter().map(|&p| b[p]));
        for i in 0..self.n {
            for j in 0..i {
                x[i] -= self.lu[[i, j]] * x[j];
            }
        }

        // Backward substitution: Ux = y
        for i in (0..self.n).rev() {
            for j in (i + 1)..self.n {
                x[i] -= self.lu[[i, j]] * x[j];
            }
            x[i] /= self.lu[[i, i]];
        }

        Ok(x)
    }
}

/// Compute LU factorization with partial pivoting
pub fn lu_factorize(a: &Array2<f64>, cancel: &CancelToken) -> Result<LuFactorization, LuError> {
    let n = a.nrows();
    if n != a.ncols() {
        return Err(LuError::DimensionMismatch {
            expected: n,
            got: a.ncols(),
        });
    }

    let scale = a.iter().fold(0.0f64, |m, v| m.max(v.abs()));
    let threshold = scale * SINGULAR_TOLERANCE;

    let mut lu = a.clone();
    let mut pivots: Vec<usize> = (0..n).collect();

    for k in 0..n {
        if cancel.is_cancelled() {
            return Err(LuError::Cancelled);
        }

        // Find pivot
        let mut max_val = lu[[k, k]].abs();
        let mut max_row = k;
        for i in (k + 1)..n {
            let val = lu[[i, k]].abs();
            if val > max_val {
                max_val = val;
                max_row = i;
            }
        }

        if max_val <= threshold || !max_val.is_finite() {
            return Err(LuError::SingularMatrix);
        }

        if max_row != k {
            for j in 0..n {
                lu.swap([k, j], [max_row, j]);
            }
            pivots.swap(k, max_row);
        }

        // Compute multipliers and eliminate
        let pivot = lu[[k, k]];
        for i in (k + 1)..n {
            let mult = lu[[i, k]] / pivot;
            lu[[i, k]] = mult;
            for j in (k + 1)..n {
                let update = mult * lu[[k, j]];
                lu[[i, j]] -= update;
            }
        }
    }

    Ok(LuFactorization { lu, pivots, n })
}

/// Solve Ax = b using LU decomposition
pub fn lu_solve(
    a: &Array2<f64>,
    b: &Array1<f64>,
    cancel: &CancelToken,
) -> Result<Array1<f64>, LuError> {
    if b.len() != a.nrows() {
        return Err(LuError::DimensionMismatch {
            expected: a.nrows(),
            got: b.len(),
        });
    }
    lu_factorize(a, cancel)?.solve(b)
}
