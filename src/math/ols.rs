//! Least squares solver.
//!
//! Used for the linear trend in the climate summary:
//!
//! ```text
//! minimize Σ (y_i - x_i^T β)^2
//! ```
//!
//! Implementation choices:
//! - SVD handles the tall design matrix (many months, two columns).
//!   (Nalgebra's `QR::solve` is intended for square systems and will panic for
//!   non-square matrices.)
//! - A few tolerances are tried so nearly collinear inputs still solve.

use nalgebra::{DMatrix, DVector};

/// Solve a least squares problem using SVD.
///
/// Returns `None` if the system is too ill-conditioned to solve robustly.
pub fn solve_least_squares(x: &DMatrix<f64>, y: &DVector<f64>) -> Option<DVector<f64>> {
    let svd = x.clone().svd(true, true);

    for &tol in &[1e-10, 1e-8, 1e-6] {
        if let Ok(beta) = svd.solve(y, tol) {
            if beta.iter().all(|v| v.is_finite()) {
                return Some(beta);
            }
        }
    }

    None
}

/// Fit `y = a + b t` and return `(a, b)`.
///
/// `None` for fewer than two points or a constant `t`.
pub fn linear_fit(t: &[f64], y: &[f64]) -> Option<(f64, f64)> {
    if t.len() != y.len() || t.len() < 2 {
        return None;
    }
    let t0 = t[0];
    if t.iter().all(|&v| (v - t0).abs() < 1e-12) {
        return None;
    }

    let x = DMatrix::from_fn(t.len(), 2, |i, j| if j == 0 { 1.0 } else { t[i] });
    let y = DVector::from_column_slice(y);
    let beta = solve_least_squares(&x, &y)?;
    Some((beta[0], beta[1]))
}
