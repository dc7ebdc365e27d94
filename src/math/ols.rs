//! Least squares solver.
//!
//! Each Levenberg–Marquardt iteration solves a small damped linear problem of
//! the form:
//!
//! ```text
//! minimize ‖r − J δ‖² + λ ‖δ‖²
//! ```
//!
//! which we express as an ordinary least squares problem on the augmented
//! system `[J; √λ·I] δ = [r; 0]`.
//!
//! Implementation choices:
//! - We use SVD so the solve stays robust when the design matrix is tall
//!   (more rows than columns) or nearly rank-deficient.
//!   (Nalgebra's `QR::solve` is intended for square systems and will panic for
//!   non-square matrices.)
//! - Parameter dimension is tiny (2–5 columns), so SVD cost is negligible.

use nalgebra::{DMatrix, DVector};

/// Solve a least squares problem using SVD.
///
/// Returns `None` if the system is too ill-conditioned to solve robustly.
pub fn solve_least_squares(x: &DMatrix<f64>, y: &DVector<f64>) -> Option<DVector<f64>> {
    let svd = x.clone().svd(true, true);

    // Try progressively looser tolerances if strict solve fails.
    for &tol in &[1e-10, 1e-8, 1e-6] {
        if let Ok(beta) = svd.solve(y, tol) {
            if beta.iter().all(|v| v.is_finite()) {
                return Some(beta);
            }
        }
    }

    None
}

/// Stack `a` on top of `√lambda · I` and `b` on top of zeros.
pub fn damped_system(
    a: &DMatrix<f64>,
    b: &DVector<f64>,
    lambda: f64,
) -> (DMatrix<f64>, DVector<f64>) {
    let (n, k) = a.shape();
    let mut aug = DMatrix::<f64>::zeros(n + k, k);
    aug.view_mut((0, 0), (n, k)).copy_from(a);
    let sl = lambda.sqrt();
    for j in 0..k {
        aug[(n + j, j)] = sl;
    }

    let mut rhs = DVector::<f64>::zeros(n + k);
    rhs.rows_mut(0, n).copy_from(b);
    (aug, rhs)
}
