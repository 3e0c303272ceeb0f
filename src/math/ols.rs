//! Linear least squares via SVD.
//!
//! A Bézier curve is linear in its control points: for a fixed parameter grid
//! the sampled coordinates are `B · w` with `B` the Bernstein design matrix.
//! Fitting control points to target samples in the squared sense is therefore
//! an ordinary least squares problem, solved once per coordinate.
//!
//! Implementation notes:
//! - SVD handles tall (more samples than control points) systems robustly.
//!   (Nalgebra's `QR::solve` is intended for square systems.)
//! - We retry with looser singular-value tolerances for near-singular designs,
//!   which show up when there are barely more samples than control points.

use nalgebra::{DMatrix, DVector};

/// Solve `min ||x β - y||²`.
///
/// Returns `None` if the system is too ill-conditioned to solve robustly.
pub fn solve_least_squares(x: &DMatrix<f64>, y: &DVector<f64>) -> Option<DVector<f64>> {
    let svd = x.clone().svd(true, true);

    for &tol in &[1e-12, 1e-10, 1e-8] {
        if let Ok(beta) = svd.solve(y, tol) {
            if beta.iter().all(|v| v.is_finite()) {
                return Some(beta);
            }
        }
    }

    None
}
