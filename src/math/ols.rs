//! Ordinary least squares solver.
//!
//! Every regression in this crate is a tiny polynomial problem of the form:
//!
//! ```text
//! minimize Σ (y_i - x_i^T β)^2
//! ```
//!
//! with 2 or 3 columns and a handful of rows, solved once per pruning round.
//!
//! Implementation choices:
//! - We solve via SVD so tall design matrices (more rows than columns) are
//!   handled directly. (Nalgebra's `QR::solve` is intended for square systems.)
//! - A rank-deficient design (e.g. every sample at the same carbon number) is
//!   reported as `None` rather than a minimum-norm solution.

use nalgebra::{DMatrix, DVector};

/// Singular values below `REL_RANK_TOL * σ_max` count as zero.
const REL_RANK_TOL: f64 = 1e-10;

/// Solve a least squares problem using SVD.
///
/// Returns `None` if the design is rank deficient or the solution is not finite.
pub fn solve_least_squares(x: &DMatrix<f64>, y: &DVector<f64>) -> Option<DVector<f64>> {
    if x.nrows() < x.ncols() || x.nrows() != y.len() {
        return None;
    }
    if x.iter().chain(y.iter()).any(|v| !v.is_finite()) {
        return None;
    }

    let svd = x.clone().svd(true, true);
    let sigma_max = svd.singular_values.max();
    if !(sigma_max.is_finite() && sigma_max > 0.0) {
        return None;
    }

    let tol = sigma_max * REL_RANK_TOL;
    if svd.rank(tol) < x.ncols() {
        return None;
    }

    let beta = svd.solve(y, tol).ok()?;
    if beta.iter().all(|v| v.is_finite()) {
        Some(beta)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn least_squares_solves_simple_system() {
        // Fit y = 3x + 2 on x = [0,1,2]
        let x = DMatrix::from_row_slice(3, 2, &[0.0, 1.0, 1.0, 1.0, 2.0, 1.0]);
        let y = DVector::from_row_slice(&[2.0, 5.0, 8.0]);

        let beta = solve_least_squares(&x, &y).unwrap();
        assert!((beta[0] - 3.0).abs() < 1e-10);
        assert!((beta[1] - 2.0).abs() < 1e-10);
    }

    #[test]
    fn least_squares_rejects_collinear_design() {
        // Every row has the same x: slope is unidentifiable.
        let x = DMatrix::from_row_slice(3, 2, &[34.0, 1.0, 34.0, 1.0, 34.0, 1.0]);
        let y = DVector::from_row_slice(&[5.0, 5.1, 4.9]);
        assert!(solve_least_squares(&x, &y).is_none());
    }

    #[test]
    fn least_squares_rejects_underdetermined() {
        let x = DMatrix::from_row_slice(1, 2, &[34.0, 1.0]);
        let y = DVector::from_row_slice(&[5.0]);
        assert!(solve_least_squares(&x, &y).is_none());
    }
}
