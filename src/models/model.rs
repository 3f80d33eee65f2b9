//! Model evaluation for the linear and quadratic ECN families.
//!
//! The fitter relies on two primitive operations:
//! - build a design row for a given carbon number (for OLS)
//! - predict retention time given coefficients (for residuals and annotation)
//!
//! Coefficients are ordered highest power first, so the OLS solution vector can
//! be used as-is.

use crate::domain::FitKind;

/// Fill a design row for the given fit kind.
///
/// The intercept column comes last.
///
/// # Panics
/// Panics if `out` does not have length `kind.coeff_len()`.
pub fn fill_design_row(kind: FitKind, x: f64, out: &mut [f64]) {
    match kind {
        FitKind::Linear => {
            out[0] = x;
            out[1] = 1.0;
        }
        FitKind::Quadratic => {
            out[0] = x * x;
            out[1] = x;
            out[2] = 1.0;
        }
    }
}

/// Predict `y(x)` for the given fit kind.
pub fn predict(kind: FitKind, x: f64, coefficients: &[f64]) -> f64 {
    match kind {
        FitKind::Linear => coefficients[0] * x + coefficients[1],
        FitKind::Quadratic => (coefficients[0] * x + coefficients[1]) * x + coefficients[2],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn predict_matches_design_row_dot_product() {
        let coeffs = [0.1, -1.0, 4.0];
        let mut row = [0.0; 3];
        fill_design_row(FitKind::Quadratic, 7.0, &mut row);
        let dot: f64 = row.iter().zip(coeffs.iter()).map(|(a, b)| a * b).sum();
        assert!((predict(FitKind::Quadratic, 7.0, &coeffs) - dot).abs() < 1e-12);
    }

    #[test]
    fn predict_linear() {
        assert!((predict(FitKind::Linear, 3.0, &[2.0, 1.0]) - 7.0).abs() < 1e-12);
    }
}
