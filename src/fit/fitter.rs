//! Robust fitting routines for a single `(ontology, double bond)` subgroup.
//!
//! Given the range-filtered samples of one subgroup we repeatedly:
//! - fit a line and (with ≥3 points) a parabola by OLS
//! - stop once either clears the R² bar (linear only counts if its slope is
//!   consistent with the ontology's reference slope), or fewer than 3 points remain
//! - otherwise drop the point with the largest line residual and refit
//!
//! The sample arena never changes; every round works on a fresh list of
//! surviving arena indices.

use log::debug;
use nalgebra::{DMatrix, DVector};

use crate::domain::{FitCandidate, FitKind, Sample, Thresholds};
use crate::error::FitError;
use crate::math::{argmax_abs, r_squared, solve_least_squares};
use crate::models::{fill_design_row, predict};

/// Final state of the fit/prune loop for one subgroup.
#[derive(Debug, Clone)]
pub struct FitOutcome {
    pub linear: Result<FitCandidate, FitError>,
    pub quadratic: Result<FitCandidate, FitError>,
    /// Carbon numbers / retention times the loop started from.
    pub input_x: Vec<f64>,
    pub input_y: Vec<f64>,
    /// Points still in the working set when the loop stopped.
    pub surviving_x: Vec<f64>,
    pub surviving_y: Vec<f64>,
    /// Arena indices removed, in pruning order.
    pub pruned: Vec<usize>,
}

impl FitOutcome {
    /// Linear R², or 0 when the fit was not available.
    pub fn linear_r2(&self) -> f64 {
        self.linear.as_ref().map(|c| c.r_squared).unwrap_or(0.0)
    }

    /// Quadratic R², or 0 when the fit was not available.
    pub fn quadratic_r2(&self) -> f64 {
        self.quadratic.as_ref().map(|c| c.r_squared).unwrap_or(0.0)
    }

    /// Number of pruning rounds performed.
    pub fn rounds(&self) -> usize {
        self.pruned.len()
    }
}

/// Fit one regression family on `(x, y)`.
pub fn fit_candidate(kind: FitKind, x: &[f64], y: &[f64]) -> Result<FitCandidate, FitError> {
    let n = x.len();
    let p = kind.coeff_len();
    if n < kind.min_points() {
        return Err(FitError::InsufficientData {
            kind,
            needed: kind.min_points(),
            got: n,
        });
    }

    let mut design = DMatrix::<f64>::zeros(n, p);
    let mut row = vec![0.0; p];
    for (i, &xi) in x.iter().enumerate() {
        fill_design_row(kind, xi, &mut row);
        for j in 0..p {
            design[(i, j)] = row[j];
        }
    }
    let obs = DVector::from_row_slice(y);

    let beta = solve_least_squares(&design, &obs).ok_or(FitError::NonConvergent { kind })?;
    let coefficients: Vec<f64> = beta.iter().copied().collect();

    let residuals: Vec<f64> = x
        .iter()
        .zip(y.iter())
        .map(|(&xi, &yi)| yi - predict(kind, xi, &coefficients))
        .collect();
    let r_squared = r_squared(y, &residuals).ok_or(FitError::NonConvergent { kind })?;

    Ok(FitCandidate {
        kind,
        coefficients,
        r_squared,
        residuals,
    })
}

/// Linear least-squares slope of carbon number vs retention time.
pub fn linear_slope(samples: &[Sample]) -> Result<f64, FitError> {
    let (x, y) = split_xy(samples);
    let fit = fit_candidate(FitKind::Linear, &x, &y)?;
    fit.slope().ok_or(FitError::NonConvergent {
        kind: FitKind::Linear,
    })
}

/// Run the fit/prune loop on a subgroup's range-filtered samples.
pub fn robust_fit(
    samples: &[Sample],
    global_slope: Option<f64>,
    thresholds: &Thresholds,
) -> FitOutcome {
    let (x_all, y_all) = split_xy(samples);
    let mut keep: Vec<usize> = (0..samples.len()).collect();
    let mut pruned = Vec::new();

    loop {
        let x: Vec<f64> = keep.iter().map(|&i| x_all[i]).collect();
        let y: Vec<f64> = keep.iter().map(|&i| y_all[i]).collect();

        let linear = fit_candidate(FitKind::Linear, &x, &y);
        let quadratic = fit_candidate(FitKind::Quadratic, &x, &y);

        let linear_gated = match &linear {
            Ok(c) if slope_passes(c, global_slope, thresholds) => c.r_squared,
            _ => 0.0,
        };
        let quadratic_r2 = quadratic.as_ref().map(|c| c.r_squared).unwrap_or(0.0);

        let done = linear_gated >= thresholds.r2_min
            || quadratic_r2 >= thresholds.r2_min
            || keep.len() < 3;

        let worst = if done {
            None
        } else {
            worst_point(linear.as_ref().ok(), quadratic.as_ref().ok())
        };

        let Some(worst) = worst else {
            return FitOutcome {
                linear,
                quadratic,
                input_x: x_all,
                input_y: y_all,
                surviving_x: x,
                surviving_y: y,
                pruned,
            };
        };

        let removed = keep[worst];
        debug!(
            "round {}: n={} r2_linear={:.4} (gated {:.4}) r2_quad={:.4}, dropping x={} y={}",
            pruned.len() + 1,
            keep.len(),
            linear.as_ref().map(|c| c.r_squared).unwrap_or(0.0),
            linear_gated,
            quadratic_r2,
            x_all[removed],
            y_all[removed],
        );
        keep = keep.into_iter().filter(|&i| i != removed).collect();
        pruned.push(removed);
    }
}

fn slope_passes(c: &FitCandidate, global_slope: Option<f64>, thresholds: &Thresholds) -> bool {
    c.slope()
        .map(|s| thresholds.slope_consistent(s, global_slope))
        .unwrap_or(false)
}

/// Working-set position of the point to drop next.
///
/// The line's residuals are used unless the quadratic's raw R² is strictly
/// lower, or the line is unavailable. The slope gate does not apply here.
fn worst_point(linear: Option<&FitCandidate>, quadratic: Option<&FitCandidate>) -> Option<usize> {
    let chosen = match (linear, quadratic) {
        (Some(l), Some(q)) if q.r_squared < l.r_squared => q,
        (Some(l), _) => l,
        (None, Some(q)) => q,
        (None, None) => return None,
    };
    argmax_abs(&chosen.residuals)
}

fn split_xy(samples: &[Sample]) -> (Vec<f64>, Vec<f64>) {
    samples.iter().map(|s| (s.carbon as f64, s.rt)).unzip()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(carbons: &[i64], a: f64, b: f64) -> Vec<Sample> {
        carbons
            .iter()
            .map(|&c| Sample::new("PC", c, 1, a * c as f64 + b))
            .collect()
    }

    #[test]
    fn exact_line_recovers_coefficients() {
        let samples = line(&[30, 32, 34, 36], 2.0, 1.0);
        let outcome = robust_fit(&samples, None, &Thresholds::default());

        let lin = outcome.linear.as_ref().unwrap();
        assert!((lin.r_squared - 1.0).abs() < 1e-9);
        assert!((lin.coefficients[0] - 2.0).abs() < 1e-9);
        assert!((lin.coefficients[1] - 1.0).abs() < 1e-7);
        assert_eq!(outcome.rounds(), 0);
        assert_eq!(outcome.surviving_x.len(), 4);
    }

    #[test]
    fn displaced_point_is_pruned() {
        let mut samples = line(&[30, 31, 32, 33, 34, 35, 36], 3.0, -2.0);
        samples[3].rt += 30.0;

        let outcome = robust_fit(&samples, None, &Thresholds::default());
        assert!(outcome.linear_r2() >= 0.99);
        assert_eq!(outcome.pruned, vec![3]);
        assert_eq!(outcome.surviving_x, vec![30.0, 31.0, 32.0, 34.0, 35.0, 36.0]);
        assert!(!outcome.surviving_x.contains(&33.0));
    }

    #[test]
    fn two_points_fit_a_line_without_quadratic() {
        let samples = line(&[30, 40], 0.5, 3.0);
        let outcome = robust_fit(&samples, None, &Thresholds::default());
        assert!(outcome.linear.is_ok());
        assert_eq!(
            outcome.quadratic.unwrap_err(),
            FitError::InsufficientData {
                kind: FitKind::Quadratic,
                needed: 3,
                got: 2
            }
        );
    }

    #[test]
    fn same_carbon_everywhere_does_not_converge() {
        let samples = vec![
            Sample::new("PC", 34, 1, 5.0),
            Sample::new("PC", 34, 1, 5.2),
            Sample::new("PC", 34, 1, 4.9),
        ];
        let outcome = robust_fit(&samples, None, &Thresholds::default());
        assert!(matches!(outcome.linear, Err(FitError::NonConvergent { .. })));
        assert_eq!(outcome.linear_r2(), 0.0);
        assert_eq!(outcome.quadratic_r2(), 0.0);
    }

    #[test]
    fn gated_line_keeps_pruning_until_quadratic_clears() {
        // Exact line whose slope disagrees with the reference: the quadratic
        // family represents it exactly, so the loop stops straight away.
        let samples = line(&[30, 32, 34, 36, 38], 5.8, -100.0);
        let outcome = robust_fit(&samples, Some(5.0), &Thresholds::default());
        assert!(outcome.quadratic_r2() >= 0.99);
        assert_eq!(outcome.rounds(), 0);
    }

    #[test]
    fn displaced_end_points_are_pruned() {
        let carbons = [30, 31, 32, 33, 34, 35, 36];
        for (pos, offset) in [(0, 30.0), (0, -30.0), (6, 30.0), (6, -30.0), (0, 200.0), (6, -5.0)] {
            let mut samples = line(&carbons, 3.0, -2.0);
            samples[pos].rt += offset;

            let outcome = robust_fit(&samples, None, &Thresholds::default());
            assert_eq!(outcome.pruned, vec![pos], "pos={pos} offset={offset}");
            assert!(outcome.linear_r2() >= 0.99);
            let lin = outcome.linear.as_ref().unwrap();
            assert!((lin.coefficients[0] - 3.0).abs() < 1e-9);
            assert!(!outcome.surviving_x.contains(&(carbons[pos] as f64)));
        }
    }

    #[test]
    fn worst_point_follows_line_unless_quadratic_is_worse() {
        let candidate = |kind, r_squared, residuals: Vec<f64>| FitCandidate {
            kind,
            coefficients: vec![0.0; 3],
            r_squared,
            residuals,
        };
        let lin = candidate(FitKind::Linear, 0.9, vec![5.0, 0.0, 0.0]);
        let better_quad = candidate(FitKind::Quadratic, 0.95, vec![0.0, 0.0, 5.0]);
        let tied_quad = candidate(FitKind::Quadratic, 0.9, vec![0.0, 0.0, 5.0]);
        let worse_quad = candidate(FitKind::Quadratic, 0.5, vec![0.0, 0.0, 5.0]);

        assert_eq!(worst_point(Some(&lin), Some(&better_quad)), Some(0));
        assert_eq!(worst_point(Some(&lin), Some(&tied_quad)), Some(0));
        assert_eq!(worst_point(Some(&lin), Some(&worse_quad)), Some(2));
        assert_eq!(worst_point(None, Some(&worse_quad)), Some(2));
        assert_eq!(worst_point(None, None), None);
    }
}
