//! Model selection (linear vs quadratic) with slope-consistency guardrails.
//!
//! Selection rules, first match wins:
//! 1. Linear, when `R² ≥ r2_min` and its slope is within `max_slope_delta` of the
//!    ontology's reference slope (an undefined reference never vetoes)
//! 2. Quadratic, when `R² ≥ r2_min`
//! 3. Nothing: the subgroup is left out of the registry

use crate::domain::{FitCandidate, ModelRecord, Rejection, Sample, Thresholds};
use crate::fit::fitter::FitOutcome;
use crate::math::round_to;

/// Pick the final model for a subgroup, or say why there is none.
///
/// `raw` is the subgroup as it arrived (before range filtering); it is kept on
/// the record for audit.
pub fn select_model(
    ontology: &str,
    double_bonds: i64,
    raw: &[Sample],
    outcome: &FitOutcome,
    global_slope: Option<f64>,
    thresholds: &Thresholds,
) -> Result<ModelRecord, Rejection> {
    let chosen = choose(outcome, global_slope, thresholds).ok_or(Rejection::NoAcceptableModel)?;

    let model = chosen.to_model();
    Ok(ModelRecord {
        ontology: ontology.to_string(),
        double_bonds,
        equation: model.equation(),
        model,
        r_squared: round_to(chosen.r_squared, 3),
        raw_x: raw.iter().map(|s| s.carbon as f64).collect(),
        raw_y: raw.iter().map(|s| s.rt).collect(),
        surviving_x: outcome.surviving_x.clone(),
        surviving_y: outcome.surviving_y.clone(),
    })
}

fn choose<'a>(
    outcome: &'a FitOutcome,
    global_slope: Option<f64>,
    thresholds: &Thresholds,
) -> Option<&'a FitCandidate> {
    if let Ok(lin) = &outcome.linear {
        let consistent = lin
            .slope()
            .map(|s| thresholds.slope_consistent(s, global_slope))
            .unwrap_or(false);
        if lin.r_squared >= thresholds.r2_min && consistent {
            return Some(lin);
        }
    }
    match &outcome.quadratic {
        Ok(quad) if quad.r_squared >= thresholds.r2_min => Some(quad),
        _ => None,
    }
}
