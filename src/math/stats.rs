//! Goodness-of-fit helpers.

/// Total sum of squares below this fraction of `Σ y²` is treated as zero
/// variance (no baseline to explain).
const SS_TOT_REL_EPS: f64 = 1e-14;

pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Coefficient of determination `1 − SS_res / SS_tot`.
///
/// The baseline is the mean of `y` itself, so every working set defines its own
/// variance. Returns `None` when `y` has no variance or the result is not finite.
pub fn r_squared(y: &[f64], residuals: &[f64]) -> Option<f64> {
    let y_bar = mean(y)?;
    let ss_tot: f64 = y.iter().map(|v| (v - y_bar) * (v - y_bar)).sum();
    let scale: f64 = y.iter().map(|v| v * v).sum();
    if !(ss_tot.is_finite() && ss_tot > SS_TOT_REL_EPS * scale.max(f64::MIN_POSITIVE)) {
        return None;
    }

    let ss_res: f64 = residuals.iter().map(|r| r * r).sum();
    let r2 = 1.0 - ss_res / ss_tot;
    if r2.is_finite() { Some(r2) } else { None }
}

/// Index of the largest absolute value; the first index wins ties.
pub fn argmax_abs(values: &[f64]) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for (i, v) in values.iter().enumerate() {
        let a = v.abs();
        if !a.is_finite() {
            continue;
        }
        match best {
            Some((_, b)) if a <= b => {}
            _ => best = Some((i, a)),
        }
    }
    best.map(|(i, _)| i)
}

/// Round to a fixed number of decimals (half away from zero).
pub fn round_to(v: f64, decimals: i32) -> f64 {
    let scale = 10f64.powi(decimals);
    (v * scale).round() / scale
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn r_squared_perfect_fit_is_one() {
        let y = [1.0, 2.0, 3.0];
        let r = [0.0, 0.0, 0.0];
        assert_eq!(r_squared(&y, &r), Some(1.0));
    }

    #[test]
    fn r_squared_undefined_for_constant_y() {
        let y = [4.2, 4.2, 4.2];
        assert_eq!(r_squared(&y, &[0.0, 0.0, 0.0]), None);
    }

    #[test]
    fn argmax_abs_first_index_wins_ties() {
        assert_eq!(argmax_abs(&[1.0, -3.0, 3.0, 0.5]), Some(1));
        assert_eq!(argmax_abs(&[]), None);
    }

    #[test]
    fn round_to_three_decimals() {
        assert_eq!(round_to(0.99349, 3), 0.993);
        assert_eq!(round_to(0.9996, 3), 1.0);
    }
}
