//! Ontology-wide reference slope.
//!
//! Every double-bond subgroup of a lipid class should shift retention time by
//! roughly the same amount per added carbon. The mean of the per-subgroup linear
//! slopes is used later to veto linear fits that disagree with the class.

use log::debug;

use crate::domain::Sample;
use crate::fit::fitter::linear_slope;
use crate::math::mean;

/// Mean linear slope over subgroups with ≥2 range-filtered samples.
///
/// `subgroups` holds already range-filtered samples. Subgroups whose line does
/// not converge are left out rather than counted as zero. Returns `None` when no
/// subgroup produced a slope.
pub fn estimate_global_slope<'a, I>(ontology: &str, subgroups: I) -> Option<f64>
where
    I: IntoIterator<Item = &'a [Sample]>,
{
    let slopes: Vec<f64> = subgroups
        .into_iter()
        .filter(|samples| samples.len() >= 2)
        .filter_map(|samples| match linear_slope(samples) {
            Ok(slope) => Some(slope),
            Err(e) => {
                debug!("{ontology}: slope excluded from reference ({e})");
                None
            }
        })
        .collect();

    let global = mean(&slopes);
    debug!(
        "{ontology}: reference slope {:?} from {} subgroup(s)",
        global,
        slopes.len()
    );
    global
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(db: i64, carbons: &[i64], a: f64, b: f64) -> Vec<Sample> {
        carbons
            .iter()
            .map(|&c| Sample::new("PE", c, db, a * c as f64 + b))
            .collect()
    }

    #[test]
    fn averages_converged_slopes() {
        let g0 = line(0, &[30, 32, 34], 0.4, 1.0);
        let g1 = line(1, &[30, 32, 34], 0.6, 0.5);
        let slope = estimate_global_slope("PE", [g0.as_slice(), g1.as_slice()]).unwrap();
        assert!((slope - 0.5).abs() < 1e-9);
    }

    #[test]
    fn skips_small_and_degenerate_subgroups() {
        let single = line(0, &[30], 9.0, 0.0);
        let stacked = vec![Sample::new("PE", 34, 2, 5.0), Sample::new("PE", 34, 2, 5.5)];
        let good = line(1, &[30, 36], 0.3, 2.0);
        let slope =
            estimate_global_slope("PE", [single.as_slice(), stacked.as_slice(), good.as_slice()])
                .unwrap();
        assert!((slope - 0.3).abs() < 1e-9);
    }

    #[test]
    fn undefined_without_any_slope() {
        let single = line(0, &[30], 9.0, 0.0);
        assert_eq!(estimate_global_slope("PE", [single.as_slice()]), None);
    }
}
