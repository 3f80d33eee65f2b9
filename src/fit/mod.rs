//! ECN model construction.
//!
//! Responsibilities:
//!
//! - drop carbon numbers outside each ontology's window (`range`)
//! - estimate one reference slope per ontology (`slope`)
//! - fit and prune each double-bond subgroup (`fitter`)
//! - accept a linear or quadratic model, or none (`selection`)
//! - collect accepted models (`registry`)
//!
//! Ontologies share no state, so they are processed in parallel.

pub mod fitter;
pub mod range;
pub mod registry;
pub mod selection;
pub mod slope;

use std::collections::BTreeMap;

use log::debug;
use rayon::prelude::*;

use crate::domain::{ModelRecord, Rejection, Sample, Thresholds};

pub use fitter::*;
pub use range::*;
pub use registry::*;
pub use selection::*;
pub use slope::*;

/// What happened to one `(ontology, double bond)` subgroup.
#[derive(Debug, Clone)]
pub struct SubgroupReport {
    pub ontology: String,
    pub double_bonds: i64,
    pub n_raw: usize,
    pub n_in_range: usize,
    pub global_slope: Option<f64>,
    pub rounds: usize,
    pub result: Result<ModelRecord, Rejection>,
}

/// Output of model construction over one table of samples.
#[derive(Debug, Clone, Default)]
pub struct BuildOutput {
    pub registry: ModelRegistry,
    pub subgroups: Vec<SubgroupReport>,
}

impl BuildOutput {
    pub fn rejected(&self) -> impl Iterator<Item = (&SubgroupReport, Rejection)> {
        self.subgroups
            .iter()
            .filter_map(|s| s.result.as_ref().err().map(|r| (s, *r)))
    }
}

/// Group samples by ontology, then by double-bond count, keeping input order
/// within each subgroup.
pub fn group_samples(samples: &[Sample]) -> BTreeMap<String, BTreeMap<i64, Vec<Sample>>> {
    let mut groups: BTreeMap<String, BTreeMap<i64, Vec<Sample>>> = BTreeMap::new();
    for s in samples {
        groups
            .entry(s.ontology.clone())
            .or_default()
            .entry(s.double_bonds)
            .or_default()
            .push(s.clone());
    }
    groups
}

/// Build ECN models for every subgroup in `samples`.
pub fn build_models(samples: &[Sample], ranges: &RangeTable, thresholds: &Thresholds) -> BuildOutput {
    let groups = group_samples(samples);

    let mut subgroups: Vec<SubgroupReport> = groups
        .par_iter()
        .flat_map_iter(|(ontology, by_db)| build_ontology(ontology, by_db, ranges, thresholds))
        .collect();
    subgroups.sort_by(|a, b| {
        (a.ontology.as_str(), a.double_bonds).cmp(&(b.ontology.as_str(), b.double_bonds))
    });

    let registry = subgroups
        .iter()
        .filter_map(|s| s.result.as_ref().ok().cloned())
        .collect();

    BuildOutput { registry, subgroups }
}

fn build_ontology(
    ontology: &str,
    by_db: &BTreeMap<i64, Vec<Sample>>,
    ranges: &RangeTable,
    thresholds: &Thresholds,
) -> Vec<SubgroupReport> {
    let filtered: BTreeMap<i64, Vec<Sample>> = by_db
        .iter()
        .map(|(&db, raw)| (db, ranges.filter(ontology, raw)))
        .collect();

    let global_slope = estimate_global_slope(ontology, filtered.values().map(Vec::as_slice));

    by_db
        .iter()
        .map(|(&db, raw)| {
            let in_range = filtered.get(&db).map(Vec::as_slice).unwrap_or(&[]);
            let (rounds, result) = if in_range.len() < 2 {
                (0, Err(Rejection::TooFewSamples))
            } else {
                let outcome = robust_fit(in_range, global_slope, thresholds);
                let result = select_model(ontology, db, raw, &outcome, global_slope, thresholds);
                (outcome.rounds(), result)
            };

            match &result {
                Ok(rec) => debug!(
                    "{ontology} db={db}: {} R²={} ({})",
                    rec.fit_kind(),
                    rec.r_squared,
                    rec.equation
                ),
                Err(reason) => debug!("{ontology} db={db}: {}", reason.describe()),
            }

            SubgroupReport {
                ontology: ontology.to_string(),
                double_bonds: db,
                n_raw: raw.len(),
                n_in_range: in_range.len(),
                global_slope,
                rounds,
                result,
            }
        })
        .collect()
}
