//! Score candidate species against fitted ECN models.
//!
//! For every measured species that has a model for its `(ontology, double
//! bonds)` subgroup we compute the expected retention time and the relative
//! deviation
//!
//! ```text
//! δRT(%) = (observed − expected) / observed × 100
//! ```
//!
//! Species outside `±tolerance` are dropped. When the table names its species,
//! only the closest candidate per name is kept.
//!
//! LipidSearch tables (`TopRT`) are scored on values rounded to two decimals,
//! both for the tolerance check and in the output.

use std::collections::HashMap;
use std::io::Write;
use std::path::Path;

use log::debug;

use crate::error::AppError;
use crate::fit::ModelRegistry;
use crate::io::ingest::{MeasuredRow, RtColumn};
use crate::math::round_to;

pub const DEFAULT_TOLERANCE_PCT: f64 = 5.0;

/// How rows are scored and written.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnnotateOptions {
    pub tolerance_pct: f64,
    /// Round expected RT and δRT to this many decimals before the tolerance check.
    pub round_decimals: Option<i32>,
}

impl AnnotateOptions {
    pub fn new(tolerance_pct: f64) -> Self {
        Self {
            tolerance_pct,
            round_decimals: None,
        }
    }

    /// Options for a table read through `rt_column`.
    pub fn for_table(tolerance_pct: f64, rt_column: RtColumn) -> Self {
        let round_decimals = match rt_column {
            RtColumn::RtMin => None,
            RtColumn::TopRt => Some(2),
        };
        Self {
            tolerance_pct,
            round_decimals,
        }
    }

    fn round(&self, v: f64) -> f64 {
        match self.round_decimals {
            Some(d) => round_to(v, d),
            None => v,
        }
    }
}

/// A species that matched a model.
#[derive(Debug, Clone)]
pub struct Annotation {
    pub line: usize,
    pub name: Option<String>,
    pub ontology: String,
    pub carbon: i64,
    pub double_bonds: i64,
    pub observed_rt: f64,
    pub expected_rt: f64,
    pub delta_pct: f64,
    pub equation: String,
}

/// Counts of what happened during annotation.
#[derive(Debug, Clone, Default)]
pub struct AnnotationSummary {
    pub rows_in: usize,
    pub without_model: usize,
    pub outside_tolerance: usize,
    pub superseded: usize,
}

/// Match rows against models, apply the tolerance, and keep the best per name.
pub fn annotate(
    rows: &[MeasuredRow],
    registry: &ModelRegistry,
    tolerance_pct: f64,
) -> Result<(Vec<Annotation>, AnnotationSummary), AppError> {
    annotate_with(rows, registry, &AnnotateOptions::new(tolerance_pct))
}

pub fn annotate_with(
    rows: &[MeasuredRow],
    registry: &ModelRegistry,
    opts: &AnnotateOptions,
) -> Result<(Vec<Annotation>, AnnotationSummary), AppError> {
    let tolerance_pct = opts.tolerance_pct;
    if !(tolerance_pct.is_finite() && tolerance_pct > 0.0) {
        return Err(AppError::new(2, "Tolerance must be finite and > 0."));
    }

    let mut summary = AnnotationSummary {
        rows_in: rows.len(),
        ..AnnotationSummary::default()
    };
    let mut matched = Vec::new();

    for row in rows {
        let s = &row.sample;
        let Some(record) = registry.get(&s.ontology, s.double_bonds) else {
            summary.without_model += 1;
            continue;
        };

        let expected_rt = opts.round(record.model.apply(s.carbon as f64));
        let Some(delta_pct) = delta_rt_pct(s.rt, expected_rt).map(|d| opts.round(d)) else {
            summary.outside_tolerance += 1;
            continue;
        };
        if delta_pct.abs() >= tolerance_pct {
            debug!(
                "line {}: {} {}:{} off by {delta_pct:.2}%",
                row.line, s.ontology, s.carbon, s.double_bonds
            );
            summary.outside_tolerance += 1;
            continue;
        }

        matched.push(Annotation {
            line: row.line,
            name: row.name.clone(),
            ontology: s.ontology.clone(),
            carbon: s.carbon,
            double_bonds: s.double_bonds,
            observed_rt: s.rt,
            expected_rt,
            delta_pct,
            equation: record.equation.clone(),
        });
    }

    let before = matched.len();
    let kept = best_per_name(matched);
    summary.superseded = before - kept.len();
    Ok((kept, summary))
}

/// Relative retention-time deviation in percent of the observed value.
pub fn delta_rt_pct(observed: f64, expected: f64) -> Option<f64> {
    if observed == 0.0 {
        return None;
    }
    let d = (observed - expected) / observed * 100.0;
    d.is_finite().then_some(d)
}

/// Keep the smallest `|δRT|` per species name; the earliest row wins ties.
/// Unnamed rows are all kept.
fn best_per_name(annotations: Vec<Annotation>) -> Vec<Annotation> {
    let mut best: HashMap<String, usize> = HashMap::new();
    for (i, a) in annotations.iter().enumerate() {
        let Some(name) = &a.name else { continue };
        match best.get(name) {
            Some(&j) if annotations[j].delta_pct.abs() <= a.delta_pct.abs() => {}
            _ => {
                best.insert(name.clone(), i);
            }
        }
    }

    annotations
        .into_iter()
        .enumerate()
        .filter(|(i, a)| match &a.name {
            Some(name) => best.get(name) == Some(i),
            None => true,
        })
        .map(|(_, a)| a)
        .collect()
}

pub fn write_annotations<W: Write>(
    writer: W,
    annotations: &[Annotation],
    opts: &AnnotateOptions,
) -> Result<(), AppError> {
    let mut csv = csv::Writer::from_writer(writer);
    let map_err = |e: csv::Error| AppError::new(2, format!("Failed to write annotation CSV: {e}"));

    csv.write_record([
        "Name",
        "Ontology",
        "Carbon number",
        "Double bond number",
        "RT (min)",
        "TheorRT(min)",
        "δRT(%)",
        "Equation",
    ])
    .map_err(map_err)?;
    let (rt_prec, delta_prec) = match opts.round_decimals {
        Some(d) => (d.max(0) as usize, d.max(0) as usize),
        None => (4, 3),
    };
    for a in annotations {
        csv.write_record([
            a.name.clone().unwrap_or_default(),
            a.ontology.clone(),
            a.carbon.to_string(),
            a.double_bonds.to_string(),
            format!("{:.4}", a.observed_rt),
            format!("{:.rt_prec$}", a.expected_rt),
            format!("{:.delta_prec$}", a.delta_pct),
            a.equation.clone(),
        ])
        .map_err(map_err)?;
    }
    csv.flush()
        .map_err(|e| AppError::new(2, format!("Failed to flush annotation CSV: {e}")))?;
    Ok(())
}

pub fn write_annotations_csv(path: &Path, annotations: &[Annotation], opts: &AnnotateOptions) -> Result<(), AppError> {
    let file = std::fs::File::create(path)
        .map_err(|e| AppError::new(2, format!("Failed to create '{}': {e}", path.display())))?;
    write_annotations(file, annotations, opts)
}
