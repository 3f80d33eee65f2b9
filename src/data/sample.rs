//! Synthetic retention-time tables.
//!
//! Useful for demos and for exercising the fitter on data with a known answer:
//! within one lipid class, retention time grows linearly with carbon number and
//! drops by a fixed amount per double bond,
//!
//! ```text
//! rt(c, d) = slope · c + intercept − db_shift · d + ε
//! ```
//!
//! with Gaussian noise `ε` and occasional displaced points (bad peak picks).

use std::io::Write;
use std::path::Path;

use rand::prelude::*;
use rand::rngs::StdRng;
use rand_distr::Normal;

use crate::error::AppError;
use crate::fit::range::default_window;

/// Settings for one synthetic lipid class.
#[derive(Debug, Clone)]
pub struct SynthConfig {
    pub ontology: String,
    pub seed: u64,
    pub carbon_min: i64,
    pub carbon_max: i64,
    /// Distance between consecutive carbon numbers (2 = even chains only).
    pub carbon_step: i64,
    pub max_double_bonds: i64,
    pub slope: f64,
    pub intercept: f64,
    pub db_shift: f64,
    pub noise_sd: f64,
    pub outlier_prob: f64,
    /// Absolute retention-time displacement applied to outliers (minutes).
    pub outlier_shift: f64,
}

impl SynthConfig {
    /// Defaults spanning the ontology's carbon window (or 30–44 when it has none).
    pub fn for_ontology(ontology: &str, seed: u64) -> Self {
        let (carbon_min, carbon_max) = default_window(ontology)
            .map(|w| (w.min, w.max))
            .unwrap_or((30, 44));
        Self {
            ontology: ontology.to_string(),
            seed,
            carbon_min,
            carbon_max,
            carbon_step: 2,
            max_double_bonds: 3,
            slope: 0.45,
            intercept: -4.0,
            db_shift: 0.9,
            noise_sd: 0.02,
            outlier_prob: 0.05,
            outlier_shift: 1.5,
        }
    }
}

/// One generated measurement, with the ground truth kept for checks.
#[derive(Debug, Clone)]
pub struct SyntheticRow {
    pub name: String,
    pub ontology: String,
    pub carbon: i64,
    pub double_bonds: i64,
    pub rt: f64,
    pub height: f64,
    pub outlier: bool,
}

pub fn generate_rows(config: &SynthConfig) -> Result<Vec<SyntheticRow>, AppError> {
    if config.ontology.trim().is_empty() {
        return Err(AppError::new(2, "Ontology must not be empty."));
    }
    if config.carbon_step < 1 || config.carbon_max < config.carbon_min {
        return Err(AppError::new(2, "Invalid carbon range for synthetic data."));
    }
    if config.max_double_bonds < 0 {
        return Err(AppError::new(2, "Double-bond count must be >= 0."));
    }
    if !(0.0..1.0).contains(&config.outlier_prob) {
        return Err(AppError::new(2, "Outlier probability must be in [0, 1)."));
    }
    if !(config.noise_sd.is_finite() && config.noise_sd >= 0.0) {
        return Err(AppError::new(2, "Noise must be finite and >= 0."));
    }

    let mut rng = StdRng::seed_from_u64(config.seed);
    let normal = Normal::new(0.0, config.noise_sd)
        .map_err(|e| AppError::new(4, format!("Noise distribution error: {e}")))?;

    let mut rows = Vec::new();
    for db in 0..=config.max_double_bonds {
        let mut carbon = config.carbon_min;
        while carbon <= config.carbon_max {
            let truth = config.slope * carbon as f64 + config.intercept - config.db_shift * db as f64;
            let outlier = rng.r#gen::<f64>() < config.outlier_prob;
            let sign = if rng.r#gen::<bool>() { 1.0 } else { -1.0 };
            let shift = if outlier { sign * config.outlier_shift } else { 0.0 };
            let rt = truth + normal.sample(&mut rng) + shift;

            rows.push(SyntheticRow {
                name: format!("{} {}:{}", config.ontology, carbon, db),
                ontology: config.ontology.clone(),
                carbon,
                double_bonds: db,
                rt,
                height: rng.gen_range(1.0e4..1.0e6),
                outlier,
            });
            carbon += config.carbon_step;
        }
    }

    Ok(rows)
}

/// Write rows in the layout `ingest` reads back.
pub fn write_rows<W: Write>(writer: W, rows: &[SyntheticRow]) -> Result<(), AppError> {
    let mut csv = csv::Writer::from_writer(writer);
    let map_err = |e: csv::Error| AppError::new(2, format!("Failed to write synthetic CSV: {e}"));

    csv.write_record(["Name", "Ontology", "Carbon number", "Double bond number", "RT (min)", "Height"])
        .map_err(map_err)?;
    for r in rows {
        csv.write_record([
            r.name.clone(),
            r.ontology.clone(),
            r.carbon.to_string(),
            r.double_bonds.to_string(),
            format!("{:.4}", r.rt),
            format!("{:.0}", r.height),
        ])
        .map_err(map_err)?;
    }
    csv.flush()
        .map_err(|e| AppError::new(2, format!("Failed to flush synthetic CSV: {e}")))?;
    Ok(())
}

pub fn write_rows_csv(path: &Path, rows: &[SyntheticRow]) -> Result<(), AppError> {
    let file = std::fs::File::create(path)
        .map_err(|e| AppError::new(2, format!("Failed to create '{}': {e}", path.display())))?;
    write_rows(file, rows)
}
