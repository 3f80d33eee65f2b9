//! Shared domain types.
//!
//! These types are intentionally kept lightweight and serializable so they can be:
//!
//! - used in-memory during fitting
//! - exported to JSON/CSV
//! - reloaded later for annotation

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// One surviving measurement row: a lipid species observed at a retention time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    pub ontology: String,
    pub carbon: i64,
    pub double_bonds: i64,
    /// Retention time in minutes.
    pub rt: f64,
}

impl Sample {
    pub fn new(ontology: impl Into<String>, carbon: i64, double_bonds: i64, rt: f64) -> Self {
        Self {
            ontology: ontology.into(),
            carbon,
            double_bonds,
            rt,
        }
    }
}

/// Inclusive window of carbon numbers that are chemically plausible for an ontology.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "[i64; 2]", into = "[i64; 2]")]
pub struct RangeWindow {
    pub min: i64,
    pub max: i64,
}

impl RangeWindow {
    pub const fn new(min: i64, max: i64) -> Self {
        Self { min, max }
    }

    pub fn contains(self, carbon: i64) -> bool {
        carbon >= self.min && carbon <= self.max
    }

    pub fn is_valid(self) -> bool {
        self.min <= self.max
    }
}

impl From<[i64; 2]> for RangeWindow {
    fn from(value: [i64; 2]) -> Self {
        Self::new(value[0], value[1])
    }
}

impl From<RangeWindow> for [i64; 2] {
    fn from(value: RangeWindow) -> Self {
        [value.min, value.max]
    }
}

/// Concrete regression family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FitKind {
    Linear,
    Quadratic,
}

impl FitKind {
    /// Label used in reports and the `Fit Type` column.
    pub fn display_name(self) -> &'static str {
        match self {
            FitKind::Linear => "Linear",
            FitKind::Quadratic => "Quadratic",
        }
    }

    /// Number of polynomial coefficients.
    pub fn coeff_len(self) -> usize {
        match self {
            FitKind::Linear => 2,
            FitKind::Quadratic => 3,
        }
    }

    /// Smallest working set this family can be fitted on.
    pub fn min_points(self) -> usize {
        self.coeff_len()
    }
}

impl std::fmt::Display for FitKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.display_name())
    }
}

/// Result of one regression attempt on one working set.
///
/// `residuals[i]` is aligned with the working set the candidate was fitted on.
#[derive(Debug, Clone)]
pub struct FitCandidate {
    pub kind: FitKind,
    /// Highest power first: `[a, b]` or `[a, b, c]`.
    pub coefficients: Vec<f64>,
    pub r_squared: f64,
    pub residuals: Vec<f64>,
}

impl FitCandidate {
    /// Leading-order slope for linear candidates (`a` in `a·x + b`).
    pub fn slope(&self) -> Option<f64> {
        match self.kind {
            FitKind::Linear => self.coefficients.first().copied(),
            FitKind::Quadratic => None,
        }
    }

    pub fn to_model(&self) -> EcnModel {
        EcnModel {
            kind: self.kind,
            coefficients: self.coefficients.clone(),
        }
    }
}

/// A fitted ECN relation: fit kind plus ordered polynomial coefficients.
///
/// This is the canonical representation of a model; `equation()` is only a
/// derived display string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EcnModel {
    pub kind: FitKind,
    /// Highest power first.
    pub coefficients: Vec<f64>,
}

impl EcnModel {
    pub fn linear(a: f64, b: f64) -> Self {
        Self {
            kind: FitKind::Linear,
            coefficients: vec![a, b],
        }
    }

    pub fn quadratic(a: f64, b: f64, c: f64) -> Self {
        Self {
            kind: FitKind::Quadratic,
            coefficients: vec![a, b, c],
        }
    }

    /// Expected retention time for a species with the given carbon number.
    pub fn apply(&self, carbon: f64) -> f64 {
        crate::models::predict(self.kind, carbon, &self.coefficients)
    }

    /// Human-readable equation, e.g. `y = 2.0000x + 1.0000`.
    pub fn equation(&self) -> String {
        let c = &self.coefficients;
        match self.kind {
            FitKind::Linear => format!("y = {:.4}x + {:.4}", c[0], c[1]),
            FitKind::Quadratic => format!("y = {:.4}x^2 + {:.4}x + {:.4}", c[0], c[1], c[2]),
        }
    }
}

/// An accepted model for one `(ontology, double bond)` subgroup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelRecord {
    pub ontology: String,
    pub double_bonds: i64,
    pub model: EcnModel,
    pub equation: String,
    /// R² rounded to three decimals.
    pub r_squared: f64,
    pub raw_x: Vec<f64>,
    pub raw_y: Vec<f64>,
    pub surviving_x: Vec<f64>,
    pub surviving_y: Vec<f64>,
}

impl ModelRecord {
    pub fn fit_kind(&self) -> FitKind {
        self.model.kind
    }
}

/// Decision thresholds for model acceptance.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Thresholds {
    /// Minimum R² for a fit to be accepted (and for pruning to stop).
    pub r2_min: f64,
    /// Maximum allowed `|slope − global slope|` for a linear model.
    pub max_slope_delta: f64,
}

pub const DEFAULT_R2_MIN: f64 = 0.99;
pub const DEFAULT_MAX_SLOPE_DELTA: f64 = 0.6;

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            r2_min: DEFAULT_R2_MIN,
            max_slope_delta: DEFAULT_MAX_SLOPE_DELTA,
        }
    }
}

impl Thresholds {
    /// True when `slope` is consistent with the ontology-wide reference slope.
    ///
    /// An undefined reference slope never rejects.
    pub fn slope_consistent(&self, slope: f64, global_slope: Option<f64>) -> bool {
        match global_slope {
            Some(g) => (slope - g).abs() <= self.max_slope_delta,
            None => true,
        }
    }
}

/// Why a subgroup did not make it into the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Rejection {
    /// Fewer than two samples left after range filtering.
    TooFewSamples,
    /// Neither family reached the R² bar (or linear failed the slope gate).
    NoAcceptableModel,
}

impl Rejection {
    pub fn describe(self) -> &'static str {
        match self {
            Rejection::TooFewSamples => "too few samples in range",
            Rejection::NoAcceptableModel => "no acceptable model",
        }
    }
}

/// A full run's configuration as understood by the pipeline.
///
/// This is derived from CLI flags, an optional TOML file, and defaults.
#[derive(Debug, Clone)]
pub struct FitConfig {
    pub inputs: Vec<PathBuf>,
    pub out_dir: PathBuf,
    pub thresholds: Thresholds,
    /// Extra or replacement windows layered over the built-in table.
    pub range_overrides: BTreeMap<String, RangeWindow>,
    pub dedup_height: bool,
    pub write_json: bool,
    pub quiet: bool,
}
