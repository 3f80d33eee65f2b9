//! Read/write model JSON files.
//!
//! Model JSON is the "portable" representation of a fitted registry:
//! - structured models (fit kind + ordered coefficients) per subgroup
//! - the thresholds they were accepted under
//! - provenance (source table, creation time)
//!
//! Annotation reads this file and evaluates models directly; the display
//! equation is carried along for humans only.

use std::fs::File;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::Thresholds;
use crate::error::AppError;
use crate::fit::ModelRegistry;

pub const TOOL_NAME: &str = "ecn";

/// A saved model registry (JSON).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelFile {
    pub tool: String,
    pub created: DateTime<Utc>,
    pub source: String,
    pub thresholds: Thresholds,
    pub models: ModelRegistry,
}

impl ModelFile {
    pub fn new(source: impl Into<String>, thresholds: Thresholds, models: ModelRegistry) -> Self {
        Self {
            tool: TOOL_NAME.to_string(),
            created: Utc::now(),
            source: source.into(),
            thresholds,
            models,
        }
    }
}

/// Write a model JSON file.
pub fn write_model_json(path: &Path, file: &ModelFile) -> Result<(), AppError> {
    let out = File::create(path)
        .map_err(|e| AppError::new(2, format!("Failed to create model JSON '{}': {e}", path.display())))?;
    serde_json::to_writer_pretty(out, file)
        .map_err(|e| AppError::new(2, format!("Failed to write model JSON: {e}")))?;
    Ok(())
}

/// Read a model JSON file.
pub fn read_model_json(path: &Path) -> Result<ModelFile, AppError> {
    let file = File::open(path)
        .map_err(|e| AppError::new(2, format!("Failed to open model JSON '{}': {e}", path.display())))?;
    let models: ModelFile =
        serde_json::from_reader(file).map_err(|e| AppError::new(2, format!("Invalid model JSON: {e}")))?;
    Ok(models)
}
