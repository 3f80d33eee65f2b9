//! Export accepted models to CSV.
//!
//! The export is meant to be easy to consume in spreadsheets or downstream
//! scripts; list-valued columns are written as `[x1, x2, ...]`.

use std::fs::File;
use std::io::Write;
use std::path::Path;

use crate::error::AppError;
use crate::fit::ModelRegistry;

pub const RESULT_COLUMNS: [&str; 9] = [
    "Ontology",
    "Double bond number",
    "X_data",
    "Y_data",
    "X_R_data",
    "Y_R_data",
    "Fit Type",
    "Equation",
    "R^2",
];

/// Write the registry as a model table to `path`.
pub fn write_models_csv(path: &Path, registry: &ModelRegistry) -> Result<(), AppError> {
    let file = File::create(path)
        .map_err(|e| AppError::new(2, format!("Failed to create model CSV '{}': {e}", path.display())))?;
    write_models(file, registry)
}

/// Write the model table to any writer.
pub fn write_models<W: Write>(writer: W, registry: &ModelRegistry) -> Result<(), AppError> {
    let mut csv = csv::Writer::from_writer(writer);
    let map_err = |e: csv::Error| AppError::new(2, format!("Failed to write model CSV: {e}"));

    csv.write_record(RESULT_COLUMNS).map_err(map_err)?;
    for r in registry.records() {
        csv.write_record([
            r.ontology.clone(),
            r.double_bonds.to_string(),
            fmt_list(&r.raw_x),
            fmt_list(&r.raw_y),
            fmt_list(&r.surviving_x),
            fmt_list(&r.surviving_y),
            r.fit_kind().display_name().to_string(),
            r.equation.clone(),
            format!("{:?}", r.r_squared),
        ])
        .map_err(map_err)?;
    }
    csv.flush()
        .map_err(|e| AppError::new(2, format!("Failed to flush model CSV: {e}")))?;
    Ok(())
}

fn fmt_list(v: &[f64]) -> String {
    let parts: Vec<String> = v.iter().map(|x| format!("{x:?}")).collect();
    format!("[{}]", parts.join(", "))
}
