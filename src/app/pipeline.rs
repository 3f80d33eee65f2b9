//! Shared batch pipeline logic.
//!
//! Keeping this in one place avoids duplicating the core workflow:
//! input discovery -> ingest -> model construction -> exports
//!
//! Each file is independent: a file that cannot be read or lacks required
//! columns is reported and skipped, and the rest of the batch carries on.

use std::path::{Path, PathBuf};

use log::{info, warn};

use crate::domain::FitConfig;
use crate::error::AppError;
use crate::fit::{BuildOutput, RangeTable, build_models};
use crate::io::ingest::{IngestOptions, IngestedData, load_samples};
use crate::io::registry::{ModelFile, write_model_json};
use crate::io::export::write_models_csv;

/// All computed outputs for one input table.
#[derive(Debug, Clone)]
pub struct FileRun {
    pub path: PathBuf,
    pub ingest: IngestedData,
    pub build: BuildOutput,
    /// Files written for this input (empty when no model was accepted).
    pub written: Vec<PathBuf>,
}

/// Outcome of a whole batch.
#[derive(Debug, Clone, Default)]
pub struct BatchOutput {
    pub runs: Vec<FileRun>,
    pub failures: Vec<(PathBuf, AppError)>,
}

/// Expand inputs: files are kept as given, directories contribute their `*.csv`
/// files sorted by name.
pub fn collect_inputs(inputs: &[PathBuf]) -> Result<Vec<PathBuf>, AppError> {
    let mut out = Vec::new();
    for input in inputs {
        if input.is_dir() {
            let entries = std::fs::read_dir(input).map_err(|e| {
                AppError::new(2, format!("Failed to list '{}': {e}", input.display()))
            })?;
            let mut found: Vec<PathBuf> = entries
                .filter_map(|e| e.ok().map(|e| e.path()))
                .filter(|p| p.is_file() && has_csv_extension(p))
                .collect();
            found.sort();
            if found.is_empty() {
                warn!("no CSV files in '{}'", input.display());
            }
            out.extend(found);
        } else {
            out.push(input.clone());
        }
    }
    if out.is_empty() {
        return Err(AppError::new(2, "No input files."));
    }
    Ok(out)
}

/// Run every input through the pipeline, isolating per-file failures.
pub fn run_batch(config: &FitConfig) -> Result<BatchOutput, AppError> {
    let inputs = collect_inputs(&config.inputs)?;
    std::fs::create_dir_all(&config.out_dir).map_err(|e| {
        AppError::new(
            2,
            format!("Failed to create output directory '{}': {e}", config.out_dir.display()),
        )
    })?;

    let ranges = RangeTable::with_overrides(config.range_overrides.clone());
    let mut batch = BatchOutput::default();
    for path in inputs {
        match process_file(&path, config, &ranges) {
            Ok(run) => batch.runs.push(run),
            Err(e) => {
                warn!("skipping '{}': {e}", path.display());
                batch.failures.push((path, e));
            }
        }
    }

    if batch.runs.is_empty() {
        return Err(AppError::new(3, "No input file could be processed."));
    }
    Ok(batch)
}

/// Ingest one table, build its models, and write the outputs.
pub fn process_file(path: &Path, config: &FitConfig, ranges: &RangeTable) -> Result<FileRun, AppError> {
    let opts = IngestOptions {
        dedup_height: config.dedup_height,
    };
    let ingest = load_samples(path, &opts)?;
    let build = build_models(&ingest.samples(), ranges, &config.thresholds);

    let mut written = Vec::new();
    if build.registry.is_empty() {
        info!("{}: no models accepted, nothing written", path.display());
    } else {
        let stem = file_stem(path);

        let csv_path = config.out_dir.join(format!("{stem}_processed.csv"));
        write_models_csv(&csv_path, &build.registry)?;
        written.push(csv_path);

        if config.write_json {
            let json_path = config.out_dir.join(format!("{stem}_models.json"));
            let file = ModelFile::new(path.display().to_string(), config.thresholds, build.registry.clone());
            write_model_json(&json_path, &file)?;
            written.push(json_path);
        }
        info!(
            "{}: {} model(s) written to {}",
            path.display(),
            build.registry.len(),
            config.out_dir.display()
        );
    }

    Ok(FileRun {
        path: path.to_path_buf(),
        ingest,
        build,
        written,
    })
}

fn has_csv_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("csv"))
}

fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "models".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn csv_extension_is_case_insensitive() {
        assert!(has_csv_extension(Path::new("a/b/mix.CSV")));
        assert!(!has_csv_extension(Path::new("mix.xlsx")));
        assert_eq!(file_stem(Path::new("runs/neg_mix.csv")), "neg_mix");
    }

    #[test]
    fn empty_input_list_is_an_error() {
        assert_eq!(collect_inputs(&[]).unwrap_err().exit_code(), 2);
    }
}
