//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - parses CLI arguments and sets up logging
//! - resolves thresholds and carbon windows (defaults, TOML file, flags)
//! - runs the batch model builder, annotation, class mapping, or synthetic data generation
//! - prints reports

use std::io::Write;

use clap::Parser;
use log::info;

use crate::cli::{AnnotateArgs, ClassmapArgs, Command, FitArgs, SynthArgs};
use crate::annotate::AnnotateOptions;
use crate::config::{FileConfig, validate_thresholds};
use crate::domain::FitConfig;
use crate::error::AppError;

pub mod pipeline;

/// Entry point for the `ecn` binary.
pub fn run() -> Result<(), AppError> {
    // A missing .env file is fine; it only pre-seeds variables such as RUST_LOG.
    let _ = dotenvy::dotenv();

    let cli = crate::cli::Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Command::Fit(args) => handle_fit(args),
        Command::Annotate(args) => handle_annotate(args),
        Command::Synth(args) => handle_synth(args),
        Command::Classmap(args) => handle_classmap(args),
    }
}

fn init_logging(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    // Ignore a second initialization (e.g. when embedded in tests).
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default)).try_init();
}

fn handle_fit(args: FitArgs) -> Result<(), AppError> {
    let config = fit_config_from_args(&args)?;
    let batch = pipeline::run_batch(&config)?;

    if !config.quiet {
        for run in &batch.runs {
            println!("{}", crate::report::format_file_summary(run));
            println!("{}", crate::report::format_models_table(&run.build.registry));
        }
    }
    for (path, err) in &batch.failures {
        eprintln!("skipped {}: {err}", path.display());
    }
    info!(
        "{} file(s) processed, {} skipped",
        batch.runs.len(),
        batch.failures.len()
    );
    Ok(())
}

fn handle_annotate(args: AnnotateArgs) -> Result<(), AppError> {
    let model_file = crate::io::registry::read_model_json(&args.models)?;
    let ingest = crate::io::ingest::load_samples(&args.input, &Default::default())?;
    let opts = AnnotateOptions::for_table(args.tolerance, ingest.rt_column);
    let (annotations, summary) = crate::annotate::annotate_with(&ingest.rows, &model_file.models, &opts)?;

    match &args.out {
        Some(path) => crate::annotate::write_annotations_csv(path, &annotations, &opts)?,
        None => crate::annotate::write_annotations(std::io::stdout().lock(), &annotations, &opts)?,
    }
    eprintln!("{}", crate::report::format_annotation_summary(&summary, annotations.len()));
    Ok(())
}

fn handle_synth(args: SynthArgs) -> Result<(), AppError> {
    let mut config = crate::data::SynthConfig::for_ontology(&args.ontology, args.seed);
    config.max_double_bonds = args.max_double_bonds;
    config.noise_sd = args.noise;
    config.outlier_prob = args.outlier_prob;
    config.outlier_shift = args.outlier_shift;

    let rows = crate::data::generate_rows(&config)?;
    match &args.out {
        Some(path) => crate::data::write_rows_csv(path, &rows)?,
        None => {
            let mut stdout = std::io::stdout().lock();
            crate::data::write_rows(&mut stdout, &rows)?;
            stdout
                .flush()
                .map_err(|e| AppError::new(2, format!("Failed to write to stdout: {e}")))?;
        }
    }
    info!(
        "generated {} rows ({} displaced)",
        rows.len(),
        rows.iter().filter(|r| r.outlier).count()
    );
    Ok(())
}

fn handle_classmap(args: ClassmapArgs) -> Result<(), AppError> {
    let index = crate::io::classmap::ClassIndex::load(&args.index)?;
    if index.is_empty() {
        return Err(AppError::new(3, format!("No class mappings in '{}'.", args.index.display())));
    }
    let summary = crate::io::classmap::map_classes_file(&args.input, &args.out, &index)?;
    info!("{} class mapping(s) loaded from {}", index.len(), args.index.display());
    eprintln!(
        "Rows: read={} adducts dropped={} unmatched={}",
        summary.rows_read, summary.dropped_adducts, summary.unmatched
    );
    Ok(())
}

/// Resolve a run configuration: built-in defaults, then the TOML file, then flags.
pub fn fit_config_from_args(args: &FitArgs) -> Result<FitConfig, AppError> {
    let file = match &args.config {
        Some(path) => FileConfig::load(path)?,
        None => FileConfig::default(),
    };

    let mut thresholds = file.thresholds;
    if let Some(v) = args.r2_min {
        thresholds.r2_min = v;
    }
    if let Some(v) = args.max_slope_delta {
        thresholds.max_slope_delta = v;
    }
    validate_thresholds(&thresholds)?;

    Ok(FitConfig {
        inputs: args.inputs.clone(),
        out_dir: args.out_dir.clone(),
        thresholds,
        range_overrides: file.ranges,
        dedup_height: args.dedup_height,
        write_json: !args.no_json,
        quiet: args.quiet,
    })
}
