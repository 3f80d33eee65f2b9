//! Command-line parsing for the ECN model builder.
//!
//! The goal of this module is to keep **argument parsing** and **command dispatch**
//! separate from the modeling/math code.

use std::path::PathBuf;

use clap::{ArgAction, Args, Parser, Subcommand};

use crate::annotate::DEFAULT_TOLERANCE_PCT;

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "ecn", version, about = "Equivalent Carbon Number retention-time models for lipidomics")]
pub struct Cli {
    /// Increase log verbosity (-v info, -vv debug). `RUST_LOG` takes precedence.
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Build ECN models from one or more measurement tables.
    Fit(FitArgs),
    /// Score species against a saved model file.
    Annotate(AnnotateArgs),
    /// Write a synthetic measurement table for one lipid class.
    Synth(SynthArgs),
    /// Add `Ontology` to a LipidSearch table and drop unused adducts.
    Classmap(ClassmapArgs),
}

#[derive(Debug, Args, Clone)]
pub struct FitArgs {
    /// Input CSV files, or directories containing them.
    #[arg(required = true, value_name = "INPUT")]
    pub inputs: Vec<PathBuf>,

    /// Directory for `<stem>_processed.csv` / `<stem>_models.json`.
    #[arg(short, long, default_value = "ecn-output")]
    pub out_dir: PathBuf,

    /// TOML file with thresholds and extra carbon windows.
    #[arg(long, value_name = "TOML")]
    pub config: Option<PathBuf>,

    /// Minimum R² for a model to be accepted [default: 0.99].
    #[arg(long)]
    pub r2_min: Option<f64>,

    /// Maximum |slope − class slope| for a linear model [default: 0.6].
    #[arg(long)]
    pub max_slope_delta: Option<f64>,

    /// Keep only the highest `Height` row per (ontology, carbon, double bonds).
    ///
    /// Off by default. Pass it for MS-DIAL exports, where one species is often
    /// reported under several adducts.
    #[arg(long)]
    pub dedup_height: bool,

    /// Skip the JSON model file.
    #[arg(long)]
    pub no_json: bool,

    /// Do not print per-file summaries.
    #[arg(short, long)]
    pub quiet: bool,
}

#[derive(Debug, Args, Clone)]
pub struct AnnotateArgs {
    /// Model JSON produced by `ecn fit`.
    #[arg(long, value_name = "JSON")]
    pub models: PathBuf,

    /// Species table to score.
    #[arg(long, value_name = "CSV")]
    pub input: PathBuf,

    /// Output CSV (stdout when omitted).
    #[arg(long, value_name = "CSV")]
    pub out: Option<PathBuf>,

    /// Maximum |δRT| in percent.
    #[arg(long, default_value_t = DEFAULT_TOLERANCE_PCT)]
    pub tolerance: f64,
}

#[derive(Debug, Args, Clone)]
pub struct SynthArgs {
    /// Lipid class (e.g. PC, TG, SM).
    #[arg(long, default_value = "PC")]
    pub ontology: String,

    /// Random seed.
    #[arg(long, default_value_t = 42)]
    pub seed: u64,

    /// Output CSV (stdout when omitted).
    #[arg(long, value_name = "CSV")]
    pub out: Option<PathBuf>,

    /// Highest double-bond count to generate.
    #[arg(long, default_value_t = 3)]
    pub max_double_bonds: i64,

    /// Standard deviation of retention-time noise (minutes).
    #[arg(long, default_value_t = 0.02)]
    pub noise: f64,

    /// Probability that a point is displaced.
    #[arg(long, default_value_t = 0.05)]
    pub outlier_prob: f64,

    /// Displacement applied to outliers (minutes).
    #[arg(long, default_value_t = 1.5)]
    pub outlier_shift: f64,
}

#[derive(Debug, Args, Clone)]
pub struct ClassmapArgs {
    /// Index CSV with `ClassKey`, `SubClassKey` and `Ontology` columns.
    #[arg(long, value_name = "CSV")]
    pub index: PathBuf,

    /// LipidSearch export to map.
    #[arg(long, value_name = "CSV")]
    pub input: PathBuf,

    /// Output CSV.
    #[arg(long, value_name = "CSV")]
    pub out: PathBuf,
}
