use thiserror::Error;

use crate::domain::FitKind;

/// Application-level error carrying the process exit code.
///
/// Exit codes:
/// - `2`: usage, IO, or schema problems
/// - `3`: no usable data
/// - `4`: numerical or internal failure
#[derive(Clone)]
pub struct AppError {
    exit_code: u8,
    message: String,
}

impl AppError {
    pub fn new(exit_code: u8, message: impl Into<String>) -> Self {
        Self {
            exit_code,
            message: message.into(),
        }
    }

    pub fn exit_code(&self) -> u8 {
        self.exit_code
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::fmt::Debug for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppError")
            .field("exit_code", &self.exit_code)
            .field("message", &self.message)
            .finish()
    }
}

impl std::error::Error for AppError {}

/// Why a single regression attempt produced no usable candidate.
///
/// These never abort a subgroup: the fitter treats them as `R² = 0`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FitError {
    #[error("{kind} fit did not converge")]
    NonConvergent { kind: FitKind },
    #[error("{kind} fit needs at least {needed} points, got {got}")]
    InsufficientData { kind: FitKind, needed: usize, got: usize },
}

/// Structural problems with an input table. Any of these skips the whole file.
#[derive(Debug, Error)]
pub enum IngestError {
    #[error("missing required columns: {}", .0.join(", "))]
    MissingColumns(Vec<String>),
    #[error("failed to open '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to read CSV: {0}")]
    Csv(#[from] csv::Error),
}

impl From<IngestError> for AppError {
    fn from(err: IngestError) -> Self {
        AppError::new(2, err.to_string())
    }
}
