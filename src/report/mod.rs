//! Reporting utilities: run summaries and model tables.

pub mod format;

pub use format::*;
