//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - input observations (`Sample`) and carbon windows (`RangeWindow`)
//! - fit candidates and the structured model (`FitCandidate`, `EcnModel`)
//! - accepted outputs (`ModelRecord`) and decision thresholds

pub mod types;

pub use types::*;
