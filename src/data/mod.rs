//! Data sources beyond plain CSV ingest.
//!
//! - species name parsing (`species`)
//! - synthetic retention-time tables (`sample`)

pub mod sample;
pub mod species;

pub use sample::*;
pub use species::*;
