//! Input/output helpers.
//!
//! - CSV ingest + validation (`ingest`)
//! - LipidSearch class mapping and adduct filter (`classmap`)
//! - model table export (`export`)
//! - model JSON read/write (`registry`)

pub mod classmap;
pub mod export;
pub mod ingest;
pub mod registry;

pub use classmap::*;
pub use export::*;
pub use ingest::*;
pub use registry::*;
