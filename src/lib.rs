//! `ecn-models` library crate.
//!
//! The binary (`ecn`) is a thin wrapper around this library so that:
//!
//! - model construction is testable without spawning processes
//! - the registry and annotation code can be reused from other tools

pub mod annotate;
pub mod app;
pub mod cli;
pub mod config;
pub mod data;
pub mod domain;
pub mod error;
pub mod fit;
pub mod io;
pub mod math;
pub mod models;
pub mod report;
