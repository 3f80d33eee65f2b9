//! Polynomial ECN model implementations.
//!
//! Models are implemented as small, pure functions so that fitting and
//! annotation code can stay generic over the fit kind.

pub mod model;

pub use model::*;
