//! PhishGuard Core
//!
//! Core types and error handling shared across PhishGuard components.
//!
//! This crate provides:
//! - The canonical verdict labels and model variant tags
//! - Per-model results and the aggregated ensemble verdict
//! - Error types and result handling

pub mod error;
pub mod types;

pub use error::{Error, Result};
pub use types::{clamp_confidence, EnsembleVerdict, Label, ModelResult, ModelTag, Variant};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::error::{Error, Result};
    pub use crate::types::{EnsembleVerdict, Label, ModelResult, ModelTag, Variant};
}
