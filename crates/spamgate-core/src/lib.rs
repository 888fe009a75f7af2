//! Spamgate Core
//!
//! Core types, configuration, and errors shared across Spamgate components.
//!
//! This crate provides:
//! - The input [`Post`] and the output [`Decision`] of one pipeline run
//! - The structured [`AnalyzerVerdict`] produced by the external analyzer
//! - The engine configuration snapshot and its partial-update type
//! - Error types and result handling

pub mod config;
pub mod error;
pub mod types;

pub use config::{ConfigUpdate, EngineConfig};
pub use error::{Error, Result};
pub use types::{Action, AnalyzerSeverity, AnalyzerVerdict, Decision, Post};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::config::{ConfigUpdate, EngineConfig};
    pub use crate::error::{Error, Result};
    pub use crate::types::{Action, AnalyzerSeverity, AnalyzerVerdict, Decision, Post};
}
