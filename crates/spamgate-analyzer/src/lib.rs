//! Spamgate Analyzer
//!
//! Adapter around an optional third-party text-classification call.
//!
//! The adapter is best-effort: when it is not configured, or the provider
//! fails in any way, callers get an [`AnalyzerError`] back instead of a
//! verdict and carry on with rule-based signals only. Provider output is
//! never trusted as-is; [`parse_verdict`] locates the JSON object in the raw
//! text and sanitizes it field by field into an [`AnalyzerVerdict`].
//!
//! [`AnalyzerVerdict`]: spamgate_core::AnalyzerVerdict

pub mod analyzer;
pub mod error;
pub mod openai;
pub mod verdict;

pub use analyzer::{Analyzer, AnalyzerFactory, DisabledAnalyzer};
pub use error::AnalyzerError;
pub use openai::{AnalyzerSettings, OpenAiAnalyzer, OpenAiAnalyzerFactory};
pub use verdict::{parse_verdict, ParsedVerdict};
