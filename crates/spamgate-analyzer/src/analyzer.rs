//! Analyzer trait and the disabled implementation

use crate::error::AnalyzerError;
use async_trait::async_trait;
use spamgate_core::AnalyzerVerdict;
use std::sync::Arc;

/// External text-classification capability
#[async_trait]
pub trait Analyzer: Send + Sync {
    /// Whether credentials are present
    fn configured(&self) -> bool;

    /// Ask the provider for a verdict on `text`.
    ///
    /// Unparseable output is not an error: it yields the fallback verdict.
    async fn analyze(&self, text: &str) -> Result<AnalyzerVerdict, AnalyzerError>;

    /// Minimal reachability probe
    async fn test_connection(&self) -> bool;

    /// Model identifier, when there is one
    fn model(&self) -> Option<&str> {
        None
    }
}

/// Builds an analyzer for a given credential.
///
/// The engine rebuilds its analyzer through this whenever the key changes.
pub trait AnalyzerFactory: Send + Sync {
    fn build(&self, key: Option<&str>) -> Arc<dyn Analyzer>;
}

impl<F> AnalyzerFactory for F
where
    F: Fn(Option<&str>) -> Arc<dyn Analyzer> + Send + Sync,
{
    fn build(&self, key: Option<&str>) -> Arc<dyn Analyzer> {
        self(key)
    }
}

/// Analyzer with no credentials; every call reports `NotConfigured`
#[derive(Debug, Default, Clone, Copy)]
pub struct DisabledAnalyzer;

#[async_trait]
impl Analyzer for DisabledAnalyzer {
    fn configured(&self) -> bool {
        false
    }

    async fn analyze(&self, _text: &str) -> Result<AnalyzerVerdict, AnalyzerError> {
        Err(AnalyzerError::NotConfigured)
    }

    async fn test_connection(&self) -> bool {
        false
    }
}
