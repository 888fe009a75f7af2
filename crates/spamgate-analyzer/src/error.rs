//! Analyzer failure taxonomy

use thiserror::Error;

/// Reasons an analyzer call produced no verdict
#[derive(Debug, Clone, Error)]
pub enum AnalyzerError {
    #[error("analyzer is not configured")]
    NotConfigured,

    #[error("transport error: {0}")]
    Transport(String),

    #[error("provider returned status {0}")]
    Status(u16),

    #[error("provider returned no content")]
    EmptyResponse,

    #[error("analyzer call timed out")]
    Timeout,
}

impl AnalyzerError {
    /// Short label used for metrics and events
    pub fn kind(&self) -> &'static str {
        match self {
            Self::NotConfigured => "not_configured",
            Self::Transport(_) => "transport",
            Self::Status(_) => "status",
            Self::EmptyResponse => "empty_response",
            Self::Timeout => "timeout",
        }
    }
}

impl From<reqwest::Error> for AnalyzerError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            return Self::Timeout;
        }
        match err.status() {
            Some(status) => Self::Status(status.as_u16()),
            None => Self::Transport(err.to_string()),
        }
    }
}
