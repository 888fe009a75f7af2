//! Error types for Spamgate

/// Result type alias using Spamgate's Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for Spamgate operations.
///
/// Decisions themselves never fail: rejections are decisions and analyzer
/// failures are absorbed. What remains are start-up failures.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Rule construction errors: bad patterns, duplicate names, zero severity
    #[error("rule error: {0}")]
    Rule(String),
}

impl Error {
    /// Create a new rule error
    pub fn rule(msg: impl Into<String>) -> Self {
        Self::Rule(msg.into())
    }
}
