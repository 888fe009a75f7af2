//! Core types for Spamgate

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Reasoning reported by the analyzer fallback verdict
pub const FALLBACK_REASONING: &str = "Failed to analyze content with AI";

/// Category reported by the analyzer fallback verdict
pub const FALLBACK_CATEGORY: &str = "analysis_error";

/// A short text post submitted for classification.
///
/// A post is immutable input to exactly one decision and is never stored.
/// `text` is optional because the transport may hand over a body with the
/// field missing or of the wrong type; the engine rejects those.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    /// Post body
    pub text: Option<String>,

    /// Author handle, informational only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,

    /// Client-supplied creation time
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,

    /// Resolved network origin of the request
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub origin_ip: Option<String>,
}

impl Post {
    /// Create a post with text only
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            ..Default::default()
        }
    }

    /// Attach an origin address
    pub fn with_origin(mut self, ip: impl Into<String>) -> Self {
        self.origin_ip = Some(ip.into());
        self
    }

    /// Attach an author handle
    pub fn with_username(mut self, username: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self
    }

    /// Text of the post, or the empty string when absent
    pub fn text(&self) -> &str {
        self.text.as_deref().unwrap_or("")
    }
}

/// Outcome of a decision, governing downstream handling of a post
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    /// Publish as-is
    Allow,
    /// Publish but queue for review
    Flag,
    /// Refuse the post
    Reject,
}

impl Action {
    /// Lowercase name, as used in metrics labels and JSON
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Allow => "allow",
            Self::Flag => "flag",
            Self::Reject => "reject",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Severity reported by the external analyzer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnalyzerSeverity {
    #[default]
    Low,
    Medium,
    High,
}

impl AnalyzerSeverity {
    /// Parse one of the exact names `low`, `medium`, `high`
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "low" => Some(Self::Low),
            "medium" => Some(Self::Medium),
            "high" => Some(Self::High),
            _ => None,
        }
    }
}

/// Structured opinion from the external analyzer.
///
/// Always produced through sanitization, so `confidence` is within `[0, 1]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzerVerdict {
    pub is_spam: bool,
    pub confidence: f64,
    pub reasoning: String,
    pub categories: Vec<String>,
    pub severity: AnalyzerSeverity,
}

impl AnalyzerVerdict {
    /// The verdict used when the provider output cannot be parsed
    pub fn fallback() -> Self {
        Self {
            is_spam: false,
            confidence: 0.0,
            reasoning: FALLBACK_REASONING.to_string(),
            categories: vec![FALLBACK_CATEGORY.to_string()],
            severity: AnalyzerSeverity::Low,
        }
    }

    /// Whether the verdict marks spam with confidence strictly above `threshold`
    pub fn is_confident_spam(&self, threshold: f64) -> bool {
        self.is_spam && self.confidence > threshold
    }
}

/// Output of one pipeline run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Decision {
    pub is_spam: bool,
    pub confidence: f64,
    pub reasons: Vec<String>,
    pub action: Action,
    #[serde(
        rename = "aiAnalysis",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub analyzer_verdict: Option<AnalyzerVerdict>,
}

impl Decision {
    /// A short-circuit rejection with full confidence
    pub fn rejected(reasons: Vec<String>) -> Self {
        Self {
            is_spam: true,
            confidence: 1.0,
            reasons,
            action: Action::Reject,
            analyzer_verdict: None,
        }
    }

    /// Build a decision, clamping confidence into `[0, 1]`
    pub fn new(
        is_spam: bool,
        confidence: f64,
        reasons: Vec<String>,
        action: Action,
        analyzer_verdict: Option<AnalyzerVerdict>,
    ) -> Self {
        Self {
            is_spam,
            confidence: clamp_unit(confidence),
            reasons,
            action,
            analyzer_verdict,
        }
    }
}

/// Clamp into `[0, 1]`, mapping NaN to 0
pub fn clamp_unit(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}
