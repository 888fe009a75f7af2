//! Engine configuration and partial updates

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Thresholds and switches read by the decision engine.
///
/// The engine holds this behind an `Arc` and swaps whole snapshots on update,
/// so a decision never observes a half-applied threshold pair.
/// `flag_threshold <= spam_threshold` is the convention but is not enforced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EngineConfig {
    /// Total rule severity at or above which a post is rejected
    #[serde(default = "default_spam_threshold")]
    pub spam_threshold: u32,

    /// Total rule severity at or above which a post is flagged
    #[serde(default = "default_flag_threshold")]
    pub flag_threshold: u32,

    /// Maximum text length in characters
    #[serde(default = "default_max_text_length")]
    pub max_text_length: usize,

    /// Minimum trimmed text length in characters
    #[serde(default = "default_min_text_length")]
    pub min_text_length: usize,

    /// Consult the blocklist before anything else
    #[serde(default = "default_true")]
    pub ip_blocking_enabled: bool,

    /// Consult the external analyzer after rule evaluation
    #[serde(default = "default_true")]
    pub analyzer_enabled: bool,

    /// Upper bound on a single analyzer call
    #[serde(default = "default_analyzer_timeout_ms")]
    pub analyzer_timeout_ms: u64,

    /// Credential for the analyzer provider
    #[serde(default, skip_serializing)]
    pub analyzer_key: Option<String>,
}

impl EngineConfig {
    /// Shallow merge: every field present in `update` replaces the current value
    pub fn apply(&self, update: &ConfigUpdate) -> Self {
        let mut next = self.clone();

        if let Some(value) = update.spam_threshold {
            next.spam_threshold = value;
        }
        if let Some(value) = update.flag_threshold {
            next.flag_threshold = value;
        }
        if let Some(value) = update.max_text_length {
            next.max_text_length = value;
        }
        if let Some(value) = update.min_text_length {
            next.min_text_length = value;
        }
        if let Some(value) = update.ip_blocking_enabled {
            next.ip_blocking_enabled = value;
        }
        if let Some(value) = update.analyzer_enabled {
            next.analyzer_enabled = value;
        }
        if let Some(value) = update.analyzer_timeout_ms {
            next.analyzer_timeout_ms = value;
        }
        if let Some(ref key) = update.analyzer_key {
            next.analyzer_key = Some(key.clone());
        }

        next
    }

    /// Analyzer call budget
    pub fn analyzer_timeout(&self) -> Duration {
        Duration::from_millis(self.analyzer_timeout_ms)
    }

    /// Whether a non-empty credential is present
    pub fn has_analyzer_key(&self) -> bool {
        self.analyzer_key.as_deref().is_some_and(|k| !k.is_empty())
    }

    /// First eight characters of the credential followed by an ellipsis
    pub fn redacted_key(&self) -> Option<String> {
        self.analyzer_key
            .as_deref()
            .filter(|k| !k.is_empty())
            .map(redact_key)
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            spam_threshold: default_spam_threshold(),
            flag_threshold: default_flag_threshold(),
            max_text_length: default_max_text_length(),
            min_text_length: default_min_text_length(),
            ip_blocking_enabled: true,
            analyzer_enabled: true,
            analyzer_timeout_ms: default_analyzer_timeout_ms(),
            analyzer_key: None,
        }
    }
}

/// Partial configuration update; absent fields are left untouched
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigUpdate {
    pub spam_threshold: Option<u32>,
    pub flag_threshold: Option<u32>,
    pub max_text_length: Option<usize>,
    pub min_text_length: Option<usize>,
    pub ip_blocking_enabled: Option<bool>,
    pub analyzer_enabled: Option<bool>,
    pub analyzer_timeout_ms: Option<u64>,
    pub analyzer_key: Option<String>,
}

impl ConfigUpdate {
    /// Whether this update carries a new analyzer credential
    pub fn changes_analyzer_key(&self) -> bool {
        self.analyzer_key.is_some()
    }
}

/// Show only the first eight characters of a secret
pub fn redact_key(key: &str) -> String {
    let prefix: String = key.chars().take(8).collect();
    format!("{}...", prefix)
}

fn default_spam_threshold() -> u32 {
    7
}

fn default_flag_threshold() -> u32 {
    3
}

fn default_max_text_length() -> usize {
    280
}

fn default_min_text_length() -> usize {
    1
}

fn default_analyzer_timeout_ms() -> u64 {
    5_000
}

fn default_true() -> bool {
    true
}
