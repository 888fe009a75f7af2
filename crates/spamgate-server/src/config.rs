//! Service configuration

use anyhow::Context;
use serde::{Deserialize, Serialize};
use spamgate_analyzer::AnalyzerSettings;
use spamgate_core::EngineConfig;
use std::path::Path;
use tracing::info;

/// Environment variables consulted for the analyzer credential, in order
pub const KEY_ENV_VARS: [&str; 2] = ["SPAMGATE_ANALYZER_KEY", "OPENAI_API_KEY"];

/// Service configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// Listen address
    #[serde(default = "default_listen")]
    pub listen: String,

    /// Listen port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Engine thresholds and switches
    #[serde(default)]
    pub engine: EngineConfig,

    /// Analyzer provider connection
    #[serde(default)]
    pub analyzer: AnalyzerSettings,

    /// Entries seeded into the blocklist at start-up
    #[serde(default)]
    pub blocklist: BlocklistSeed,
}

/// Initial blocklist contents
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BlocklistSeed {
    #[serde(default)]
    pub addresses: Vec<String>,

    #[serde(default)]
    pub ranges: Vec<String>,
}

impl ServiceConfig {
    /// Load from a YAML file, or defaults when the file does not exist
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            info!("No configuration at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let config = serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse {}", path.display()))?;

        Ok(config)
    }

    /// Fill the analyzer key from the environment when the file has none
    pub fn apply_env(&mut self) {
        self.apply_key_lookup(|name| std::env::var(name).ok());
    }

    fn apply_key_lookup(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if self.engine.has_analyzer_key() {
            return;
        }

        if let Some(key) = KEY_ENV_VARS
            .iter()
            .filter_map(|name| lookup(name))
            .find(|value| !value.is_empty())
        {
            self.engine.analyzer_key = Some(key);
        }
    }
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            listen: default_listen(),
            port: default_port(),
            engine: EngineConfig::default(),
            analyzer: AnalyzerSettings::default(),
            blocklist: BlocklistSeed::default(),
        }
    }
}

fn default_listen() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    3000
}
