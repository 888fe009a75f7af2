//! Shared application state

use crate::config::ServiceConfig;
use metrics_exporter_prometheus::PrometheusHandle;
use spamgate_analyzer::{AnalyzerFactory, OpenAiAnalyzerFactory};
use spamgate_policy::DecisionEngine;
use spamgate_rules::RuleSet;
use std::sync::Arc;
use tracing::{info, warn};

/// Application state shared across all requests
#[derive(Clone)]
pub struct AppState {
    /// Decision engine, including the blocklist
    pub engine: Arc<DecisionEngine>,

    /// Prometheus metrics handle for rendering
    pub metrics_handle: PrometheusHandle,
}

impl AppState {
    /// Build the engine from configuration with the OpenAI-compatible analyzer
    pub fn new(config: &ServiceConfig, metrics_handle: PrometheusHandle) -> anyhow::Result<Self> {
        let factory = OpenAiAnalyzerFactory::new(config.analyzer.clone());
        Self::with_factory(config, factory, metrics_handle)
    }

    /// Build the engine with a custom analyzer factory
    pub fn with_factory(
        config: &ServiceConfig,
        factory: impl AnalyzerFactory + 'static,
        metrics_handle: PrometheusHandle,
    ) -> anyhow::Result<Self> {
        let rules = RuleSet::standard()?;
        info!("Loaded {} rules", rules.len());

        let engine = DecisionEngine::new(config.engine.clone(), rules, factory);
        seed_blocklist(&engine, config);

        let status = engine.analyzer_status();
        info!(
            enabled = status.enabled,
            configured = status.configured,
            model = status.model.as_deref().unwrap_or("none"),
            "Analyzer initialized"
        );

        Ok(Self {
            engine: Arc::new(engine),
            metrics_handle,
        })
    }
}

fn seed_blocklist(engine: &DecisionEngine, config: &ServiceConfig) {
    let blocklist = engine.blocklist();

    for ip in &config.blocklist.addresses {
        if !blocklist.add_address(ip) {
            warn!(ip = %ip, "Skipping invalid blocklist address");
        }
    }
    for cidr in &config.blocklist.ranges {
        if !blocklist.add_range(cidr) {
            warn!(cidr = %cidr, "Skipping invalid blocklist range");
        }
    }

    let entries = blocklist.list();
    info!(
        addresses = entries.addresses.len(),
        ranges = entries.ranges.len(),
        "Blocklist seeded"
    );
}
