//! Spamgate
//!
//! Classifies short text posts as allow, flag or reject.

use anyhow::Result;
use clap::Parser;
use metrics_exporter_prometheus::PrometheusHandle;
use spamgate_server::{run_server, AppState, ServiceConfig};
use std::net::SocketAddr;
use tokio::signal;
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, info, warn};

#[derive(Parser, Debug)]
#[command(name = "spamgate")]
#[command(about = "Spam classification service for short text posts", long_about = None)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, default_value = "config.yaml")]
    config: String,

    /// Listen address
    #[arg(short = 'l', long)]
    listen: Option<String>,

    /// Listen port
    #[arg(short = 'P', long, env = "PORT")]
    port: Option<u16>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Emit logs as JSON
    #[arg(long)]
    json_logs: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_tracing(cli.verbose, cli.json_logs);

    info!("Starting Spamgate");

    // Load configuration
    let mut config = ServiceConfig::load(&cli.config)?;
    config.apply_env();
    if let Some(listen) = cli.listen {
        config.listen = listen;
    }
    if let Some(port) = cli.port {
        config.port = port;
    }
    info!(
        spam_threshold = config.engine.spam_threshold,
        flag_threshold = config.engine.flag_threshold,
        "Configuration loaded"
    );

    let metrics_handle = init_metrics()?;
    let state = AppState::new(&config, metrics_handle)?;

    // Surface analyzer failures in the log stream
    let mut failures = state.engine.subscribe_failures();
    tokio::spawn(async move {
        loop {
            match failures.recv().await {
                Ok(failure) => debug!(
                    kind = %failure.kind,
                    message = %failure.message,
                    "Analyzer failure event"
                ),
                Err(RecvError::Lagged(skipped)) => debug!(skipped, "Analyzer failure events dropped"),
                Err(RecvError::Closed) => break,
            }
        }
    });

    let addr: SocketAddr = format!("{}:{}", config.listen, config.port).parse()?;

    let shutdown = async {
        shutdown_signal().await;
        warn!("Shutdown signal received, stopping server...");
    };

    run_server(state, addr, shutdown).await?;

    info!("Server shutdown complete");
    Ok(())
}

/// Listen for shutdown signals (SIGTERM, SIGINT)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

/// Initialize tracing/logging
fn init_tracing(verbose: bool, json: bool) {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let filter = if verbose {
        EnvFilter::new("spamgate=debug,tower_http=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("spamgate=info"))
    };

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

/// Initialize metrics exporter and return handle for rendering
fn init_metrics() -> Result<PrometheusHandle> {
    use metrics_exporter_prometheus::PrometheusBuilder;

    let handle = PrometheusBuilder::new()
        .install_recorder()
        .map_err(|e| anyhow::anyhow!("Failed to install metrics: {}", e))?;

    metrics::describe_counter!(
        "spamgate_decisions_total",
        "Total number of decisions by action and deciding stage"
    );
    metrics::describe_counter!(
        "spamgate_rules_triggered_total",
        "Total number of rule triggers by rule name"
    );
    metrics::describe_counter!(
        "spamgate_analyzer_failures_total",
        "Total number of analyzer calls that produced no verdict"
    );
    metrics::describe_histogram!(
        "spamgate_decision_latency_us",
        metrics::Unit::Microseconds,
        "Decision latency in microseconds"
    );

    info!("Metrics exporter initialized");
    Ok(handle)
}
