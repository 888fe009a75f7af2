//! Spamgate Server
//!
//! HTTP surface over the decision engine: post classification, configuration,
//! analyzer introspection, blocklist management, health and metrics.

pub mod app;
pub mod config;
pub mod routes;
pub mod state;

pub use app::{build_app, run_server};
pub use config::ServiceConfig;
pub use state::AppState;
