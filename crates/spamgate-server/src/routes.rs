//! HTTP routes and handlers

use axum::{
    extract::{ConnectInfo, Path, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use spamgate_core::{ConfigUpdate, EngineConfig, Post};
use spamgate_policy::{extract_origin, Stage};
use std::net::SocketAddr;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::state::AppState;

// ============================================================================
// Health endpoints
// ============================================================================

pub async fn health() -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "timestamp": Utc::now().to_rfc3339(),
    }))
}

pub async fn metrics(State(state): State<AppState>) -> String {
    state.metrics_handle.render()
}

// ============================================================================
// Classification
// ============================================================================

/// Body of `POST /validate-post`.
///
/// Fields are taken loosely so that a missing or non-string `text` becomes a
/// rejected decision rather than a malformed-request error.
#[derive(Debug, Default, Deserialize)]
pub struct ValidatePostRequest {
    #[serde(default)]
    pub text: Value,

    #[serde(default)]
    pub username: Value,

    #[serde(default)]
    pub timestamp: Value,
}

impl ValidatePostRequest {
    fn into_post(self, origin_ip: Option<String>) -> Post {
        Post {
            text: self.text.as_str().map(str::to_string),
            username: self.username.as_str().map(str::to_string),
            timestamp: self
                .timestamp
                .as_str()
                .and_then(|ts| DateTime::parse_from_rfc3339(ts).ok())
                .map(|ts| ts.with_timezone(&Utc)),
            origin_ip,
        }
    }
}

pub async fn validate_post(
    State(state): State<AppState>,
    connect_info: Option<ConnectInfo<SocketAddr>>,
    headers: HeaderMap,
    Json(req): Json<ValidatePostRequest>,
) -> Result<Json<Value>, AppError> {
    let request_id = Uuid::new_v4();
    let origin = extract_origin(&headers, connect_info.map(|ConnectInfo(addr)| addr));
    let post = req.into_post(origin);

    debug!(%request_id, origin = ?post.origin_ip, "Validating post");
    let outcome = state.engine.decide(&post).await;

    if outcome.stage == Stage::Origin {
        let reason = outcome.decision.reasons.join("; ");
        warn!(%request_id, origin = ?post.origin_ip, "Blocked origin");
        return Err(AppError::Forbidden(reason));
    }

    info!(
        %request_id,
        action = %outcome.decision.action,
        is_spam = outcome.decision.is_spam,
        "Post classified"
    );

    Ok(Json(json!({
        "success": true,
        "detection": outcome.decision,
    })))
}

// ============================================================================
// Configuration endpoints
// ============================================================================

/// Engine configuration as shown to clients; the credential itself is omitted
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigView<'a> {
    #[serde(flatten)]
    pub config: &'a EngineConfig,
    pub analyzer_key_configured: bool,
    pub analyzer_key_preview: Option<String>,
}

impl<'a> ConfigView<'a> {
    pub fn new(config: &'a EngineConfig) -> Self {
        Self {
            config,
            analyzer_key_configured: config.has_analyzer_key(),
            analyzer_key_preview: config.redacted_key(),
        }
    }
}

pub async fn get_config(State(state): State<AppState>) -> impl IntoResponse {
    let config = state.engine.config();
    Json(json!(ConfigView::new(&config)))
}

pub async fn update_config(
    State(state): State<AppState>,
    Json(update): Json<ConfigUpdate>,
) -> impl IntoResponse {
    if update.changes_analyzer_key() {
        info!("Analyzer credential updated");
    }

    let config = state.engine.update_config(&update);
    Json(json!({
        "success": true,
        "config": ConfigView::new(&config),
    }))
}

pub async fn ai_status(State(state): State<AppState>) -> impl IntoResponse {
    let status = state.engine.analyzer_status();
    let connected = status.configured && state.engine.test_connection().await;

    Json(json!({
        "ai_enabled": status.enabled,
        "ai_configured": status.configured,
        "connection_status": connected,
        "model_info": {
            "model": status.model,
            "key": status.redacted_key,
        },
    }))
}

// ============================================================================
// Blocklist endpoints
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct AddressRequest {
    #[serde(default)]
    pub ip: String,
}

#[derive(Debug, Deserialize)]
pub struct RangeRequest {
    #[serde(default)]
    pub cidr: String,
}

pub async fn list_blocked(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.engine.blocklist().list())
}

pub async fn block_address(
    State(state): State<AppState>,
    Json(req): Json<AddressRequest>,
) -> Result<Json<Value>, AppError> {
    if !state.engine.blocklist().add_address(&req.ip) {
        return Err(AppError::BadRequest("Invalid IP address format".to_string()));
    }

    Ok(success(format!("IP {} added to blocklist", req.ip)))
}

pub async fn unblock_address(
    State(state): State<AppState>,
    Path(ip): Path<String>,
) -> Result<Json<Value>, AppError> {
    if !state.engine.blocklist().remove_address(&ip) {
        return Err(AppError::NotFound("IP address not found in blocklist".to_string()));
    }

    Ok(success(format!("IP {} removed from blocklist", ip)))
}

pub async fn block_range(
    State(state): State<AppState>,
    Json(req): Json<RangeRequest>,
) -> Result<Json<Value>, AppError> {
    if !state.engine.blocklist().add_range(&req.cidr) {
        return Err(AppError::BadRequest("Invalid CIDR range format".to_string()));
    }

    Ok(success(format!("Range {} added to blocklist", req.cidr)))
}

pub async fn unblock_range(
    State(state): State<AppState>,
    Json(req): Json<RangeRequest>,
) -> Result<Json<Value>, AppError> {
    if !state.engine.blocklist().remove_range(&req.cidr) {
        return Err(AppError::NotFound("CIDR range not found in blocklist".to_string()));
    }

    Ok(success(format!("Range {} removed from blocklist", req.cidr)))
}

pub async fn clear_blocklist(State(state): State<AppState>) -> impl IntoResponse {
    state.engine.blocklist().clear();
    success("Blocklist cleared".to_string())
}

fn success(message: String) -> Json<Value> {
    Json(json!({ "success": true, "message": message }))
}

pub async fn fallback() -> AppError {
    AppError::NotFound("Not found".to_string())
}

// ============================================================================
// Errors
// ============================================================================

#[derive(Debug)]
pub enum AppError {
    BadRequest(String),
    NotFound(String),
    Forbidden(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, json!({ "error": msg })),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, json!({ "error": msg })),
            AppError::Forbidden(reason) => (
                StatusCode::FORBIDDEN,
                json!({ "error": "Access denied", "reason": reason }),
            ),
        };

        (status, Json(body)).into_response()
    }
}
