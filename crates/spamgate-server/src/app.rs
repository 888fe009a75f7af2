use crate::routes;
use crate::state::AppState;
use axum::{
    routing::{delete, get, post},
    Router,
};
use std::net::SocketAddr;
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;

/// Request bodies are small JSON documents
const MAX_BODY_BYTES: usize = 64 * 1024;

/// Build the Axum application
pub fn build_app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // Health
        .route("/health", get(routes::health))
        .route("/metrics", get(routes::metrics))
        // Classification
        .route("/validate-post", post(routes::validate_post))
        // Configuration
        .route("/config", get(routes::get_config).put(routes::update_config))
        .route("/ai-status", get(routes::ai_status))
        // Blocklist
        .route(
            "/blocked-ips",
            get(routes::list_blocked)
                .post(routes::block_address)
                .delete(routes::clear_blocklist),
        )
        .route("/blocked-ips/:ip", delete(routes::unblock_address))
        .route(
            "/blocked-ranges",
            post(routes::block_range).delete(routes::unblock_range),
        )
        .fallback(routes::fallback)
        .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Run the server until `shutdown` resolves
pub async fn run_server(
    state: AppState,
    addr: SocketAddr,
    shutdown: impl std::future::Future<Output = ()> + Send + 'static,
) -> anyhow::Result<()> {
    let app = build_app(state);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Spamgate listening on http://{}", addr);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown)
    .await?;

    Ok(())
}
