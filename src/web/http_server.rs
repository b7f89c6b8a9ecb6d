//! HTTP server for the token endpoint and web UI
//!
//! Exposes `GET /session` (ephemeral credential mint) plus health and
//! client configuration endpoints, and serves the embedded browser page.

use crate::web::embedded_assets::get_embedded_file;
use crate::web::shared::SharedState;
use axum::{
    extract::State,
    http::{Method, StatusCode, Uri},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use log::{error, info};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};

/// Generic error body returned to clients on mint failure. Upstream
/// detail stays in the server log only.
pub const MINT_FAILURE_BODY: &str = "Realtime token request failed";

/// Build the application router.
///
/// Cross-origin GETs are allowed from any origin so the page can be
/// served from elsewhere during development. Deployment default, not a
/// contract.
pub fn build_router(state: Arc<SharedState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET])
        .allow_headers(Any);

    Router::new()
        .route("/", get(index_handler))
        .route("/index.html", get(index_handler))
        .route("/session", get(session_handler))
        .route("/health", get(health_handler))
        .route("/config", get(client_config_handler))
        .fallback(embedded_fallback_handler)
        .layer(cors)
        .with_state(state)
}

/// Run the HTTP server until shutdown is requested
pub async fn run_http_server(
    state: Arc<SharedState>,
    shutdown: impl std::future::Future<Output = ()> + Send + 'static,
) -> Result<(), Box<dyn std::error::Error>> {
    let addr = format!("{}:{}", state.config.http.host, state.config.http.port);
    let app = build_router(state);

    let listener = TcpListener::bind(&addr).await?;
    info!("HTTP server listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await
        .map_err(|e| Box::new(e) as Box<dyn std::error::Error>)?;

    Ok(())
}

/// Mint one ephemeral credential and return the upstream JSON as-is.
///
/// No parameters, no retry: a failed mint surfaces immediately as a 500
/// with a generic body.
async fn session_handler(State(state): State<Arc<SharedState>>) -> Response {
    match state.minter.mint().await {
        Ok(credential) => {
            state.record_issuance();
            Json(credential).into_response()
        }
        Err(e) => {
            error!("Token minting failed: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, MINT_FAILURE_BODY).into_response()
        }
    }
}

/// Health check handler
async fn health_handler(State(state): State<Arc<SharedState>>) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "healthy",
        "uptime_seconds": state.uptime().as_secs_f64(),
        "credentials_issued": state.issued_count(),
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// Client-facing configuration so the embedded page does not hardcode
/// the upstream endpoint
async fn client_config_handler(State(state): State<Arc<SharedState>>) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "realtime_url": state.config.realtime.negotiate_url(),
        "model": state.config.realtime.model,
    }))
}

async fn index_handler() -> Response {
    get_embedded_file("index.html")
}

/// Handler for serving embedded static files
async fn embedded_fallback_handler(uri: Uri) -> Response {
    get_embedded_file(uri.path())
}
