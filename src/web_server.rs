use std::{convert::Infallible, net::SocketAddr, path::PathBuf, sync::Arc};

use anyhow::{Context, Result};
use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    serve, Json, Router,
};
use serde_json::json;
use tower_http::{services::ServeDir, trace::TraceLayer};
use tracing::info;

use crate::error::GatewayError;
use crate::gateway::Gateway;
use crate::model::{ChatRequest, ChatResponse};

// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub gateway: Arc<Gateway>,
}

async fn chat_handler(
    State(state): State<AppState>,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> Result<Json<ChatResponse>, GatewayError> {
    // Malformed bodies, non-list messages and unknown roles are all bad input.
    let Json(request) = payload.map_err(|e| GatewayError::InvalidInput(e.body_text()))?;
    let response = state.gateway.handle(request.messages).await?;
    Ok(Json(response))
}

async fn health_handler(State(state): State<AppState>) -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "provider": state.gateway.provider(),
        "model": state.gateway.model(),
    }))
}

/// Build the router; `static_dir` serves a browser front end when given.
pub fn build_router(gateway: Arc<Gateway>, static_dir: Option<PathBuf>) -> Router {
    let state = AppState { gateway };

    let mut app = Router::new()
        .route("/api/chat", post(chat_handler))
        .route("/health", get(health_handler));

    if let Some(dir) = static_dir {
        info!("Serving static files from {}", dir.display());
        let static_files_service =
            ServeDir::new(dir).not_found_service(tower::service_fn(|_| async {
                Ok::<_, Infallible>((StatusCode::NOT_FOUND, "Not Found").into_response())
            }));
        app = app.fallback_service(static_files_service);
    }

    app.with_state(state).layer(TraceLayer::new_for_http()) // Add request logging
}

pub async fn start_web_server(
    addr: SocketAddr,
    gateway: Arc<Gateway>,
    static_dir: Option<PathBuf>,
) -> Result<()> {
    let app = build_router(gateway, static_dir);

    // Bind using tokio::net::TcpListener
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context(format!("Failed to bind to address {}", addr))?;
    info!("Web server listening on http://{}", addr);

    serve(listener, app.into_make_service())
        .await
        .context("Web server failed")?;

    Ok(())
}
