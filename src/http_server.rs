//! HTTP server implementation using Axum.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::cancel::{self, KillOutcome};
use crate::registry::ExecutionRecord;
use crate::runner;
use crate::state::AppState;

// Request/Response types
#[derive(Deserialize)]
struct SubmitRequest {
    command: String,
    #[serde(default)]
    args: Vec<String>,
}

#[derive(Serialize)]
struct SubmitResponse {
    id: String,
}

/// Run the HTTP server on the given port with the provided state.
pub async fn run_server(port: u16, state: AppState) {
    let app = router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    info!("Starting HTTP server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await.unwrap();
    axum::serve(listener, app).await.unwrap();
}

/// Build the application router.
pub fn router(state: AppState) -> Router {
    Router::new()
        // Execution lifecycle
        .route("/executions", post(submit_execution))
        .route("/executions/:id", get(execution_status))
        .route("/executions/:id/kill", post(kill_execution))
        // Health check
        .route("/health", get(health))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health() -> &'static str {
    "OK"
}

async fn submit_execution(
    State(state): State<AppState>,
    Json(req): Json<SubmitRequest>,
) -> Result<Json<SubmitResponse>, (StatusCode, String)> {
    if !state.config.allows(&req.command) {
        return Err((StatusCode::NOT_FOUND, "command not found".to_string()));
    }

    let id = state.registry.create(req.command, req.args).await;
    tokio::spawn(runner::run_execution(state.clone(), id.clone()));
    info!("Created execution: {}", id);

    Ok(Json(SubmitResponse { id }))
}

async fn execution_status(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ExecutionRecord>, (StatusCode, String)> {
    match state.registry.get(&id).await {
        Some(record) => Ok(Json(record)),
        None => Err((StatusCode::NOT_FOUND, "command not found".to_string())),
    }
}

async fn kill_execution(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<String, (StatusCode, String)> {
    match cancel::kill_execution(&state.registry, &id).await {
        KillOutcome::Killed => Ok("killed".to_string()),
        KillOutcome::AlreadyTerminal => Ok("already finished".to_string()),
        KillOutcome::NotFound => Err((StatusCode::NOT_FOUND, "command not found".to_string())),
        KillOutcome::Failed => Err((
            StatusCode::INTERNAL_SERVER_ERROR,
            "internal server error".to_string(),
        )),
    }
}
