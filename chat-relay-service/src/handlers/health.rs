use axum::{extract::State, response::IntoResponse, Json};
use serde_json::json;

use crate::startup::AppState;

/// Liveness endpoint for container probes. Never waits on the provider.
pub async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "service": "chat-relay-service",
        "version": env!("CARGO_PKG_VERSION"),
        "turns": state.session.turn_count(),
    }))
}
