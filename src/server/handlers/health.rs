use std::sync::Arc;

use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use chrono::Utc;
use serde_json::json;

use crate::state::AppState;

pub async fn health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "uptime_secs": (Utc::now() - state.started_at).num_seconds(),
    }))
}

/// Probes the embedding, search and generation services.
pub async fn get_status(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let report = state.pipeline.health().await;
    let status = if report.all_reachable() { "ok" } else { "degraded" };
    Json(json!({
        "status": status,
        "components": report,
        "match_count": state.pipeline.options().match_count,
    }))
}
