use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::State;
use axum::Json;
use serde_json::{json, Value};

use crate::core::errors::ApiError;
use crate::state::AppState;

/// `POST /rag_endpoint` with `{"query": "..."}`.
///
/// The body is parsed by hand so clients that omit `Content-Type` still work.
pub async fn rag_endpoint(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<Json<Value>, ApiError> {
    let payload: Value = serde_json::from_slice(&body)
        .map_err(|err| ApiError::BadRequest(format!("Invalid JSON body: {}", err)))?;

    let query = payload
        .get("query")
        .and_then(|v| v.as_str())
        .filter(|q| !q.trim().is_empty())
        .ok_or_else(|| ApiError::BadRequest("No valid question provided.".to_string()))?;

    let answer = state.pipeline.answer_question(query).await.map_err(|err| {
        tracing::error!(stage = %err.stage(), error = %err, "question could not be answered");
        ApiError::from(err)
    })?;

    Ok(Json(json!({
        "answer": answer.text(),
        "context_found": answer.found_context(),
        "model_refused": answer.is_model_refusal(),
    })))
}

pub async fn method_not_allowed() -> ApiError {
    ApiError::MethodNotAllowed
}
