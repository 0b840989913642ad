use std::path::PathBuf;

use axum::{http::StatusCode, response::IntoResponse, Json};
use serde_json::json;
use thiserror::Error;

use crate::rag::{PipelineError, Stage};

/// Failure talking to one of the outbound services (embedding, vector store, generation).
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("request to {service} failed: {source}")]
    Transport {
        service: &'static str,
        #[source]
        source: reqwest::Error,
    },

    #[error("{service} returned HTTP {status}: {body}")]
    Status {
        service: &'static str,
        status: u16,
        body: String,
    },

    #[error("unexpected response from {service}: {message}")]
    InvalidResponse {
        service: &'static str,
        message: String,
    },

    #[error("embedding has {actual} dimensions, index expects {expected}")]
    DimensionMismatch { expected: usize, actual: usize },
}

impl ServiceError {
    pub fn transport(service: &'static str, source: reqwest::Error) -> Self {
        ServiceError::Transport { service, source }
    }

    pub fn invalid<M: Into<String>>(service: &'static str, message: M) -> Self {
        ServiceError::InvalidResponse {
            service,
            message: message.into(),
        }
    }

    /// Turns a non-success HTTP response into `ServiceError::Status`, keeping the body for logs.
    pub async fn from_response(service: &'static str, response: reqwest::Response) -> Self {
        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        ServiceError::Status {
            service,
            status,
            body,
        }
    }
}

/// Startup-time configuration failure. Blocks construction of the pipeline.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required configuration: {}", .0.join(", "))]
    Missing(Vec<String>),

    #[error("invalid config at '{path}': {reason}")]
    Invalid { path: String, reason: String },

    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("bad request: {0}")]
    BadRequest(String),
    #[error("method not allowed")]
    MethodNotAllowed,
    #[error(transparent)]
    Pipeline(#[from] PipelineError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let (status, body) = match &self {
            ApiError::BadRequest(msg) => (
                StatusCode::BAD_REQUEST,
                json!({
                    "answer": msg,
                    "error": { "stage": Stage::Validation, "message": msg },
                }),
            ),
            ApiError::MethodNotAllowed => (
                StatusCode::METHOD_NOT_ALLOWED,
                json!({ "answer": "Method not allowed." }),
            ),
            ApiError::Pipeline(err) => {
                let status = match err.stage() {
                    Stage::Validation => StatusCode::BAD_REQUEST,
                    _ => StatusCode::INTERNAL_SERVER_ERROR,
                };
                json_error(status, err)
            }
        };

        (status, Json(body)).into_response()
    }
}

fn json_error(status: StatusCode, err: &PipelineError) -> (StatusCode, serde_json::Value) {
    let message = err.to_string();
    (
        status,
        json!({
            "answer": message,
            "error": { "stage": err.stage(), "message": message },
        }),
    )
}
