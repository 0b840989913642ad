//! HTTP client for a deployed `/rag_endpoint`.

use reqwest::Client;
use serde_json::{json, Value};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RemoteError {
    #[error("RAG endpoint URL is not configured (set RAG_ENDPOINT_URL)")]
    NotConfigured,

    #[error("RAG server is not reachable: {0}")]
    Connection(#[source] reqwest::Error),

    #[error("RAG server returned HTTP {status}: {message}")]
    Http { status: u16, message: String },

    #[error("invalid response from RAG server: {0}")]
    InvalidResponse(String),
}

#[derive(Clone)]
pub struct RemoteRagClient {
    endpoint: String,
    client: Client,
}

impl RemoteRagClient {
    /// `base_url` is the server root; `/rag_endpoint` is appended.
    pub fn new(base_url: &str) -> Result<Self, RemoteError> {
        Self::with_client(base_url, Client::new())
    }

    pub fn with_client(base_url: &str, client: Client) -> Result<Self, RemoteError> {
        let base = base_url.trim().trim_end_matches('/');
        if base.is_empty() {
            return Err(RemoteError::NotConfigured);
        }
        Ok(Self {
            endpoint: format!("{}/rag_endpoint", base),
            client,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub async fn ask(&self, query: &str) -> Result<String, RemoteError> {
        let res = self
            .client
            .post(&self.endpoint)
            .json(&json!({ "query": query }))
            .send()
            .await
            .map_err(RemoteError::Connection)?;

        let status = res.status();
        let payload: Option<Value> = res.json().await.ok();

        if !status.is_success() {
            let message = payload
                .as_ref()
                .and_then(|p| p.get("answer"))
                .and_then(|v| v.as_str())
                .unwrap_or_else(|| status.canonical_reason().unwrap_or("unknown error"))
                .to_string();
            return Err(RemoteError::Http {
                status: status.as_u16(),
                message,
            });
        }

        payload
            .as_ref()
            .and_then(|p| p.get("answer"))
            .and_then(|v| v.as_str())
            .map(str::to_string)
            .ok_or_else(|| RemoteError::InvalidResponse("missing 'answer' field".to_string()))
    }
}
