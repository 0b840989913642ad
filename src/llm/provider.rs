use async_trait::async_trait;

use super::types::{EmbeddingVector, RenderedPrompt};
use crate::core::errors::ServiceError;

#[async_trait]
pub trait Embedder: Send + Sync {
    /// return the provider name (e.g. "gemini", "openai_compatible")
    fn name(&self) -> &str;

    /// check if the embedding endpoint is reachable
    async fn health_check(&self) -> Result<bool, ServiceError> {
        Ok(true)
    }

    /// one outbound call turning `text` into a query vector
    async fn embed(&self, text: &str) -> Result<EmbeddingVector, ServiceError>;
}

#[async_trait]
pub trait Generator: Send + Sync {
    fn name(&self) -> &str;

    async fn health_check(&self) -> Result<bool, ServiceError> {
        Ok(true)
    }

    /// chat completion (non-streaming). A literal refusal from the model is still `Ok`.
    async fn generate(&self, prompt: &RenderedPrompt) -> Result<String, ServiceError>;
}
