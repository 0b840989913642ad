use thiserror::Error;

use crate::core::errors::ConfigError;
use crate::rag::PipelineError;

#[derive(Debug, Error)]
pub enum InitializationError {
    #[error("Failed to load configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("Failed to build HTTP client: {0}")]
    HttpClient(#[source] reqwest::Error),

    #[error("Failed to build RAG pipeline: {0}")]
    Pipeline(#[source] PipelineError),
}
