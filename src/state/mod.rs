use std::sync::Arc;

use chrono::{DateTime, Utc};
use reqwest::Client;

use crate::core::config::{ProviderKind, RagSettings};
use crate::llm::{Embedder, GeminiProvider, Generator, OpenAiCompatibleProvider};
use crate::rag::{PassageSearch, RagPipeline, SupabaseSearch};

pub mod error;

use error::InitializationError;

/// Shared application state handed to every route.
///
/// Holds the pipeline built once at startup; request handling never rebuilds clients.
#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<RagPipeline>,
    pub cors_allowed_origins: Vec<String>,
    pub started_at: DateTime<Utc>,
}

impl AppState {
    pub fn new(pipeline: Arc<RagPipeline>) -> Arc<Self> {
        Arc::new(AppState {
            pipeline,
            cors_allowed_origins: Vec::new(),
            started_at: Utc::now(),
        })
    }

    /// Builds the vendor clients named in `settings` around one shared HTTP connection pool.
    pub fn initialize(settings: &RagSettings) -> Result<Arc<Self>, InitializationError> {
        let client = Client::builder()
            .timeout(settings.llm.request_timeout)
            .build()
            .map_err(InitializationError::HttpClient)?;

        let (embedder, generator) = build_providers(settings, client.clone());
        let search: Arc<dyn PassageSearch> = Arc::new(SupabaseSearch::new(
            client,
            &settings.vector_store.url,
            settings.vector_store.api_key.clone(),
            &settings.vector_store.rpc_function,
            &settings.vector_store.table,
        ));

        let pipeline = RagPipeline::new(embedder, search, generator, settings.pipeline.clone())
            .map_err(InitializationError::Pipeline)?;

        tracing::info!(
            provider = ?settings.llm.provider,
            embedding_model = %settings.llm.embedding_model,
            generation_model = %settings.llm.generation_model,
            match_count = settings.vector_store.match_count,
            table = %settings.vector_store.table,
            "RAG pipeline initialized"
        );

        Ok(Arc::new(AppState {
            pipeline: Arc::new(pipeline),
            cors_allowed_origins: settings.server.cors_allowed_origins.clone(),
            started_at: Utc::now(),
        }))
    }
}

fn build_providers(
    settings: &RagSettings,
    client: Client,
) -> (Arc<dyn Embedder>, Arc<dyn Generator>) {
    let llm = &settings.llm;
    match llm.provider {
        ProviderKind::Gemini => {
            let provider = Arc::new(
                GeminiProvider::new(
                    client,
                    &llm.base_url,
                    llm.api_key.clone().unwrap_or_default(),
                    &llm.embedding_model,
                    &llm.generation_model,
                )
                .with_params(llm.params.clone()),
            );
            let embedder: Arc<dyn Embedder> = provider.clone();
            let generator: Arc<dyn Generator> = provider;
            (embedder, generator)
        }
        ProviderKind::OpenAiCompatible => {
            let provider = Arc::new(
                OpenAiCompatibleProvider::new(
                    client,
                    &llm.base_url,
                    llm.api_key.clone(),
                    &llm.embedding_model,
                    &llm.generation_model,
                )
                .with_params(llm.params.clone()),
            );
            let embedder: Arc<dyn Embedder> = provider.clone();
            let generator: Arc<dyn Generator> = provider;
            (embedder, generator)
        }
    }
}
