//! Retrieval-augmented answer pipeline.
//!
//! Validate → Embed → Search → (no passages? fallback : Assemble → Prompt → Generate).
//! Each leg consumes the previous leg's output, so the steps run strictly in order.
//! A failing leg ends the request immediately with a stage-tagged error; nothing is retried here.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio::time::Instant;
use tracing::Instrument;
use uuid::Uuid;

use super::context_builder::{ContextAssembler, ContextAssemblerConfig};
use super::error::{PipelineError, Stage};
use super::prompt::{PromptBuilder, DEFAULT_CORPUS_DOMAIN};
use super::store::PassageSearch;
use super::types::{Answer, Question};
use crate::core::errors::ServiceError;
use crate::llm::{Embedder, Generator};

#[derive(Debug, Clone)]
pub struct PipelineOptions {
    /// Candidate count requested from the vector store.
    pub match_count: usize,
    /// Dimension the corpus index was built with, if known.
    pub expected_dimension: Option<usize>,
    /// Whole-call deadline shared by the three network legs.
    pub timeout: Option<Duration>,
    pub assembler: ContextAssemblerConfig,
    pub corpus_domain: String,
}

impl PipelineOptions {
    pub fn new(match_count: usize) -> Self {
        Self {
            match_count,
            expected_dimension: None,
            timeout: None,
            assembler: ContextAssemblerConfig::default(),
            corpus_domain: DEFAULT_CORPUS_DOMAIN.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ComponentHealth {
    pub name: String,
    pub reachable: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct HealthReport {
    pub embedder: ComponentHealth,
    pub search: ComponentHealth,
    pub generator: ComponentHealth,
}

impl HealthReport {
    pub fn all_reachable(&self) -> bool {
        self.embedder.reachable && self.search.reachable && self.generator.reachable
    }
}

/// The only public entry point for answering questions. Built once at startup
/// with already-initialised clients and shared across requests.
pub struct RagPipeline {
    embedder: Arc<dyn Embedder>,
    search: Arc<dyn PassageSearch>,
    generator: Arc<dyn Generator>,
    assembler: ContextAssembler,
    prompts: PromptBuilder,
    options: PipelineOptions,
}

impl RagPipeline {
    pub fn new(
        embedder: Arc<dyn Embedder>,
        search: Arc<dyn PassageSearch>,
        generator: Arc<dyn Generator>,
        options: PipelineOptions,
    ) -> Result<Self, PipelineError> {
        if options.match_count == 0 {
            return Err(PipelineError::Configuration(
                "match_count must be at least 1".to_string(),
            ));
        }
        if options.expected_dimension == Some(0) {
            return Err(PipelineError::Configuration(
                "embedding dimension must be at least 1".to_string(),
            ));
        }

        Ok(Self {
            embedder,
            search,
            generator,
            assembler: ContextAssembler::new(options.assembler.clone()),
            prompts: PromptBuilder::new(options.corpus_domain.clone()),
            options,
        })
    }

    pub fn options(&self) -> &PipelineOptions {
        &self.options
    }

    /// Answer with the configured timeout.
    pub async fn answer_question(&self, question: &str) -> Result<Answer, PipelineError> {
        self.answer_within(question, self.options.timeout).await
    }

    /// Answer with a caller-supplied timeout (`None` waits indefinitely).
    ///
    /// Dropping the returned future aborts whichever request is in flight.
    pub async fn answer_within(
        &self,
        question: &str,
        timeout: Option<Duration>,
    ) -> Result<Answer, PipelineError> {
        let request_id = Uuid::new_v4();
        let span = tracing::info_span!("answer_question", %request_id);
        self.run(question, timeout).instrument(span).await
    }

    async fn run(&self, raw: &str, timeout: Option<Duration>) -> Result<Answer, PipelineError> {
        let question = Question::parse(raw).inspect_err(|_| {
            tracing::info!("rejected empty question");
        })?;
        tracing::info!(question_chars = question.as_str().chars().count(), "answering question");

        let deadline = timeout.map(|t| (Instant::now() + t, t));

        let vector = self
            .leg(
                Stage::Embedding,
                deadline,
                PipelineError::Embedding,
                self.embedder.embed(question.as_str()),
            )
            .await?;
        vector
            .ensure_dimension(self.options.expected_dimension)
            .map_err(PipelineError::Embedding)?;
        tracing::debug!(dimension = vector.dimension(), "question embedded");

        let passages = self
            .leg(
                Stage::Search,
                deadline,
                PipelineError::Search,
                self.search.search(&vector, self.options.match_count),
            )
            .await?;
        tracing::info!(
            passages = passages.len(),
            limit = self.options.match_count,
            "similarity search finished"
        );

        let Some(context) = self.assembler.assemble(&passages) else {
            tracing::info!("no passages matched; returning fallback answer");
            return Ok(Answer::NoContext);
        };

        let prompt = self.prompts.build(&context, &question);
        let text = self
            .leg(
                Stage::Generation,
                deadline,
                PipelineError::Generation,
                self.generator.generate(&prompt),
            )
            .await?;

        let answer = Answer::Generated(text);
        if answer.is_model_refusal() {
            tracing::info!("model reported the context does not contain the answer");
        }
        Ok(answer)
    }

    /// Runs one network leg against the shared deadline and tags any failure with its stage.
    async fn leg<T, F>(
        &self,
        stage: Stage,
        deadline: Option<(Instant, Duration)>,
        wrap: fn(ServiceError) -> PipelineError,
        fut: F,
    ) -> Result<T, PipelineError>
    where
        F: Future<Output = Result<T, ServiceError>>,
    {
        let result = match deadline {
            Some((at, after)) => match tokio::time::timeout_at(at, fut).await {
                Ok(result) => result,
                Err(_) => {
                    tracing::warn!(
                        %stage,
                        timeout_ms = after.as_millis() as u64,
                        "pipeline deadline exceeded"
                    );
                    return Err(PipelineError::TimedOut { stage, after });
                }
            },
            None => fut.await,
        };

        result.map_err(|err| {
            tracing::warn!(%stage, error = %err, "pipeline stage failed");
            wrap(err)
        })
    }

    /// Probe every collaborator. Unreachable services are reported, not raised.
    pub async fn health(&self) -> HealthReport {
        let (embedder, search, generator) = tokio::join!(
            self.embedder.health_check(),
            self.search.health_check(),
            self.generator.health_check(),
        );

        HealthReport {
            embedder: ComponentHealth {
                name: self.embedder.name().to_string(),
                reachable: embedder.unwrap_or(false),
            },
            search: ComponentHealth {
                name: self.search.name().to_string(),
                reachable: search.unwrap_or(false),
            },
            generator: ComponentHealth {
                name: self.generator.name().to_string(),
                reachable: generator.unwrap_or(false),
            },
        }
    }
}
