//! RAG (Retrieval-Augmented Generation) module.
//!
//! This module provides:
//! - `RagPipeline`: the question → answer orchestrator
//! - `PassageSearch` / `SupabaseSearch`: similarity search over the indexed corpus
//! - `ContextAssembler`: citation-annotated context blocks
//! - `PromptBuilder`: the fixed answer-from-context instruction template

mod context_builder;
mod error;
mod pipeline;
mod prompt;
mod store;
mod supabase;
mod types;

pub use context_builder::{ContextAssembler, ContextAssemblerConfig, PASSAGE_DELIMITER};
pub use error::{PipelineError, Stage};
pub use pipeline::{ComponentHealth, HealthReport, PipelineOptions, RagPipeline};
pub use prompt::{PromptBuilder, DEFAULT_CORPUS_DOMAIN};
pub use store::PassageSearch;
pub use supabase::SupabaseSearch;
pub use types::{
    Answer, ContextBlock, Question, RetrievedPassage, DEFAULT_SOURCE_LABEL, MODEL_REFUSAL,
    NO_CONTEXT_ANSWER,
};
