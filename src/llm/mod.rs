//! Embedding and text-generation providers.

pub mod gemini;
pub mod openai_compat;
pub mod provider;
pub mod types;

pub use gemini::GeminiProvider;
pub use openai_compat::OpenAiCompatibleProvider;
pub use provider::{Embedder, Generator};
pub use types::{ChatMessage, EmbeddingVector, GenerationParams, RenderedPrompt};
