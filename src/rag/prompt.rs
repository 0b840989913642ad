use super::types::{ContextBlock, Question, MODEL_REFUSAL};
use crate::llm::RenderedPrompt;

pub const DEFAULT_CORPUS_DOMAIN: &str = "the R. N. Champlin biblical encyclopedia";

/// Renders the fixed two-role instruction template.
#[derive(Debug, Clone)]
pub struct PromptBuilder {
    corpus_domain: String,
}

impl Default for PromptBuilder {
    fn default() -> Self {
        Self::new(DEFAULT_CORPUS_DOMAIN)
    }
}

impl PromptBuilder {
    pub fn new(corpus_domain: impl Into<String>) -> Self {
        Self {
            corpus_domain: corpus_domain.into(),
        }
    }

    pub fn system_prompt(&self) -> String {
        format!(
            "You are a study assistant for {}. Use the supplied CONTEXT to answer the QUESTION. \
             If the answer is not in the context, reply exactly '{}'. \
             Include sources (page and document) at the end of every answer.",
            self.corpus_domain, MODEL_REFUSAL
        )
    }

    pub fn build(&self, context: &ContextBlock, question: &Question) -> RenderedPrompt {
        RenderedPrompt {
            system: self.system_prompt(),
            user: format!("CONTEXT: {}\n\nQUESTION: {}", context, question),
        }
    }
}
