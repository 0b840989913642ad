use std::fmt;

use super::error::PipelineError;

/// Label used when a corpus row carries no file name.
pub const DEFAULT_SOURCE_LABEL: &str = "R. N. Champlin - Encyclopedia";

/// Returned instead of calling the model when the search yields nothing.
pub const NO_CONTEXT_ANSWER: &str = "No relevant context was found in the indexed corpus";

/// The literal the model is instructed to reply with when the context lacks the answer.
pub const MODEL_REFUSAL: &str = "CONTEXT NOT FOUND";

/// A caller's question. Never empty or whitespace-only; otherwise kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Question(String);

impl Question {
    pub fn parse(raw: impl Into<String>) -> Result<Self, PipelineError> {
        let raw = raw.into();
        if raw.trim().is_empty() {
            return Err(PipelineError::Validation(
                "question must not be empty".to_string(),
            ));
        }
        Ok(Self(raw))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Question {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One corpus fragment returned by similarity search. Rank is its position in the result list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetrievedPassage {
    pub content: String,
    pub source_label: Option<String>,
    pub page: Option<i64>,
}

impl RetrievedPassage {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            source_label: None,
            page: None,
        }
    }

    pub fn with_source(mut self, label: impl Into<String>) -> Self {
        self.source_label = Some(label.into());
        self
    }

    pub fn with_page(mut self, page: i64) -> Self {
        self.page = Some(page);
        self
    }
}

/// Citation-annotated passages in search order, ready for the prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContextBlock {
    text: String,
    passages: usize,
    omitted: usize,
}

impl ContextBlock {
    pub(crate) fn new(text: String, passages: usize, omitted: usize) -> Self {
        Self {
            text,
            passages,
            omitted,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// Number of passages included in the block.
    pub fn passage_count(&self) -> usize {
        self.passages
    }

    /// Number of trailing passages dropped by the context size bound.
    pub fn omitted_count(&self) -> usize {
        self.omitted
    }
}

impl fmt::Display for ContextBlock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

/// Successful pipeline outcome. Failures travel separately as `PipelineError`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Answer {
    /// Text produced by the model, returned unmodified.
    Generated(String),
    /// Search found nothing; the model was not consulted.
    NoContext,
}

impl Answer {
    pub fn text(&self) -> &str {
        match self {
            Answer::Generated(text) => text,
            Answer::NoContext => NO_CONTEXT_ANSWER,
        }
    }

    pub fn into_text(self) -> String {
        match self {
            Answer::Generated(text) => text,
            Answer::NoContext => NO_CONTEXT_ANSWER.to_string(),
        }
    }

    pub fn found_context(&self) -> bool {
        matches!(self, Answer::Generated(_))
    }

    /// The model looked at the context and replied with the refusal literal.
    pub fn is_model_refusal(&self) -> bool {
        matches!(self, Answer::Generated(text) if text.trim() == MODEL_REFUSAL)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rag::Stage;

    #[test]
    fn blank_questions_are_rejected() {
        for raw in ["", "   ", "\n\t "] {
            let err = Question::parse(raw).unwrap_err();
            assert_eq!(err.stage(), Stage::Validation);
        }
    }

    #[test]
    fn question_is_kept_verbatim() {
        let q = Question::parse("  Who was Cain's brother? ").unwrap();
        assert_eq!(q.as_str(), "  Who was Cain's brother? ");
    }

    #[test]
    fn answer_variants() {
        let refusal = Answer::Generated("CONTEXT NOT FOUND".to_string());
        assert!(refusal.is_model_refusal());
        assert!(refusal.found_context());

        let fallback = Answer::NoContext;
        assert!(!fallback.is_model_refusal());
        assert!(!fallback.found_context());
        assert_eq!(fallback.text(), NO_CONTEXT_ANSWER);

        let normal = Answer::Generated("Error-free answer about Abel.".to_string());
        assert!(!normal.is_model_refusal());
        assert_eq!(normal.into_text(), "Error-free answer about Abel.");
    }
}
