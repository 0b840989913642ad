use std::fmt;
use std::time::Duration;

use serde::Serialize;
use thiserror::Error;

use crate::core::errors::ServiceError;

/// The pipeline step a failure originated from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Validation,
    Configuration,
    Embedding,
    Search,
    Generation,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Validation => "validation",
            Stage::Configuration => "configuration",
            Stage::Embedding => "embedding",
            Stage::Search => "search",
            Stage::Generation => "generation",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("invalid question: {0}")]
    Validation(String),

    #[error("pipeline misconfigured: {0}")]
    Configuration(String),

    #[error("failed to embed question: {0}")]
    Embedding(#[source] ServiceError),

    #[error("similarity search failed: {0}")]
    Search(#[source] ServiceError),

    #[error("answer generation failed: {0}")]
    Generation(#[source] ServiceError),

    #[error("{stage} did not finish within {}ms", .after.as_millis())]
    TimedOut { stage: Stage, after: Duration },
}

impl PipelineError {
    pub fn stage(&self) -> Stage {
        match self {
            PipelineError::Validation(_) => Stage::Validation,
            PipelineError::Configuration(_) => Stage::Configuration,
            PipelineError::Embedding(_) => Stage::Embedding,
            PipelineError::Search(_) => Stage::Search,
            PipelineError::Generation(_) => Stage::Generation,
            PipelineError::TimedOut { stage, .. } => *stage,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timeout_reports_the_stage_in_flight() {
        let err = PipelineError::TimedOut {
            stage: Stage::Search,
            after: Duration::from_millis(1500),
        };
        assert_eq!(err.stage(), Stage::Search);
        assert_eq!(err.to_string(), "search did not finish within 1500ms");
    }

    #[test]
    fn stage_serializes_snake_case() {
        let value = serde_json::to_value(Stage::Generation).unwrap();
        assert_eq!(value, serde_json::json!("generation"));
    }
}
