use serde::{Deserialize, Serialize};

use crate::core::errors::ServiceError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

/// A two-turn prompt: fixed instructions plus the context/question turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedPrompt {
    pub system: String,
    pub user: String,
}

impl RenderedPrompt {
    pub fn messages(&self) -> Vec<ChatMessage> {
        vec![
            ChatMessage::system(self.system.clone()),
            ChatMessage::user(self.user.clone()),
        ]
    }
}

/// Sampling knobs forwarded to the generation service when set.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GenerationParams {
    pub temperature: Option<f64>,
    pub max_output_tokens: Option<u32>,
}

/// Query embedding. Its length must match what the corpus index was built with.
#[derive(Debug, Clone, PartialEq)]
pub struct EmbeddingVector(Vec<f32>);

impl EmbeddingVector {
    pub fn new(values: Vec<f32>) -> Self {
        Self(values)
    }

    pub fn dimension(&self) -> usize {
        self.0.len()
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.0
    }

    pub fn into_inner(self) -> Vec<f32> {
        self.0
    }

    /// An empty vector is always rejected; a configured dimension must match exactly.
    pub fn ensure_dimension(&self, expected: Option<usize>) -> Result<(), ServiceError> {
        let actual = self.dimension();
        match expected {
            Some(expected) if expected != actual => {
                Err(ServiceError::DimensionMismatch { expected, actual })
            }
            _ if actual == 0 => Err(ServiceError::invalid(
                "embedding",
                "service returned an empty embedding",
            )),
            _ => Ok(()),
        }
    }
}

impl From<Vec<f32>> for EmbeddingVector {
    fn from(values: Vec<f32>) -> Self {
        Self::new(values)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dimension_mismatch_is_an_error() {
        let vector = EmbeddingVector::new(vec![0.1, 0.2, 0.3]);
        assert!(vector.ensure_dimension(None).is_ok());
        assert!(vector.ensure_dimension(Some(3)).is_ok());
        match vector.ensure_dimension(Some(768)) {
            Err(ServiceError::DimensionMismatch { expected, actual }) => {
                assert_eq!(expected, 768);
                assert_eq!(actual, 3);
            }
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn empty_vector_is_rejected_without_expected_dimension() {
        let vector = EmbeddingVector::new(Vec::new());
        assert!(matches!(
            vector.ensure_dimension(None),
            Err(ServiceError::InvalidResponse { .. })
        ));
    }

    #[test]
    fn prompt_messages_keep_role_order() {
        let prompt = RenderedPrompt {
            system: "rules".to_string(),
            user: "CONTEXT: x\n\nQUESTION: y".to_string(),
        };
        let messages = prompt.messages();
        assert_eq!(messages[0].role, "system");
        assert_eq!(messages[1], ChatMessage::user("CONTEXT: x\n\nQUESTION: y"));
    }
}
