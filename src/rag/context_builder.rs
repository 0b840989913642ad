//! RAG Context Assembler.
//!
//! Turns ranked search results into the context block handed to the model:
//! 1. Keeps the store's similarity order untouched
//! 2. Appends a source citation to every passage
//! 3. Separates passages with a fixed delimiter, optionally bounding total size

use serde::{Deserialize, Serialize};

use super::types::{ContextBlock, RetrievedPassage, DEFAULT_SOURCE_LABEL};

/// Follows every passage unit, including the last one.
pub const PASSAGE_DELIMITER: &str = "\n\n---\n\n";

/// Configuration for context assembly.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContextAssemblerConfig {
    /// Label cited for passages without a file name
    pub default_source_label: String,
    /// Maximum context length in characters; `None` keeps every passage
    pub max_context_chars: Option<usize>,
}

impl Default for ContextAssemblerConfig {
    fn default() -> Self {
        Self {
            default_source_label: DEFAULT_SOURCE_LABEL.to_string(),
            max_context_chars: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ContextAssembler {
    config: ContextAssemblerConfig,
}

impl Default for ContextAssembler {
    fn default() -> Self {
        Self::new(ContextAssemblerConfig::default())
    }
}

impl ContextAssembler {
    pub fn new(config: ContextAssemblerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ContextAssemblerConfig {
        &self.config
    }

    /// Citation suffix for one passage, e.g. `" (Source: Vol. 3, Page: 42)"`.
    pub fn citation(&self, passage: &RetrievedPassage) -> String {
        let label = passage
            .source_label
            .as_deref()
            .unwrap_or(&self.config.default_source_label);
        match passage.page {
            Some(page) => format!(" (Source: {}, Page: {})", label, page),
            None => format!(" (Source: {})", label),
        }
    }

    /// Build the context block, or `None` when there is nothing to ground an answer on.
    pub fn assemble(&self, passages: &[RetrievedPassage]) -> Option<ContextBlock> {
        if passages.is_empty() {
            return None;
        }

        let mut context = String::new();
        let mut used_chars = 0;
        let mut included = 0;

        for passage in passages {
            let unit = format!(
                "{}{}{}",
                passage.content,
                self.citation(passage),
                PASSAGE_DELIMITER
            );
            let unit_chars = unit.chars().count();

            if let Some(max) = self.config.max_context_chars {
                // the best match always goes in, even if it alone exceeds the bound
                if included > 0 && used_chars + unit_chars > max {
                    break;
                }
            }

            context.push_str(&unit);
            used_chars += unit_chars;
            included += 1;
        }

        let omitted = passages.len() - included;
        if omitted > 0 {
            tracing::debug!(included, omitted, "context bound reached");
        }

        Some(ContextBlock::new(context, included, omitted))
    }
}
