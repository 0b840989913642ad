//! Abstract interface over the indexed corpus.
//!
//! The corpus is built and indexed elsewhere; the pipeline only queries it.
//! The primary implementation is `SupabaseSearch` in the `supabase` module.

use async_trait::async_trait;

use super::types::RetrievedPassage;
use crate::core::errors::ServiceError;
use crate::llm::EmbeddingVector;

#[async_trait]
pub trait PassageSearch: Send + Sync {
    /// Backend name used in logs and health reports.
    fn name(&self) -> &str;

    /// Check whether the store answers at all.
    async fn health_check(&self) -> Result<bool, ServiceError> {
        Ok(true)
    }

    /// Nearest-neighbour query returning at most `limit` passages, best match first.
    ///
    /// An empty result is not an error.
    async fn search(
        &self,
        query_embedding: &EmbeddingVector,
        limit: usize,
    ) -> Result<Vec<RetrievedPassage>, ServiceError>;
}
