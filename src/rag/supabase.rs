//! Similarity search through a Supabase (PostgREST) stored procedure.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};

use super::store::PassageSearch;
use super::types::RetrievedPassage;
use crate::core::errors::ServiceError;
use crate::llm::EmbeddingVector;

const SERVICE: &str = "vector store";

#[derive(Clone)]
pub struct SupabaseSearch {
    base_url: String,
    api_key: String,
    rpc_function: String,
    table: String,
    client: Client,
}

/// One row of the `vector_search` RPC result.
#[derive(Debug, Deserialize)]
struct MatchRow {
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    metadata: Option<Value>,
    #[serde(default)]
    file_name: Option<String>,
}

impl From<MatchRow> for RetrievedPassage {
    fn from(row: MatchRow) -> Self {
        RetrievedPassage {
            content: row.content.unwrap_or_default(),
            source_label: row.file_name.filter(|name| !name.trim().is_empty()),
            page: row.metadata.as_ref().and_then(page_from_metadata),
        }
    }
}

/// Ingestion wrote `metadata.page` as int, float or string depending on the loader.
fn page_from_metadata(metadata: &Value) -> Option<i64> {
    let page = metadata.get("page")?;
    if let Some(n) = page.as_i64() {
        return Some(n);
    }
    if let Some(f) = page.as_f64() {
        return (f.fract() == 0.0).then_some(f as i64);
    }
    page.as_str().and_then(|s| s.trim().parse().ok())
}

impl SupabaseSearch {
    pub fn new(
        client: Client,
        base_url: &str,
        api_key: String,
        rpc_function: &str,
        table: &str,
    ) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            rpc_function: rpc_function.to_string(),
            table: table.to_string(),
            client,
        }
    }

    fn rpc_url(&self) -> String {
        format!("{}/rest/v1/rpc/{}", self.base_url, self.rpc_function)
    }
}

#[async_trait]
impl PassageSearch for SupabaseSearch {
    fn name(&self) -> &str {
        "supabase"
    }

    async fn health_check(&self) -> Result<bool, ServiceError> {
        let url = format!("{}/rest/v1/{}", self.base_url, self.table);
        let res = self
            .client
            .get(&url)
            .query(&[("select", "*"), ("limit", "1")])
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
            .send()
            .await;
        match res {
            Ok(resp) => Ok(resp.status().is_success()),
            Err(_) => Ok(false),
        }
    }

    async fn search(
        &self,
        query_embedding: &EmbeddingVector,
        limit: usize,
    ) -> Result<Vec<RetrievedPassage>, ServiceError> {
        let body = json!({
            "query_embedding": query_embedding.as_slice(),
            "match_count": limit,
        });

        let res = self
            .client
            .post(self.rpc_url())
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| ServiceError::transport(SERVICE, e))?;

        if !res.status().is_success() {
            return Err(ServiceError::from_response(SERVICE, res).await);
        }

        let rows: Vec<MatchRow> = res
            .json()
            .await
            .map_err(|e| ServiceError::invalid(SERVICE, e.to_string()))?;

        Ok(rows.into_iter().map(RetrievedPassage::from).collect())
    }
}
