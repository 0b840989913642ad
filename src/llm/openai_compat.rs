use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde::Deserialize;
use serde_json::{json, Value};

use super::provider::{Embedder, Generator};
use super::types::{EmbeddingVector, GenerationParams, RenderedPrompt};
use crate::core::errors::ServiceError;

/// Any server speaking the OpenAI `/v1/embeddings` + `/v1/chat/completions` dialect
/// (OpenAI itself, LM Studio, vLLM, Ollama's compatibility layer).
#[derive(Clone)]
pub struct OpenAiCompatibleProvider {
    base_url: String,
    api_key: Option<String>,
    embedding_model: String,
    generation_model: String,
    params: GenerationParams,
    client: Client,
}

impl OpenAiCompatibleProvider {
    pub fn new(
        client: Client,
        base_url: &str,
        api_key: Option<String>,
        embedding_model: &str,
        generation_model: &str,
    ) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            embedding_model: embedding_model.to_string(),
            generation_model: generation_model.to_string(),
            params: GenerationParams::default(),
            client,
        }
    }

    pub fn with_params(mut self, params: GenerationParams) -> Self {
        self.params = params;
        self
    }

    fn authorized(&self, builder: RequestBuilder) -> RequestBuilder {
        match &self.api_key {
            Some(key) => builder.bearer_auth(key),
            None => builder,
        }
    }

    async fn models_reachable(&self) -> Result<bool, ServiceError> {
        let url = format!("{}/v1/models", self.base_url);
        let res = self.authorized(self.client.get(&url)).send().await;
        match res {
            Ok(resp) => Ok(resp.status().is_success()),
            Err(_) => Ok(false),
        }
    }

    fn chat_body(&self, prompt: &RenderedPrompt) -> Value {
        let mut body = json!({
            "model": self.generation_model,
            "messages": prompt.messages(),
            "stream": false,
        });

        if let Some(obj) = body.as_object_mut() {
            if let Some(t) = self.params.temperature {
                obj.insert("temperature".to_string(), json!(t));
            }
            if let Some(n) = self.params.max_output_tokens {
                obj.insert("max_tokens".to_string(), json!(n));
            }
        }

        body
    }
}

#[derive(Deserialize)]
struct EmbeddingsResponse {
    data: Vec<EmbeddingItem>,
}

#[derive(Deserialize)]
struct EmbeddingItem {
    embedding: Vec<f32>,
}

#[async_trait]
impl Embedder for OpenAiCompatibleProvider {
    fn name(&self) -> &str {
        "openai_compatible"
    }

    async fn health_check(&self) -> Result<bool, ServiceError> {
        self.models_reachable().await
    }

    async fn embed(&self, text: &str) -> Result<EmbeddingVector, ServiceError> {
        let url = format!("{}/v1/embeddings", self.base_url);
        let body = json!({
            "model": self.embedding_model,
            "input": [text],
        });

        let res = self
            .authorized(self.client.post(&url))
            .json(&body)
            .send()
            .await
            .map_err(|e| ServiceError::transport("embedding", e))?;

        if !res.status().is_success() {
            return Err(ServiceError::from_response("embedding", res).await);
        }

        let payload: EmbeddingsResponse = res
            .json()
            .await
            .map_err(|e| ServiceError::invalid("embedding", e.to_string()))?;

        payload
            .data
            .into_iter()
            .next()
            .map(|item| EmbeddingVector::new(item.embedding))
            .ok_or_else(|| ServiceError::invalid("embedding", "response contained no data"))
    }
}

#[async_trait]
impl Generator for OpenAiCompatibleProvider {
    fn name(&self) -> &str {
        "openai_compatible"
    }

    async fn health_check(&self) -> Result<bool, ServiceError> {
        self.models_reachable().await
    }

    async fn generate(&self, prompt: &RenderedPrompt) -> Result<String, ServiceError> {
        let url = format!("{}/v1/chat/completions", self.base_url);
        let body = self.chat_body(prompt);

        let res = self
            .authorized(self.client.post(&url))
            .json(&body)
            .send()
            .await
            .map_err(|e| ServiceError::transport("generation", e))?;

        if !res.status().is_success() {
            return Err(ServiceError::from_response("generation", res).await);
        }

        let payload: Value = res
            .json()
            .await
            .map_err(|e| ServiceError::invalid("generation", e.to_string()))?;

        payload["choices"][0]["message"]["content"]
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| {
                ServiceError::invalid("generation", "missing choices[0].message.content")
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chat_body_sends_system_then_user() {
        let provider = OpenAiCompatibleProvider::new(
            Client::new(),
            "http://localhost:1234/",
            None,
            "text-embedding-3-small",
            "gpt-4o-mini",
        )
        .with_params(GenerationParams {
            temperature: Some(0.1),
            max_output_tokens: None,
        });
        let prompt = RenderedPrompt {
            system: "sys".to_string(),
            user: "usr".to_string(),
        };

        let body = provider.chat_body(&prompt);
        assert_eq!(body["model"], "gpt-4o-mini");
        assert_eq!(body["messages"][0]["role"], "system");
        assert_eq!(body["messages"][1]["content"], "usr");
        assert_eq!(body["temperature"], 0.1);
        assert!(body.get("max_tokens").is_none());
        assert_eq!(provider.base_url, "http://localhost:1234");
    }
}
