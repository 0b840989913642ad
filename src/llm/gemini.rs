use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};

use super::provider::{Embedder, Generator};
use super::types::{EmbeddingVector, GenerationParams, RenderedPrompt};
use crate::core::errors::ServiceError;

pub const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_GEMINI_EMBEDDING_MODEL: &str = "models/embedding-001";
pub const DEFAULT_GEMINI_GENERATION_MODEL: &str = "gemini-2.5-flash";

/// Google Gemini REST client for both embeddings and text generation.
#[derive(Clone)]
pub struct GeminiProvider {
    base_url: String,
    api_key: String,
    embedding_model: String,
    generation_model: String,
    params: GenerationParams,
    client: Client,
}

impl GeminiProvider {
    pub fn new(
        client: Client,
        base_url: &str,
        api_key: String,
        embedding_model: &str,
        generation_model: &str,
    ) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            embedding_model: model_path(embedding_model),
            generation_model: model_path(generation_model),
            params: GenerationParams::default(),
            client,
        }
    }

    pub fn with_params(mut self, params: GenerationParams) -> Self {
        self.params = params;
        self
    }

    fn endpoint(&self, model: &str, method: &str) -> String {
        format!("{}/v1beta/{}:{}", self.base_url, model, method)
    }

    async fn post(
        &self,
        url: &str,
        body: &Value,
        service: &'static str,
    ) -> Result<Value, ServiceError> {
        let res = self
            .client
            .post(url)
            .header("x-goog-api-key", &self.api_key)
            .json(body)
            .send()
            .await
            .map_err(|e| ServiceError::transport(service, e))?;

        if !res.status().is_success() {
            return Err(ServiceError::from_response(service, res).await);
        }

        res.json::<Value>()
            .await
            .map_err(|e| ServiceError::invalid(service, e.to_string()))
    }

    async fn model_reachable(&self, model: &str) -> Result<bool, ServiceError> {
        let url = format!("{}/v1beta/{}", self.base_url, model);
        let res = self
            .client
            .get(&url)
            .header("x-goog-api-key", &self.api_key)
            .send()
            .await;
        match res {
            Ok(resp) => Ok(resp.status().is_success()),
            Err(_) => Ok(false),
        }
    }

    fn generation_body(&self, prompt: &RenderedPrompt) -> Value {
        let mut body = json!({
            "systemInstruction": { "parts": [{ "text": prompt.system }] },
            "contents": [{ "role": "user", "parts": [{ "text": prompt.user }] }],
        });

        let mut generation_config = serde_json::Map::new();
        if let Some(t) = self.params.temperature {
            generation_config.insert("temperature".to_string(), json!(t));
        }
        if let Some(n) = self.params.max_output_tokens {
            generation_config.insert("maxOutputTokens".to_string(), json!(n));
        }
        if !generation_config.is_empty() {
            if let Some(obj) = body.as_object_mut() {
                obj.insert("generationConfig".to_string(), Value::Object(generation_config));
            }
        }

        body
    }
}

/// Gemini addresses models as `models/<id>`; accept either spelling in config.
fn model_path(model: &str) -> String {
    if model.starts_with("models/") {
        model.to_string()
    } else {
        format!("models/{}", model)
    }
}

fn parse_embedding(payload: &Value) -> Result<EmbeddingVector, ServiceError> {
    let values = payload["embedding"]["values"]
        .as_array()
        .ok_or_else(|| ServiceError::invalid("embedding", "missing embedding.values"))?;

    let vector = values
        .iter()
        .map(|v| v.as_f64().map(|f| f as f32))
        .collect::<Option<Vec<f32>>>()
        .ok_or_else(|| ServiceError::invalid("embedding", "non-numeric embedding value"))?;

    Ok(EmbeddingVector::new(vector))
}

fn parse_generation(payload: &Value) -> Result<String, ServiceError> {
    let Some(parts) = payload["candidates"][0]["content"]["parts"].as_array() else {
        let reason = payload["promptFeedback"]["blockReason"]
            .as_str()
            .or_else(|| payload["candidates"][0]["finishReason"].as_str())
            .unwrap_or("no candidates returned");
        return Err(ServiceError::invalid("generation", reason));
    };

    let text: String = parts.iter().filter_map(|p| p["text"].as_str()).collect();
    if text.is_empty() {
        return Err(ServiceError::invalid("generation", "candidate contained no text"));
    }
    Ok(text)
}

#[async_trait]
impl Embedder for GeminiProvider {
    fn name(&self) -> &str {
        "gemini"
    }

    async fn health_check(&self) -> Result<bool, ServiceError> {
        self.model_reachable(&self.embedding_model).await
    }

    async fn embed(&self, text: &str) -> Result<EmbeddingVector, ServiceError> {
        let url = self.endpoint(&self.embedding_model, "embedContent");
        let body = json!({
            "model": self.embedding_model,
            "content": { "parts": [{ "text": text }] },
        });

        let payload = self.post(&url, &body, "embedding").await?;
        parse_embedding(&payload)
    }
}

#[async_trait]
impl Generator for GeminiProvider {
    fn name(&self) -> &str {
        "gemini"
    }

    async fn health_check(&self) -> Result<bool, ServiceError> {
        self.model_reachable(&self.generation_model).await
    }

    async fn generate(&self, prompt: &RenderedPrompt) -> Result<String, ServiceError> {
        let url = self.endpoint(&self.generation_model, "generateContent");
        let body = self.generation_body(prompt);

        let payload = self.post(&url, &body, "generation").await?;
        parse_generation(&payload)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn provider() -> GeminiProvider {
        GeminiProvider::new(
            Client::new(),
            "https://example.test/",
            "key".to_string(),
            "embedding-001",
            "models/gemini-2.5-flash",
        )
    }

    #[test]
    fn model_ids_are_normalised() {
        let p = provider();
        assert_eq!(
            p.endpoint(&p.embedding_model, "embedContent"),
            "https://example.test/v1beta/models/embedding-001:embedContent"
        );
        assert_eq!(p.generation_model, "models/gemini-2.5-flash");
    }

    #[test]
    fn generation_body_carries_system_instruction() {
        let prompt = RenderedPrompt {
            system: "sys".to_string(),
            user: "usr".to_string(),
        };
        let body = provider().generation_body(&prompt);
        assert_eq!(body["systemInstruction"]["parts"][0]["text"], "sys");
        assert_eq!(body["contents"][0]["parts"][0]["text"], "usr");
        assert!(body.get("generationConfig").is_none());

        let tuned = provider()
            .with_params(GenerationParams {
                temperature: Some(0.2),
                max_output_tokens: Some(512),
            })
            .generation_body(&prompt);
        assert_eq!(tuned["generationConfig"]["maxOutputTokens"], 512);
    }

    #[test]
    fn parses_embedding_values() {
        let payload = json!({ "embedding": { "values": [0.5, -1.0, 2.0] } });
        let vector = parse_embedding(&payload).unwrap();
        assert_eq!(vector.as_slice(), &[0.5, -1.0, 2.0]);

        assert!(parse_embedding(&json!({ "embedding": {} })).is_err());
    }

    #[test]
    fn concatenates_candidate_parts() {
        let payload = json!({
            "candidates": [{
                "content": { "parts": [{ "text": "Cain's brother " }, { "text": "was Abel." }] }
            }]
        });
        assert_eq!(parse_generation(&payload).unwrap(), "Cain's brother was Abel.");
    }

    #[test]
    fn blocked_prompt_is_an_invalid_response() {
        let payload = json!({ "promptFeedback": { "blockReason": "SAFETY" } });
        match parse_generation(&payload) {
            Err(ServiceError::InvalidResponse { message, .. }) => assert_eq!(message, "SAFETY"),
            other => panic!("unexpected: {:?}", other),
        }
    }
}
