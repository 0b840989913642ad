//! Typed view of the validated config tree.

use std::time::Duration;

use serde_json::Value;

use crate::core::errors::ConfigError;
use crate::llm::gemini::{
    DEFAULT_GEMINI_BASE_URL, DEFAULT_GEMINI_EMBEDDING_MODEL, DEFAULT_GEMINI_GENERATION_MODEL,
};
use crate::llm::GenerationParams;
use crate::rag::{ContextAssemblerConfig, PipelineOptions};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderKind {
    Gemini,
    OpenAiCompatible,
}

#[derive(Debug, Clone)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    pub cors_allowed_origins: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct LlmSettings {
    pub provider: ProviderKind,
    pub base_url: String,
    pub api_key: Option<String>,
    pub embedding_model: String,
    pub generation_model: String,
    pub params: GenerationParams,
    pub request_timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct VectorStoreSettings {
    pub url: String,
    pub api_key: String,
    pub rpc_function: String,
    pub table: String,
    pub match_count: usize,
}

#[derive(Debug, Clone)]
pub struct RagSettings {
    pub server: ServerSettings,
    pub llm: LlmSettings,
    pub vector_store: VectorStoreSettings,
    pub pipeline: PipelineOptions,
}

impl RagSettings {
    /// Expects a tree that already passed `validate_config`. Every missing
    /// required value is reported at once.
    pub fn from_config(config: &Value) -> Result<Self, ConfigError> {
        let mut missing = Vec::new();

        let provider = match str_at(config, "llm", "provider") {
            Some("openai_compatible") => ProviderKind::OpenAiCompatible,
            _ => ProviderKind::Gemini,
        };

        let api_key = str_at(config, "llm", "api_key").map(str::to_string);
        if provider == ProviderKind::Gemini && api_key.is_none() {
            missing.push("llm.api_key (GEMINI_API_KEY)".to_string());
        }

        // Gemini endpoints are known; a self-hosted server must be named explicitly.
        let (base_url, embedding_model, generation_model) = match provider {
            ProviderKind::Gemini => (
                str_or(config, "llm", "base_url", DEFAULT_GEMINI_BASE_URL),
                str_or(config, "llm", "embedding_model", DEFAULT_GEMINI_EMBEDDING_MODEL),
                str_or(config, "llm", "generation_model", DEFAULT_GEMINI_GENERATION_MODEL),
            ),
            ProviderKind::OpenAiCompatible => (
                required_str(config, "llm", "base_url", &mut missing),
                required_str(config, "llm", "embedding_model", &mut missing),
                required_str(config, "llm", "generation_model", &mut missing),
            ),
        };

        let store_url = required_str(config, "vector_store", "url", &mut missing);
        let store_key = required_str(config, "vector_store", "api_key", &mut missing);
        let rpc_function = required_str(config, "vector_store", "rpc_function", &mut missing);
        let table = required_str(config, "vector_store", "table", &mut missing);
        let match_count = u64_at(config, "vector_store", "match_count");
        if match_count.is_none() {
            missing.push("vector_store.match_count (RAG_MATCH_COUNT)".to_string());
        }

        if !missing.is_empty() {
            return Err(ConfigError::Missing(missing));
        }

        let server = ServerSettings {
            host: str_at(config, "server", "host")
                .unwrap_or("127.0.0.1")
                .to_string(),
            port: u64_at(config, "server", "port").unwrap_or(8080) as u16,
            cors_allowed_origins: config
                .get("server")
                .and_then(|s| s.get("cors_allowed_origins"))
                .and_then(|v| v.as_array())
                .map(|items| {
                    items
                        .iter()
                        .filter_map(|item| item.as_str())
                        .map(|item| item.trim().to_string())
                        .collect()
                })
                .unwrap_or_default(),
        };

        let llm = LlmSettings {
            provider,
            base_url,
            api_key,
            embedding_model,
            generation_model,
            params: GenerationParams {
                temperature: config
                    .get("llm")
                    .and_then(|l| l.get("temperature"))
                    .and_then(|v| v.as_f64()),
                max_output_tokens: u64_at(config, "llm", "max_output_tokens").map(|v| v as u32),
            },
            request_timeout: Duration::from_secs(
                u64_at(config, "llm", "request_timeout_secs").unwrap_or(60),
            ),
        };

        let vector_store = VectorStoreSettings {
            url: store_url,
            api_key: store_key,
            rpc_function,
            table,
            match_count: match_count.unwrap_or_default() as usize,
        };

        let pipeline = PipelineOptions {
            match_count: vector_store.match_count,
            expected_dimension: u64_at(config, "rag", "embedding_dimension").map(|v| v as usize),
            timeout: u64_at(config, "rag", "timeout_secs").map(Duration::from_secs),
            assembler: ContextAssemblerConfig {
                default_source_label: str_at(config, "corpus", "default_source_label")
                    .map(str::to_string)
                    .unwrap_or_else(|| ContextAssemblerConfig::default().default_source_label),
                max_context_chars: u64_at(config, "rag", "max_context_chars").map(|v| v as usize),
            },
            corpus_domain: str_at(config, "corpus", "domain")
                .unwrap_or(crate::rag::DEFAULT_CORPUS_DOMAIN)
                .to_string(),
        };

        Ok(RagSettings {
            server,
            llm,
            vector_store,
            pipeline,
        })
    }
}

fn str_at<'a>(config: &'a Value, section: &str, key: &str) -> Option<&'a str> {
    config
        .get(section)
        .and_then(|s| s.get(key))
        .and_then(|v| v.as_str())
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

fn u64_at(config: &Value, section: &str, key: &str) -> Option<u64> {
    config
        .get(section)
        .and_then(|s| s.get(key))
        .and_then(|v| v.as_u64())
}

fn str_or(config: &Value, section: &str, key: &str, default: &str) -> String {
    str_at(config, section, key).unwrap_or(default).to_string()
}

fn required_str(config: &Value, section: &str, key: &str, missing: &mut Vec<String>) -> String {
    match str_at(config, section, key) {
        Some(value) => value.to_string(),
        None => {
            missing.push(format!("{}.{}", section, key));
            String::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::core::config::defaults::default_config;

    fn complete() -> Value {
        let mut config = default_config();
        config["llm"]["api_key"] = json!("g-key");
        config["vector_store"]["url"] = json!("https://abc.supabase.co");
        config["vector_store"]["api_key"] = json!("service-role");
        config["vector_store"]["match_count"] = json!(40);
        config
    }

    #[test]
    fn reports_every_missing_value() {
        let err = RagSettings::from_config(&default_config()).unwrap_err();
        match err {
            ConfigError::Missing(keys) => {
                assert_eq!(
                    keys,
                    vec![
                        "llm.api_key (GEMINI_API_KEY)".to_string(),
                        "vector_store.url".to_string(),
                        "vector_store.api_key".to_string(),
                        "vector_store.match_count (RAG_MATCH_COUNT)".to_string(),
                    ]
                );
            }
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn builds_pipeline_options() {
        let mut config = complete();
        config["rag"]["embedding_dimension"] = json!(768);
        config["rag"]["max_context_chars"] = json!(20000);

        let settings = RagSettings::from_config(&config).unwrap();

        assert_eq!(settings.llm.provider, ProviderKind::Gemini);
        assert_eq!(settings.vector_store.match_count, 40);
        assert_eq!(settings.pipeline.match_count, 40);
        assert_eq!(settings.pipeline.expected_dimension, Some(768));
        assert_eq!(settings.pipeline.timeout, Some(Duration::from_secs(120)));
        assert_eq!(settings.pipeline.assembler.max_context_chars, Some(20000));
        assert_eq!(
            settings.pipeline.assembler.default_source_label,
            crate::rag::DEFAULT_SOURCE_LABEL
        );
        assert_eq!(settings.server.port, 8080);
    }

    #[test]
    fn gemini_fills_in_endpoint_and_models() {
        let settings = RagSettings::from_config(&complete()).unwrap();

        assert_eq!(settings.llm.base_url, DEFAULT_GEMINI_BASE_URL);
        assert_eq!(settings.llm.embedding_model, DEFAULT_GEMINI_EMBEDDING_MODEL);
        assert_eq!(settings.llm.generation_model, DEFAULT_GEMINI_GENERATION_MODEL);
    }

    #[test]
    fn openai_compatible_does_not_inherit_gemini_endpoint() {
        let mut config = complete();
        config["llm"]["provider"] = json!("openai_compatible");

        match RagSettings::from_config(&config).unwrap_err() {
            ConfigError::Missing(keys) => assert_eq!(
                keys,
                vec![
                    "llm.base_url".to_string(),
                    "llm.embedding_model".to_string(),
                    "llm.generation_model".to_string(),
                ]
            ),
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn openai_compatible_needs_no_key() {
        let mut config = complete();
        config["llm"]["provider"] = json!("openai_compatible");
        config["llm"]["base_url"] = json!("http://localhost:1234");
        config["llm"]["embedding_model"] = json!("text-embedding-3-small");
        config["llm"]["generation_model"] = json!("gpt-4o-mini");
        config["llm"].as_object_mut().unwrap().remove("api_key");

        let settings = RagSettings::from_config(&config).unwrap();

        assert_eq!(settings.llm.provider, ProviderKind::OpenAiCompatible);
        assert!(settings.llm.api_key.is_none());
        assert_eq!(settings.llm.base_url, "http://localhost:1234");
        assert_eq!(settings.llm.embedding_model, "text-embedding-3-small");
    }
}
