use serde_json::{Map, Value};

use crate::core::errors::ConfigError;

pub const PROVIDERS: [&str; 2] = ["gemini", "openai_compatible"];

/// Type and range checks over the merged config tree. Presence of credentials is
/// checked later, when the typed settings are built.
pub fn validate_config(config: &Value) -> Result<(), ConfigError> {
    let root = config
        .as_object()
        .ok_or_else(|| config_type_error("root", "object"))?;

    if let Some(server) = expect_optional_object(root, "server")? {
        validate_optional_string_field(server, "server.host", "host")?;
        validate_u64_field(server, "server.port", "port", 0, 65535)?;
        validate_string_array_field(
            server,
            "server.cors_allowed_origins",
            "cors_allowed_origins",
        )?;
    }

    if let Some(llm) = expect_optional_object(root, "llm")? {
        validate_required_string_field(llm, "llm.provider", "provider")?;
        if let Some(provider) = llm.get("provider").and_then(|v| v.as_str()) {
            if !PROVIDERS.contains(&provider) {
                return Err(ConfigError::Invalid {
                    path: "llm.provider".to_string(),
                    reason: format!("must be one of {}", PROVIDERS.join(", ")),
                });
            }
        }
        validate_optional_string_field(llm, "llm.base_url", "base_url")?;
        validate_optional_string_field(llm, "llm.api_key", "api_key")?;
        validate_optional_string_field(llm, "llm.embedding_model", "embedding_model")?;
        validate_optional_string_field(llm, "llm.generation_model", "generation_model")?;
        validate_f64_field(llm, "llm.temperature", "temperature", 0.0, 2.0)?;
        validate_u64_field(llm, "llm.max_output_tokens", "max_output_tokens", 1, 1_000_000)?;
        validate_u64_field(
            llm,
            "llm.request_timeout_secs",
            "request_timeout_secs",
            1,
            3_600,
        )?;
    }

    if let Some(store) = expect_optional_object(root, "vector_store")? {
        validate_optional_string_field(store, "vector_store.url", "url")?;
        validate_optional_string_field(store, "vector_store.api_key", "api_key")?;
        validate_required_string_field(store, "vector_store.rpc_function", "rpc_function")?;
        validate_required_string_field(store, "vector_store.table", "table")?;
        validate_u64_field(store, "vector_store.match_count", "match_count", 1, 10_000)?;
    }

    if let Some(rag) = expect_optional_object(root, "rag")? {
        validate_u64_field(
            rag,
            "rag.embedding_dimension",
            "embedding_dimension",
            1,
            65_536,
        )?;
        validate_u64_field(
            rag,
            "rag.max_context_chars",
            "max_context_chars",
            1,
            10_000_000,
        )?;
        validate_u64_field(rag, "rag.timeout_secs", "timeout_secs", 1, 3_600)?;
    }

    if let Some(corpus) = expect_optional_object(root, "corpus")? {
        validate_required_string_field(corpus, "corpus.domain", "domain")?;
        validate_required_string_field(
            corpus,
            "corpus.default_source_label",
            "default_source_label",
        )?;
    }

    Ok(())
}

fn expect_optional_object<'a>(
    root: &'a Map<String, Value>,
    key: &str,
) -> Result<Option<&'a Map<String, Value>>, ConfigError> {
    match root.get(key) {
        Some(Value::Object(map)) => Ok(Some(map)),
        Some(_) => Err(config_type_error(key, "object")),
        None => Ok(None),
    }
}

fn validate_u64_field(
    section: &Map<String, Value>,
    path: &str,
    key: &str,
    min: u64,
    max: u64,
) -> Result<(), ConfigError> {
    let Some(value) = section.get(key) else {
        return Ok(());
    };
    if value.is_null() {
        return Ok(());
    }
    let Some(number) = value.as_u64() else {
        return Err(config_type_error(path, "integer"));
    };
    if number < min || number > max {
        return Err(range_error(path, min, max));
    }
    Ok(())
}

fn validate_f64_field(
    section: &Map<String, Value>,
    path: &str,
    key: &str,
    min: f64,
    max: f64,
) -> Result<(), ConfigError> {
    let Some(value) = section.get(key) else {
        return Ok(());
    };
    if value.is_null() {
        return Ok(());
    }
    let Some(number) = value.as_f64() else {
        return Err(config_type_error(path, "number"));
    };
    if number < min || number > max {
        return Err(range_error(path, min, max));
    }
    Ok(())
}

fn validate_required_string_field(
    section: &Map<String, Value>,
    path: &str,
    key: &str,
) -> Result<(), ConfigError> {
    let value = section.get(key).ok_or_else(|| ConfigError::Invalid {
        path: path.to_string(),
        reason: "value is required".to_string(),
    })?;
    let Some(text) = value.as_str() else {
        return Err(config_type_error(path, "string"));
    };
    if text.trim().is_empty() {
        return Err(ConfigError::Invalid {
            path: path.to_string(),
            reason: "value cannot be empty".to_string(),
        });
    }
    Ok(())
}

fn validate_optional_string_field(
    section: &Map<String, Value>,
    path: &str,
    key: &str,
) -> Result<(), ConfigError> {
    let Some(value) = section.get(key) else {
        return Ok(());
    };
    if !value.is_null() && value.as_str().is_none() {
        return Err(config_type_error(path, "string"));
    }
    Ok(())
}

fn validate_string_array_field(
    section: &Map<String, Value>,
    path: &str,
    key: &str,
) -> Result<(), ConfigError> {
    let Some(value) = section.get(key) else {
        return Ok(());
    };
    let Some(items) = value.as_array() else {
        return Err(config_type_error(path, "array of strings"));
    };
    for (index, item) in items.iter().enumerate() {
        let Some(text) = item.as_str() else {
            return Err(config_type_error(&format!("{}[{}]", path, index), "string"));
        };
        if text.trim().is_empty() {
            return Err(ConfigError::Invalid {
                path: format!("{}[{}]", path, index),
                reason: "value cannot be empty".to_string(),
            });
        }
    }
    Ok(())
}

fn range_error<T: std::fmt::Display>(path: &str, min: T, max: T) -> ConfigError {
    ConfigError::Invalid {
        path: path.to_string(),
        reason: format!("must be between {} and {}", min, max),
    }
}

fn config_type_error(path: &str, expected: &str) -> ConfigError {
    ConfigError::Invalid {
        path: path.to_string(),
        reason: format!("expected {}", expected),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::core::config::defaults::default_config;

    #[test]
    fn defaults_are_valid() {
        assert!(validate_config(&default_config()).is_ok());
    }

    #[test]
    fn rejects_zero_match_count() {
        let config = json!({
            "vector_store": { "rpc_function": "f", "table": "t", "match_count": 0 }
        });
        match validate_config(&config) {
            Err(ConfigError::Invalid { path, .. }) => assert_eq!(path, "vector_store.match_count"),
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn rejects_string_where_number_expected() {
        let config = json!({ "rag": { "timeout_secs": "soon" } });
        let err = validate_config(&config).unwrap_err();
        assert_eq!(err.to_string(), "invalid config at 'rag.timeout_secs': expected integer");
    }

    #[test]
    fn rejects_unknown_provider() {
        let config = json!({
            "llm": { "provider": "cohere", "embedding_model": "e", "generation_model": "g" }
        });
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn null_optional_values_are_allowed() {
        let config = json!({
            "rag": { "max_context_chars": null },
            "llm": { "provider": "gemini", "base_url": null, "temperature": null }
        });
        assert!(validate_config(&config).is_ok());
    }
}
