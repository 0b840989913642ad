use std::env;
use std::fs;
use std::path::Path;
use std::sync::Arc;

use serde_json::{Map, Value};

use super::defaults::default_config;
use super::paths::AppPaths;
use super::settings::RagSettings;
use super::validation::validate_config;
use crate::core::errors::ConfigError;

const REDACT_PLACEHOLDER: &str = "****";

const SENSITIVE_PATTERNS: [&str; 6] = [
    "api_key",
    "secret",
    "password",
    "_token",
    "credential",
    "bearer",
];

const SENSITIVE_WHITELIST: [&str; 1] = ["max_output_tokens"];

#[derive(Clone, Copy)]
enum EnvKind {
    Text,
    Integer,
}

/// Environment variables recognised on top of the YAML files. Later entries win.
const ENV_OVERRIDES: [(&str, &[&str], EnvKind); 8] = [
    ("GEMINI_API_KEY", &["llm", "api_key"], EnvKind::Text),
    ("LLM_API_KEY", &["llm", "api_key"], EnvKind::Text),
    ("LLM_BASE_URL", &["llm", "base_url"], EnvKind::Text),
    ("SUPABASE_URL", &["vector_store", "url"], EnvKind::Text),
    ("SUPABASE_KEY", &["vector_store", "api_key"], EnvKind::Text),
    ("RAG_MATCH_COUNT", &["vector_store", "match_count"], EnvKind::Integer),
    ("RAG_HOST", &["server", "host"], EnvKind::Text),
    ("PORT", &["server", "port"], EnvKind::Integer),
];

#[derive(Clone)]
pub struct ConfigService {
    paths: Arc<AppPaths>,
}

impl ConfigService {
    pub fn new(paths: Arc<AppPaths>) -> Self {
        Self { paths }
    }

    pub fn paths(&self) -> &AppPaths {
        &self.paths
    }

    /// Defaults → `config.yml` → `secrets.yaml` → environment, validated.
    pub fn load_config(&self) -> Result<Value, ConfigError> {
        self.load_config_with(|key| env::var(key).ok())
    }

    pub fn load_config_with<F>(&self, lookup: F) -> Result<Value, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let public_config = load_yaml_file(&self.paths.config_path)?;
        let secrets_config = load_yaml_file(&self.paths.secrets_path)?;

        let mut merged = deep_merge(&default_config(), &public_config);
        merged = deep_merge(&merged, &secrets_config);
        apply_env_overrides(&mut merged, lookup)?;

        validate_config(&merged)?;
        Ok(merged)
    }

    pub fn load_settings(&self) -> Result<RagSettings, ConfigError> {
        let config = self.load_config()?;
        tracing::debug!(config = %self.redact_sensitive_values(&config), "effective configuration");
        RagSettings::from_config(&config)
    }

    pub fn redact_sensitive_values(&self, value: &Value) -> Value {
        redact_sensitive_values(value)
    }
}

fn load_yaml_file(path: &Path) -> Result<Value, ConfigError> {
    if !path.exists() {
        return Ok(Value::Object(Map::new()));
    }

    let contents = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    if contents.trim().is_empty() {
        return Ok(Value::Object(Map::new()));
    }
    let value = serde_yaml::from_str::<Value>(&contents).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })?;

    match value {
        Value::Object(_) => Ok(value),
        // a file holding only comments parses as null
        Value::Null => Ok(Value::Object(Map::new())),
        _ => Err(ConfigError::Invalid {
            path: path.display().to_string(),
            reason: "top level must be a mapping".to_string(),
        }),
    }
}

fn apply_env_overrides<F>(config: &mut Value, lookup: F) -> Result<(), ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    for (var, path, kind) in ENV_OVERRIDES {
        let Some(raw) = lookup(var).filter(|v| !v.trim().is_empty()) else {
            continue;
        };
        let value = match kind {
            EnvKind::Text => Value::String(raw),
            EnvKind::Integer => {
                let parsed = raw.trim().parse::<u64>().map_err(|_| ConfigError::Invalid {
                    path: var.to_string(),
                    reason: "expected integer".to_string(),
                })?;
                Value::from(parsed)
            }
        };
        ensure_object_path(config, path, value);
    }
    Ok(())
}

fn ensure_object_path(config: &mut Value, path: &[&str], value: Value) {
    if path.is_empty() {
        return;
    }

    let mut current = config;
    for (index, key) in path.iter().enumerate() {
        if index == path.len() - 1 {
            if let Some(map) = current.as_object_mut() {
                map.insert(key.to_string(), value);
            }
            return;
        }

        if !current.get(*key).map(|v| v.is_object()).unwrap_or(false) {
            let Some(map) = current.as_object_mut() else {
                return;
            };
            map.insert((*key).to_string(), Value::Object(Map::new()));
        }

        let Some(next) = current.get_mut(*key) else {
            return;
        };
        current = next;
    }
}

fn deep_merge(base: &Value, override_value: &Value) -> Value {
    match (base, override_value) {
        (Value::Object(base_map), Value::Object(override_map)) => {
            let mut merged: Map<String, Value> = base_map.clone();
            for (key, value) in override_map {
                let merged_value = match merged.get(key) {
                    Some(existing) => deep_merge(existing, value),
                    None => value.clone(),
                };
                merged.insert(key.clone(), merged_value);
            }
            Value::Object(merged)
        }
        _ => override_value.clone(),
    }
}

fn redact_sensitive_values(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut redacted = Map::new();
            for (key, val) in map {
                if is_sensitive_key(key) && !val.is_null() {
                    redacted.insert(key.clone(), Value::String(REDACT_PLACEHOLDER.to_string()));
                } else {
                    redacted.insert(key.clone(), redact_sensitive_values(val));
                }
            }
            Value::Object(redacted)
        }
        Value::Array(items) => Value::Array(items.iter().map(redact_sensitive_values).collect()),
        _ => value.clone(),
    }
}

fn is_sensitive_key(key: &str) -> bool {
    let lower = key.to_lowercase();
    if SENSITIVE_WHITELIST.contains(&lower.as_str()) {
        return false;
    }
    SENSITIVE_PATTERNS.iter().any(|pattern| lower.contains(pattern))
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use tempfile::TempDir;

    use super::*;

    fn service_in(dir: &TempDir) -> ConfigService {
        let root = dir.path().to_path_buf();
        ConfigService::new(Arc::new(AppPaths {
            config_path: root.join("config.yml"),
            secrets_path: root.join("secrets.yaml"),
            log_dir: root.join("logs"),
            root,
        }))
    }

    fn no_env(_: &str) -> Option<String> {
        None
    }

    #[test]
    fn layers_files_over_defaults() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("config.yml"),
            concat!(
                "vector_store:\n  url: https://abc.supabase.co\n  match_count: 40\n",
                "llm:\n  generation_model: gemini-2.0-flash\n",
            ),
        )
        .unwrap();
        fs::write(
            dir.path().join("secrets.yaml"),
            "vector_store:\n  api_key: service-role\nllm:\n  api_key: g-key\n",
        )
        .unwrap();

        let config = service_in(&dir).load_config_with(no_env).unwrap();

        assert_eq!(config["vector_store"]["match_count"], 40);
        assert_eq!(config["vector_store"]["api_key"], "service-role");
        assert_eq!(config["vector_store"]["rpc_function"], "vector_search");
        assert_eq!(config["llm"]["generation_model"], "gemini-2.0-flash");
        assert_eq!(config["llm"]["provider"], "gemini");
    }

    #[test]
    fn environment_wins_over_files() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("config.yml"), "vector_store:\n  match_count: 40\n").unwrap();

        let config = service_in(&dir)
            .load_config_with(|key| match key {
                "RAG_MATCH_COUNT" => Some("90".to_string()),
                "SUPABASE_URL" => Some("https://env.supabase.co".to_string()),
                "PORT" => Some(" ".to_string()),
                _ => None,
            })
            .unwrap();

        assert_eq!(config["vector_store"]["match_count"], 90);
        assert_eq!(config["vector_store"]["url"], "https://env.supabase.co");
        assert_eq!(config["server"]["port"], 8080);
    }

    #[test]
    fn non_numeric_env_override_is_rejected() {
        let dir = TempDir::new().unwrap();
        let err = service_in(&dir)
            .load_config_with(|key| (key == "RAG_MATCH_COUNT").then(|| "many".to_string()))
            .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { path, .. } if path == "RAG_MATCH_COUNT"));
    }

    #[test]
    fn malformed_yaml_is_fatal() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("config.yml"), "llm: [unclosed\n").unwrap();
        let err = service_in(&dir).load_config_with(no_env).unwrap_err();
        match err {
            ConfigError::Parse { path, .. } => assert_eq!(path, dir.path().join("config.yml")),
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn empty_files_are_ignored() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("secrets.yaml"), "").unwrap();
        assert!(service_in(&dir).load_config_with(no_env).is_ok());
    }

    #[test]
    fn redacts_keys_but_not_token_limits() {
        let value = json!({
            "llm": { "api_key": "g-key", "max_output_tokens": 512 },
            "vector_store": { "api_key": "service-role", "url": "https://abc.supabase.co" }
        });
        let redacted = redact_sensitive_values(&value);
        assert_eq!(redacted["llm"]["api_key"], REDACT_PLACEHOLDER);
        assert_eq!(redacted["llm"]["max_output_tokens"], 512);
        assert_eq!(redacted["vector_store"]["api_key"], REDACT_PLACEHOLDER);
        assert_eq!(redacted["vector_store"]["url"], "https://abc.supabase.co");
    }
}
