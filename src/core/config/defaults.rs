use serde_json::{json, Value};

use crate::rag::{DEFAULT_CORPUS_DOMAIN, DEFAULT_SOURCE_LABEL};

/// Built-in layer underneath `config.yml`. Credentials and `match_count` have no default.
/// Endpoint and model ids depend on `llm.provider` and are filled in by `RagSettings`.
pub fn default_config() -> Value {
    json!({
        "server": {
            "host": "127.0.0.1",
            "port": 8080,
            "cors_allowed_origins": []
        },
        "llm": {
            "provider": "gemini",
            "request_timeout_secs": 60
        },
        "vector_store": {
            "rpc_function": "vector_search",
            "table": "champlim"
        },
        "rag": {
            "timeout_secs": 120
        },
        "corpus": {
            "domain": DEFAULT_CORPUS_DOMAIN,
            "default_source_label": DEFAULT_SOURCE_LABEL
        }
    })
}
