use std::env;
use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct AppPaths {
    pub root: PathBuf,
    pub config_path: PathBuf,
    pub secrets_path: PathBuf,
    pub log_dir: PathBuf,
}

impl AppPaths {
    pub fn new() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Resolves paths from `RAG_HOME` and the per-file overrides; `lookup` stands in
    /// for the environment.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let root = lookup("RAG_HOME")
            .map(PathBuf::from)
            .or_else(|| env::current_dir().ok())
            .unwrap_or_else(|| PathBuf::from("."));

        let config_path = lookup("RAG_CONFIG_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|| root.join("config.yml"));
        let secrets_path = lookup("RAG_SECRETS_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|| root.join("secrets.yaml"));
        let log_dir = lookup("RAG_LOG_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|| root.join("logs"));

        AppPaths {
            root,
            config_path,
            secrets_path,
            log_dir,
        }
    }
}

impl Default for AppPaths {
    fn default() -> Self {
        Self::new()
    }
}
