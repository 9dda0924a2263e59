//! Configuration file parsing for the server.
//!
//! Loads settings from a TOML file: bind address, model endpoints, retrieval
//! and assistant tuning. Every section is optional and falls back to its
//! defaults.

use cyberquery_assistant::AssistantConfig;
use cyberquery_llm::ollama::MAX_RETRIES_LIMIT;
use cyberquery_rag::RagConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Resolves a relative `rag.data_dir`
pub const ROOT_DIR_ENV: &str = "CYBERQUERY_ROOT_DIR";

/// Overrides `model.endpoint`
pub const OLLAMA_HOST_ENV: &str = "OLLAMA_HOST";

/// Server configuration error
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read config file
    #[error("Failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),

    /// Failed to parse TOML
    #[error("Failed to parse config TOML: {0}")]
    TomlParse(#[from] toml::de::Error),

    /// A value failed validation
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Model backend settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    /// Generation model (e.g., "llama3.2")
    pub model: String,

    /// Embedding model (e.g., "nomic-embed-text")
    pub embedding_model: String,

    /// Ollama endpoint (e.g., "http://localhost:11434")
    pub endpoint: String,

    /// Attempts per generation call
    pub max_retries: u32,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            model: "llama3.2".to_string(),
            embedding_model: "nomic-embed-text".to_string(),
            endpoint: "http://localhost:11434".to_string(),
            max_retries: 3,
        }
    }
}

/// Server configuration loaded from TOML
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Bind address (e.g., "127.0.0.1")
    pub bind_address: String,

    /// Bind port (e.g., 8000)
    pub bind_port: u16,

    /// Model backend
    pub model: ModelConfig,

    /// Corpus and retrieval
    pub rag: RagConfig,

    /// Answer pipeline
    pub assistant: AssistantConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "127.0.0.1".to_string(),
            bind_port: 8000,
            model: ModelConfig::default(),
            rag: RagConfig::default(),
            assistant: AssistantConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    /// Parse and validate configuration from a TOML string
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        let config: ServerConfig = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate every section
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.model.model.trim().is_empty() {
            return Err(ConfigError::Invalid("model.model must not be empty".to_string()));
        }
        if self.model.endpoint.trim().is_empty() {
            return Err(ConfigError::Invalid("model.endpoint must not be empty".to_string()));
        }
        if self.model.max_retries == 0 || self.model.max_retries > MAX_RETRIES_LIMIT {
            return Err(ConfigError::Invalid(format!(
                "model.max_retries must be between 1 and {}",
                MAX_RETRIES_LIMIT
            )));
        }
        self.rag
            .validate()
            .map_err(|e| ConfigError::Invalid(e.to_string()))?;
        self.assistant.validate().map_err(ConfigError::Invalid)?;
        Ok(())
    }

    /// Apply environment overrides from the process environment
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides_from(|key| std::env::var(key).ok())
    }

    /// Apply environment overrides from an arbitrary lookup
    pub fn with_overrides_from<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let root = lookup(ROOT_DIR_ENV)
            .filter(|v| !v.trim().is_empty())
            .map(PathBuf::from);
        if let Some(root) = root {
            self.rag = self.rag.with_root(&root);
        }

        if let Some(host) = lookup(OLLAMA_HOST_ENV).filter(|v| !v.trim().is_empty()) {
            self.model.endpoint = normalize_host(&host);
        }
        self
    }

    /// Get the full bind address (address:port)
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.bind_address, self.bind_port)
    }

    /// Serialize configuration to TOML string
    pub fn to_toml(&self) -> Result<String, String> {
        toml::to_string_pretty(self).map_err(|e| format!("Failed to serialize to TOML: {}", e))
    }
}

/// `OLLAMA_HOST` may be a bare `host:port`
fn normalize_host(host: &str) -> String {
    let host = host.trim().trim_end_matches('/');
    if host.starts_with("http://") || host.starts_with("https://") {
        host.to_string()
    } else {
        format!("http://{}", host)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ServerConfig::default();
        assert_eq!(config.bind_addr(), "127.0.0.1:8000");
        assert_eq!(config.model.model, "llama3.2");
        assert_eq!(config.rag.chunk_size, 1000);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_toml() {
        let toml = r#"
            bind_address = "0.0.0.0"
            bind_port = 9000

            [model]
            model = "mistral"
            max_retries = 5

            [rag]
            data_dir = "/srv/docs"
            chunk_size = 500
            chunk_overlap = 50

            [assistant]
            generation_timeout_secs = 30
        "#;

        let config = ServerConfig::from_toml_str(toml).unwrap();
        assert_eq!(config.bind_addr(), "0.0.0.0:9000");
        assert_eq!(config.model.model, "mistral");
        assert_eq!(config.model.embedding_model, "nomic-embed-text");
        assert_eq!(config.model.max_retries, 5);
        assert_eq!(config.rag.data_dir, PathBuf::from("/srv/docs"));
        assert_eq!(config.rag.chunk_overlap, 50);
        assert_eq!(config.rag.top_k, 3);
        assert_eq!(config.assistant.generation_timeout_secs, 30);
        assert_eq!(config.assistant.context_k, 3);
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        let err = ServerConfig::from_toml_str("[rag]\nchunk_size = 100\nchunk_overlap = 100").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));

        let err = ServerConfig::from_toml_str("[assistant]\ncontext_k = 0").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));

        let err = ServerConfig::from_toml_str("[model]\nmax_retries = 4294967295").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));

        let err = ServerConfig::from_toml_str("[model]\nmax_retries = 0").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));

        let err = ServerConfig::from_toml_str("bind_port = \"eighty\"").unwrap_err();
        assert!(matches!(err, ConfigError::TomlParse(_)));
    }

    #[test]
    fn test_env_overrides() {
        let config = ServerConfig::default().with_overrides_from(|key| match key {
            ROOT_DIR_ENV => Some("/opt/cyberquery".to_string()),
            OLLAMA_HOST_ENV => Some("gpu-box:11434".to_string()),
            _ => None,
        });
        assert_eq!(config.rag.data_dir, PathBuf::from("/opt/cyberquery/rag_data"));
        assert_eq!(config.model.endpoint, "http://gpu-box:11434");
    }

    #[test]
    fn test_absolute_data_dir_ignores_root() {
        let mut config = ServerConfig::default();
        config.rag.data_dir = PathBuf::from("/data/docs");
        let config = config.with_overrides_from(|key| {
            (key == ROOT_DIR_ENV).then(|| "/opt/cyberquery".to_string())
        });
        assert_eq!(config.rag.data_dir, PathBuf::from("/data/docs"));
    }

    #[test]
    fn test_toml_round_trip() {
        let config = ServerConfig::default();
        let parsed = ServerConfig::from_toml_str(&config.to_toml().unwrap()).unwrap();
        assert_eq!(config, parsed);
    }
}
