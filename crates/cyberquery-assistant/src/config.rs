//! Configuration for the Assistant

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for the Assistant
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AssistantConfig {
    /// Maximum time for a single generation, retrieval included (seconds)
    pub generation_timeout_secs: u64,

    /// Number of reference chunks retrieved per prompt
    pub context_k: usize,

    /// Strip markup from user input and from recovered answers
    pub sanitize_output: bool,

    /// Prompts longer than this (characters) drop their documentation block
    pub max_prompt_chars: usize,
}

impl AssistantConfig {
    /// Get the generation timeout as a Duration
    pub fn generation_timeout(&self) -> Duration {
        Duration::from_secs(self.generation_timeout_secs)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.generation_timeout_secs == 0 {
            return Err("generation_timeout_secs must be greater than 0".to_string());
        }
        if self.context_k == 0 {
            return Err("context_k must be greater than 0".to_string());
        }
        if self.max_prompt_chars == 0 {
            return Err("max_prompt_chars must be greater than 0".to_string());
        }
        Ok(())
    }
}

impl Default for AssistantConfig {
    fn default() -> Self {
        Self {
            generation_timeout_secs: 120,
            context_k: 3,
            sanitize_output: true,
            max_prompt_chars: 20_000,
        }
    }
}

impl AssistantConfig {
    /// Aggressive preset: shorter timeout, less context for faster answers
    pub fn aggressive() -> Self {
        Self {
            generation_timeout_secs: 60,
            context_k: 2,
            sanitize_output: true,
            max_prompt_chars: 8_000,
        }
    }

    /// Lenient preset: longer timeout, more context for better answers
    pub fn lenient() -> Self {
        Self {
            generation_timeout_secs: 300,
            context_k: 5,
            sanitize_output: true,
            max_prompt_chars: 40_000,
        }
    }

    /// Load configuration from TOML string
    pub fn from_toml(toml_str: &str) -> Result<Self, String> {
        toml::from_str(toml_str).map_err(|e| format!("Failed to parse TOML: {}", e))
    }

    /// Serialize configuration to TOML string
    pub fn to_toml(&self) -> Result<String, String> {
        toml::to_string_pretty(self).map_err(|e| format!("Failed to serialize to TOML: {}", e))
    }
}
