//! CyberQuery LLM Provider Layer
//!
//! Pluggable text-generation backends behind the `LlmProvider` port.
//!
//! # Providers
//!
//! - `MockProvider`: Deterministic mock for testing
//! - `OllamaProvider`: Local Ollama API integration
//!
//! # Examples
//!
//! ```
//! use cyberquery_llm::MockProvider;
//! use cyberquery_domain::LlmProvider;
//!
//! let provider = MockProvider::new(r#"{"commands": ["ls"], "explanation": "list"}"#);
//! let result = provider.generate("test prompt").unwrap();
//! assert!(result.contains("commands"));
//! ```

#![warn(missing_docs)]

pub mod bridge;
mod mock;
pub mod ollama;

use thiserror::Error;

pub use bridge::BlockingBridge;
pub use mock::MockProvider;
pub use ollama::OllamaProvider;

/// Errors that can occur during LLM operations
#[derive(Error, Debug)]
pub enum LlmError {
    /// Network or API communication error
    #[error("Communication error: {0}")]
    Communication(String),

    /// Invalid response from LLM
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Rate limit exceeded
    #[error("Rate limit exceeded")]
    RateLimitExceeded,

    /// Model not available
    #[error("Model not available: {0}")]
    ModelNotAvailable(String),

    /// Generic error
    #[error("LLM error: {0}")]
    Other(String),
}
