//! Error types for the Assistant

use crate::template::TemplateError;
use thiserror::Error;

/// Errors that can occur while answering a request
#[derive(Error, Debug)]
pub enum AssistantError {
    /// The model call failed
    #[error("Generation failed: {detail}")]
    Generation {
        /// What went wrong
        detail: String,
        /// Any text the model produced before failing
        raw: Option<String>,
    },

    /// The model answered, but no structured data could be recovered
    #[error("Invalid response from model: {reason}")]
    InvalidResponse {
        /// Why recovery rejected the answer
        reason: String,
        /// The model's text, unchanged
        raw: String,
    },

    /// Generation exceeded the configured timeout (seconds)
    #[error("Generation timed out after {0}s")]
    Timeout(u64),

    /// A prompt template could not be built or filled
    #[error("Template error: {0}")]
    Template(#[from] TemplateError),

    /// A blocking worker panicked or was cancelled
    #[error("Worker task failed: {0}")]
    Join(String),

    /// The semantic index has never been built successfully
    #[error("Semantic index unavailable: the embedding backend failed")]
    IndexUnavailable,

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

impl AssistantError {
    /// Raw model text attached to the error, if any
    pub fn raw(&self) -> Option<&str> {
        match self {
            AssistantError::Generation { raw, .. } => raw.as_deref(),
            AssistantError::InvalidResponse { raw, .. } => Some(raw),
            _ => None,
        }
    }

    /// Whether the error is a timeout
    pub fn is_timeout(&self) -> bool {
        matches!(self, AssistantError::Timeout(_))
    }
}

impl From<tokio::task::JoinError> for AssistantError {
    fn from(e: tokio::task::JoinError) -> Self {
        AssistantError::Join(e.to_string())
    }
}
