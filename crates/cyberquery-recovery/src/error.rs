//! Recovery error types

use thiserror::Error;

/// Raised when model output cannot be turned into a JSON object
///
/// Both variants carry the last text that was attempted, for diagnostics.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum NormalizeError {
    /// The text is not valid JSON even after every repair rule ran
    #[error("Unparseable response: {reason}")]
    Unparseable {
        /// Parser error message from the final attempt
        reason: String,
        /// Text after all repair rules were applied
        last_text: String,
    },

    /// The text parsed, but not to a JSON object
    #[error("Expected a JSON object, got {found}")]
    NotAnObject {
        /// JSON type that was found
        found: &'static str,
        /// The parsed text
        last_text: String,
    },
}

impl NormalizeError {
    /// Text of the last parse attempt
    pub fn last_text(&self) -> &str {
        match self {
            NormalizeError::Unparseable { last_text, .. } => last_text,
            NormalizeError::NotAnObject { last_text, .. } => last_text,
        }
    }
}
