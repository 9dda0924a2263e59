//! Typed answers and chat messages

use cyberquery_domain::OutputType;
use cyberquery_recovery::Payload;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// A structured answer recovered from the model
pub trait TypedResponse: DeserializeOwned + Serialize {
    /// Output type whose required fields this response carries
    const OUTPUT_TYPE: OutputType;

    /// Status message for a complete answer
    const SUCCESS_MESSAGE: &'static str;

    /// Build the response from a validated payload
    fn from_payload(payload: Payload) -> Result<Self, serde_json::Error> {
        serde_json::from_value(serde_json::Value::Object(payload))
    }
}

/// Ready-to-run commands for a task
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandGenerationResponse {
    /// Commands in the order they should run; empty when no tool fits
    pub commands: Vec<String>,
    /// What the commands do
    pub explanation: String,
}

impl TypedResponse for CommandGenerationResponse {
    const OUTPUT_TYPE: OutputType = OutputType::Command;
    const SUCCESS_MESSAGE: &'static str = "Successfully generated commands.";
}

/// A command or script for a task
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeGenerationResponse {
    /// The command or script; empty when the task cannot be done
    pub code: String,
    /// What the code does
    pub explanation: String,
    /// Detected language, e.g. `bash` or `python`
    pub language: String,
}

impl TypedResponse for CodeGenerationResponse {
    const OUTPUT_TYPE: OutputType = OutputType::Code;
    const SUCCESS_MESSAGE: &'static str = "Successfully generated code.";
}

/// A step-by-step explanation of supplied code
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeExplanationResponse {
    /// The explanation
    pub explanation: String,
}

impl TypedResponse for CodeExplanationResponse {
    const OUTPUT_TYPE: OutputType = OutputType::Explanation;
    const SUCCESS_MESSAGE: &'static str = "Successfully explained code.";
}

/// One known exploit
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Exploit {
    /// Exploit title
    pub title: String,
    /// Reference URL
    pub link: String,
    /// Severity label, e.g. `High`
    pub severity: String,
    /// Short description
    pub description: String,
}

impl Default for Exploit {
    fn default() -> Self {
        Self {
            title: String::new(),
            link: String::new(),
            severity: "Unknown".to_string(),
            description: String::new(),
        }
    }
}

/// Known exploits for a described target
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExploitSearchResponse {
    /// Matching exploits; empty when none are known
    pub exploits: Vec<Exploit>,
    /// Summary of the findings
    pub explanation: String,
}

impl TypedResponse for ExploitSearchResponse {
    const OUTPUT_TYPE: OutputType = OutputType::Exploit;
    const SUCCESS_MESSAGE: &'static str = "Successfully searched for exploits.";
}

/// One turn of a conversation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Speaker, usually `user` or `assistant`
    pub role: String,
    /// Message text
    pub content: String,
}

impl ChatMessage {
    /// Create a message
    pub fn new(role: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: role.into(),
            content: content.into(),
        }
    }
}

/// A typed answer, complete or degraded
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Answer<T> {
    /// Every required field was present
    Complete(T),
    /// Some fields were missing and hold neutral defaults
    Partial {
        /// The answer with defaults filled in
        response: T,
        /// Names of the fields that were missing
        missing: BTreeSet<String>,
    },
}

impl<T: TypedResponse> Answer<T> {
    /// The response, complete or not
    pub fn response(&self) -> &T {
        match self {
            Answer::Complete(response) | Answer::Partial { response, .. } => response,
        }
    }

    /// Take the response, complete or not
    pub fn into_response(self) -> T {
        match self {
            Answer::Complete(response) | Answer::Partial { response, .. } => response,
        }
    }

    /// Fields that were missing (empty when complete)
    pub fn missing(&self) -> BTreeSet<String> {
        match self {
            Answer::Complete(_) => BTreeSet::new(),
            Answer::Partial { missing, .. } => missing.clone(),
        }
    }

    /// Whether every required field was present
    pub fn is_complete(&self) -> bool {
        matches!(self, Answer::Complete(_))
    }

    /// Status label: `ok` or `degraded`
    pub fn status(&self) -> &'static str {
        if self.is_complete() {
            "ok"
        } else {
            "degraded"
        }
    }

    /// Human-readable status message
    pub fn message(&self) -> String {
        match self {
            Answer::Complete(_) => T::SUCCESS_MESSAGE.to_string(),
            Answer::Partial { missing, .. } => format!(
                "Missing required keys in LLM response: {}",
                missing.iter().map(String::as_str).collect::<Vec<_>>().join(", ")
            ),
        }
    }
}
