//! CyberQuery Response Recovery
//!
//! Turns the text a generative model returns into a structured answer.
//!
//! The recovery pipeline provides:
//! - Normalization: direct JSON parse, then an ordered chain of repair rules
//! - Validation against the required fields of an output type
//! - Graceful degradation: missing fields are defaulted and reported
//! - Sanitization of markup in user input and model output
//!
//! Every attempt yields exactly one [`ValidationOutcome`]: `Accepted`,
//! `Degraded` or `Rejected`.
//!
//! # Examples
//!
//! ```
//! use cyberquery_domain::OutputType;
//! use cyberquery_recovery::{ResponseRecovery, ValidationOutcome};
//!
//! let recovery = ResponseRecovery::default();
//! let raw = r#"{"commands": ["nmap -sS target", "explanation": "SYN scan"]}"#;
//!
//! match recovery.recover(raw, OutputType::Command) {
//!     ValidationOutcome::Accepted(payload) => assert_eq!(payload["explanation"], "SYN scan"),
//!     other => panic!("unexpected outcome: {:?}", other),
//! }
//! ```

#![warn(missing_docs)]

mod config;
mod error;
mod normalizer;
pub mod rules;
mod sanitize;
mod validator;

pub use config::RecoveryConfig;
pub use error::NormalizeError;
pub use normalizer::{strip_wrapping_fence, NormalizeStage, ResponseNormalizer};
pub use rules::RepairRule;
pub use sanitize::{sanitize_payload, sanitize_text, sanitize_value};
pub use validator::{
    default_for, ResponseRecovery, SchemaValidator, ValidationOutcome, INVALID_STRUCTURED_DATA,
};

/// A recovered JSON object
pub type Payload = serde_json::Map<String, serde_json::Value>;
