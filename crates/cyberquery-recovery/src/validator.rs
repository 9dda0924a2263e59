//! Schema validation of normalized payloads

use crate::config::RecoveryConfig;
use crate::error::NormalizeError;
use crate::normalizer::ResponseNormalizer;
use crate::sanitize::sanitize_payload;
use crate::Payload;
use cyberquery_domain::{FieldKind, FieldSpec, OutputType};
use serde_json::Value;
use std::collections::BTreeSet;
use tracing::{debug, warn};

/// Reason given when model output could not be parsed at all
pub const INVALID_STRUCTURED_DATA: &str = "invalid structured data";

/// Result of recovering a structured answer from model output
///
/// Exactly one variant is produced per attempt.
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationOutcome {
    /// Every required field was present
    Accepted(Payload),

    /// Some required fields were missing and have been defaulted
    Degraded {
        /// Payload with neutral values filled in for missing fields
        payload: Payload,
        /// Names of the fields that were filled in
        missing: BTreeSet<String>,
    },

    /// The output could not be parsed into structured data
    Rejected {
        /// Why the output was rejected
        reason: String,
        /// The model output as received
        raw_text: String,
    },
}

impl ValidationOutcome {
    /// Whether all required fields were present
    pub fn is_accepted(&self) -> bool {
        matches!(self, ValidationOutcome::Accepted(_))
    }

    /// Whether the answer is usable but incomplete
    pub fn is_degraded(&self) -> bool {
        matches!(self, ValidationOutcome::Degraded { .. })
    }

    /// Whether no structured data could be recovered
    pub fn is_rejected(&self) -> bool {
        matches!(self, ValidationOutcome::Rejected { .. })
    }

    /// The payload, for accepted and degraded outcomes
    pub fn payload(&self) -> Option<&Payload> {
        match self {
            ValidationOutcome::Accepted(payload) => Some(payload),
            ValidationOutcome::Degraded { payload, .. } => Some(payload),
            ValidationOutcome::Rejected { .. } => None,
        }
    }

    /// Fields that had to be defaulted (empty unless degraded)
    pub fn missing(&self) -> BTreeSet<String> {
        match self {
            ValidationOutcome::Degraded { missing, .. } => missing.clone(),
            _ => BTreeSet::new(),
        }
    }

    /// Short status label: `ok`, `degraded` or `rejected`
    pub fn status(&self) -> &'static str {
        match self {
            ValidationOutcome::Accepted(_) => "ok",
            ValidationOutcome::Degraded { .. } => "degraded",
            ValidationOutcome::Rejected { .. } => "rejected",
        }
    }
}

/// Neutral value for a field of the given kind
pub fn default_for(kind: FieldKind) -> Value {
    match kind {
        FieldKind::Text => Value::String(String::new()),
        FieldKind::List => Value::Array(Vec::new()),
    }
}

/// Checks normalized payloads against a required-field set
#[derive(Debug, Clone, Default)]
pub struct SchemaValidator {
    config: RecoveryConfig,
}

impl SchemaValidator {
    /// Create a validator with the given configuration
    pub fn new(config: RecoveryConfig) -> Self {
        Self { config }
    }

    /// The active configuration
    pub fn config(&self) -> &RecoveryConfig {
        &self.config
    }

    /// Decide accept, degrade or reject
    ///
    /// A normalization failure is always `Rejected`. Otherwise every required
    /// field that is absent, null or of an unusable type is defaulted and
    /// reported as missing. Fields outside the required set pass through.
    pub fn validate(
        &self,
        normalized: Result<Payload, NormalizeError>,
        required: &[FieldSpec],
        raw_text: &str,
    ) -> ValidationOutcome {
        let mut payload = match normalized {
            Ok(payload) => payload,
            Err(e) => {
                warn!(error = %e, raw_chars = raw_text.len(), "Rejecting unparseable model output");
                return ValidationOutcome::Rejected {
                    reason: INVALID_STRUCTURED_DATA.to_string(),
                    raw_text: raw_text.to_string(),
                };
            }
        };

        let mut missing = BTreeSet::new();
        for field in required {
            let current = payload.remove(field.name);
            let value = match current.and_then(|v| self.conform(field, v)) {
                Some(value) => value,
                None => {
                    missing.insert(field.name.to_string());
                    default_for(field.kind)
                }
            };
            payload.insert(field.name.to_string(), value);
        }

        if self.config.sanitize {
            sanitize_payload(&mut payload);
        }

        if missing.is_empty() {
            debug!(fields = payload.len(), "Structured response accepted");
            ValidationOutcome::Accepted(payload)
        } else {
            warn!(?missing, "Structured response degraded");
            ValidationOutcome::Degraded { payload, missing }
        }
    }

    /// Bring a present value into the field's shape, or `None` if unusable
    fn conform(&self, field: &FieldSpec, value: Value) -> Option<Value> {
        match (field.kind, value) {
            (_, Value::Null) => None,
            (FieldKind::Text, Value::String(s)) => Some(Value::String(s)),
            (FieldKind::List, Value::Array(items)) => Some(Value::Array(items)),
            (FieldKind::List, Value::String(s)) if self.config.coerce_string_lists => {
                if s.trim().is_empty() {
                    Some(Value::Array(Vec::new()))
                } else {
                    Some(Value::Array(vec![Value::String(s)]))
                }
            }
            (FieldKind::Text, Value::Array(items)) if self.config.coerce_scalars => {
                let lines: Option<Vec<String>> = items
                    .into_iter()
                    .map(|item| match item {
                        Value::String(s) => Some(s),
                        _ => None,
                    })
                    .collect();
                lines.map(|lines| Value::String(lines.join("\n")))
            }
            (FieldKind::Text, value @ (Value::Number(_) | Value::Bool(_))) if self.config.coerce_scalars => {
                Some(Value::String(value.to_string()))
            }
            (kind, other) => {
                warn!(field = field.name, ?kind, value = %other, "Required field has unusable type");
                None
            }
        }
    }
}

/// Normalizer plus validator: raw model text in, outcome out
///
/// # Examples
///
/// ```
/// use cyberquery_domain::OutputType;
/// use cyberquery_recovery::ResponseRecovery;
///
/// let recovery = ResponseRecovery::default();
/// let outcome = recovery.recover(r#"{"commands": ["ls -la"]}"#, OutputType::Command);
///
/// assert!(outcome.is_degraded());
/// assert!(outcome.missing().contains("explanation"));
/// ```
#[derive(Debug, Clone, Default)]
pub struct ResponseRecovery {
    normalizer: ResponseNormalizer,
    validator: SchemaValidator,
}

impl ResponseRecovery {
    /// Create a recovery pipeline
    pub fn new(normalizer: ResponseNormalizer, config: RecoveryConfig) -> Self {
        Self {
            normalizer,
            validator: SchemaValidator::new(config),
        }
    }

    /// The normalizer in use
    pub fn normalizer(&self) -> &ResponseNormalizer {
        &self.normalizer
    }

    /// Recover an answer of the given output type
    pub fn recover(&self, raw: &str, output_type: OutputType) -> ValidationOutcome {
        self.recover_fields(raw, output_type.required_fields())
    }

    /// Recover an answer against an explicit required-field set
    pub fn recover_fields(&self, raw: &str, required: &[FieldSpec]) -> ValidationOutcome {
        let normalized = self.normalizer.normalize(raw);
        self.validator.validate(normalized, required, raw)
    }
}
