//! Response normalization: raw model text to a JSON object
//!
//! ```text
//! raw ──► strip wrapping fence ──► parse ──ok──► payload
//!                                    │
//!                                   err
//!                                    ▼
//!                      repair rules (in order) ──► parse ──► payload | NormalizeError
//! ```
//!
//! Text that already parses is never rewritten.

use crate::error::NormalizeError;
use crate::rules::{default_rules, RepairRule};
use crate::Payload;
use regex::Regex;
use serde_json::Value;
use std::sync::LazyLock;
use tracing::debug;

static OPENING_FENCE: LazyLock<Regex> =
    LazyLock::new(|| crate::rules::compile(r"^```[\w+\-]*[ \t]*(?:\r?\n)?"));
static CLOSING_FENCE: LazyLock<Regex> =
    LazyLock::new(|| crate::rules::compile(r"(?:\r?\n)?[ \t]*```$"));

/// How far normalization had to go
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NormalizeStage {
    /// Parsed as-is (after fence stripping)
    Direct,
    /// Parsed after the repair rules ran
    Repaired,
}

/// Converts near-miss model output into a JSON object
///
/// # Examples
///
/// ```
/// use cyberquery_recovery::ResponseNormalizer;
///
/// let normalizer = ResponseNormalizer::new();
/// let payload = normalizer
///     .normalize("{'commands': ['nmap -sS target',], 'explanation': 'SYN scan',}")
///     .unwrap();
/// assert_eq!(payload["commands"][0], "nmap -sS target");
/// ```
#[derive(Debug, Clone)]
pub struct ResponseNormalizer {
    rules: Vec<RepairRule>,
}

impl ResponseNormalizer {
    /// Create a normalizer with the default repair chain
    pub fn new() -> Self {
        Self {
            rules: default_rules(),
        }
    }

    /// Create a normalizer with an explicit repair chain
    pub fn with_rules(rules: Vec<RepairRule>) -> Self {
        Self { rules }
    }

    /// Append a rule to the end of the chain
    pub fn with_rule(mut self, rule: RepairRule) -> Self {
        self.rules.push(rule);
        self
    }

    /// Names of the rules, in application order
    pub fn rule_names(&self) -> Vec<&'static str> {
        self.rules.iter().map(|r| r.name).collect()
    }

    /// Rewrite `raw` into the text that will be parsed
    ///
    /// Returns the trimmed, fence-stripped text unchanged if it already
    /// parses; otherwise the output of the full repair chain.
    pub fn clean(&self, raw: &str) -> String {
        self.clean_with_stage(raw).0
    }

    /// Parse `raw` into a JSON object, repairing it if needed
    pub fn normalize(&self, raw: &str) -> Result<Payload, NormalizeError> {
        self.normalize_with_stage(raw).map(|(payload, _)| payload)
    }

    /// Like [`normalize`](Self::normalize), also reporting the stage reached
    pub fn normalize_with_stage(&self, raw: &str) -> Result<(Payload, NormalizeStage), NormalizeError> {
        let (text, stage) = self.clean_with_stage(raw);

        let value: Value = serde_json::from_str(&text).map_err(|e| {
            debug!(error = %e, "Response could not be repaired");
            NormalizeError::Unparseable {
                reason: e.to_string(),
                last_text: text.clone(),
            }
        })?;

        match value {
            Value::Object(payload) => {
                debug!(?stage, fields = payload.len(), "Response normalized");
                Ok((payload, stage))
            }
            other => Err(NormalizeError::NotAnObject {
                found: json_type_name(&other),
                last_text: text,
            }),
        }
    }

    fn clean_with_stage(&self, raw: &str) -> (String, NormalizeStage) {
        let stripped = strip_wrapping_fence(raw);
        if serde_json::from_str::<Value>(&stripped).is_ok() {
            return (stripped, NormalizeStage::Direct);
        }

        let mut text = stripped;
        for rule in &self.rules {
            let rewritten = rule.apply(&text);
            if rewritten != text {
                debug!(rule = rule.name, "Repair rule rewrote response");
            }
            text = rewritten;
        }
        (text.trim().to_string(), NormalizeStage::Repaired)
    }
}

impl Default for ResponseNormalizer {
    fn default() -> Self {
        Self::new()
    }
}

/// Remove a code fence wrapping the whole text
///
/// Text that is not both opened and closed by a fence is only trimmed.
pub fn strip_wrapping_fence(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.len() >= 6 && trimmed.starts_with("```") && trimmed.ends_with("```") {
        let without_open = OPENING_FENCE.replace(trimmed, "");
        let without_close = CLOSING_FENCE.replace(&without_open, "");
        return without_close.trim().to_string();
    }
    trimmed.to_string()
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn cleaned(raw: &str) -> String {
        ResponseNormalizer::new().clean(raw)
    }

    #[test]
    fn test_removes_trailing_commas() {
        assert_eq!(
            cleaned(r#"{"commands": ["nmap -sS target",], "explanation": "test",}"#),
            r#"{"commands": ["nmap -sS target"], "explanation": "test"}"#
        );
    }

    #[test]
    fn test_removes_wrapping_fence() {
        assert_eq!(
            cleaned("```json\n{\"commands\": [\"ls\"], \"explanation\": \"list files\"}\n```"),
            r#"{"commands": ["ls"], "explanation": "list files"}"#
        );
    }

    #[test]
    fn test_fixes_explanation_inside_commands() {
        assert_eq!(
            cleaned(r#"{"commands": ["nmap -sS target", "explanation": "SYN scan"]}"#),
            r#"{"commands": ["nmap -sS target"], "explanation": "SYN scan"}"#
        );
    }

    #[test]
    fn test_strips_surrounding_whitespace() {
        assert_eq!(
            cleaned("  \n{\"commands\": [\"ls\"], \"explanation\": \"test\"}  \n"),
            r#"{"commands": ["ls"], "explanation": "test"}"#
        );
    }

    #[test]
    fn test_fixes_multiple_issues() {
        assert_eq!(
            cleaned("```json\n{\"commands\": [\"nmap\", \"explanation\": \"scan\",], \"extra\": \"data\",}\n```"),
            r#"{"commands": ["nmap"], "explanation": "scan", "extra": "data"}"#
        );
    }

    #[test]
    fn test_converts_single_quotes() {
        assert_eq!(
            cleaned("{'script': 'print(hello)', 'explanation': 'prints hello'}"),
            r#"{"script": "print(hello)", "explanation": "prints hello"}"#
        );
        assert_eq!(
            cleaned("{'key1': 'value1', \"key2\": \"value2\"}"),
            r#"{"key1": "value1", "key2": "value2"}"#
        );
        assert_eq!(
            cleaned("{'commands': ['cmd1', 'cmd2'], 'explanation': 'test'}"),
            r#"{"commands": ["cmd1", "cmd2"], "explanation": "test"}"#
        );
    }

    #[test]
    fn test_valid_json_is_not_rewritten() {
        // Valid JSON containing text the rules would otherwise touch
        let raw = r#"{"explanation": "use 'quotes', then ```code```"}"#;
        let (text, stage) = ResponseNormalizer::new().clean_with_stage(raw);
        assert_eq!(text, raw);
        assert_eq!(stage, NormalizeStage::Direct);
    }

    #[test]
    fn test_normalize_returns_object() {
        let payload = ResponseNormalizer::new()
            .normalize(r#"{"a": [1,2,],}"#)
            .unwrap();
        assert_eq!(Value::Object(payload), json!({"a": [1, 2]}));
    }

    #[test]
    fn test_fenced_with_language_tag_on_one_line() {
        let payload = ResponseNormalizer::new()
            .normalize("```json{\"explanation\": \"x\"}```")
            .unwrap();
        assert_eq!(payload["explanation"], "x");
    }

    #[test]
    fn test_unrepairable_text_carries_last_attempt() {
        let err = ResponseNormalizer::new()
            .normalize("Sure! Here are some commands you could try.")
            .unwrap_err();
        assert!(matches!(err, NormalizeError::Unparseable { .. }));
        assert_eq!(err.last_text(), "Sure! Here are some commands you could try.");
    }

    #[test]
    fn test_non_object_is_rejected() {
        let err = ResponseNormalizer::new().normalize(r#"["ls", "pwd"]"#).unwrap_err();
        assert!(matches!(err, NormalizeError::NotAnObject { found: "array", .. }));
    }

    #[test]
    fn test_stage_is_reported() {
        let normalizer = ResponseNormalizer::new();
        let (_, stage) = normalizer.normalize_with_stage(r#"{"a": 1}"#).unwrap();
        assert_eq!(stage, NormalizeStage::Direct);
        let (_, stage) = normalizer.normalize_with_stage("{'a': 'b'}").unwrap();
        assert_eq!(stage, NormalizeStage::Repaired);
    }

    #[test]
    fn test_custom_rule_runs_last() {
        fn drop_preamble(text: &str) -> String {
            text.trim_start_matches("Answer:").to_string()
        }
        let normalizer = ResponseNormalizer::new().with_rule(RepairRule::new("drop_preamble", drop_preamble));
        assert_eq!(normalizer.rule_names().last(), Some(&"drop_preamble"));

        let payload = normalizer.normalize("Answer: {'explanation': 'ok'}").unwrap();
        assert_eq!(payload["explanation"], "ok");
    }
}
