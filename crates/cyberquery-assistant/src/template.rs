//! Placeholder templates with `str.format`-style brace syntax
//!
//! `{name}` is a substitution point; `{{` and `}}` are literal braces. Any
//! free-form text that becomes part of a template's *source* (retrieved
//! documentation, for instance) must go through [`escape_braces`] first, or
//! its braces are read as placeholders. Substituted *values* are inserted
//! verbatim and never scanned again.

use std::collections::{BTreeSet, HashMap};
use thiserror::Error;

/// Errors raised while parsing or filling a template
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TemplateError {
    /// A `{` with no matching `}`
    #[error("Unmatched '{{' at byte {0}")]
    UnmatchedOpen(usize),

    /// A `}` that does not close a placeholder and is not doubled
    #[error("Single '}}' encountered at byte {0}")]
    UnmatchedClose(usize),

    /// Placeholder text that is not a plain identifier
    #[error("Invalid placeholder '{{{0}}}'")]
    InvalidPlaceholder(String),

    /// No value supplied for a placeholder
    #[error("Missing value for placeholder '{0}'")]
    MissingVariable(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Placeholder(String),
}

/// A parsed template
///
/// # Examples
///
/// ```
/// use cyberquery_assistant::{escape_braces, PromptTemplate};
///
/// let docs = "jq '.items[] | {name}'";
/// let source = format!("Docs: {}\nTask: {{task}}", escape_braces(docs));
///
/// let template = PromptTemplate::new(&source).unwrap();
/// assert_eq!(template.input_variables(), vec!["task"]);
///
/// let prompt = template.format(&[("task", "list names {verbatim}")]).unwrap();
/// assert_eq!(prompt, "Docs: jq '.items[] | {name}'\nTask: list names {verbatim}");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptTemplate {
    segments: Vec<Segment>,
}

impl PromptTemplate {
    /// Parse a template source
    pub fn new(source: &str) -> Result<Self, TemplateError> {
        let mut segments = Vec::new();
        let mut literal = String::new();
        let mut chars = source.char_indices().peekable();

        while let Some((pos, c)) = chars.next() {
            match c {
                '{' => {
                    if matches!(chars.peek(), Some((_, '{'))) {
                        chars.next();
                        literal.push('{');
                        continue;
                    }

                    let mut name = String::new();
                    let mut closed = false;
                    for (_, inner) in chars.by_ref() {
                        if inner == '}' {
                            closed = true;
                            break;
                        }
                        name.push(inner);
                    }
                    if !closed {
                        return Err(TemplateError::UnmatchedOpen(pos));
                    }
                    if !is_identifier(&name) {
                        return Err(TemplateError::InvalidPlaceholder(name));
                    }

                    if !literal.is_empty() {
                        segments.push(Segment::Literal(std::mem::take(&mut literal)));
                    }
                    segments.push(Segment::Placeholder(name));
                }
                '}' => {
                    if matches!(chars.peek(), Some((_, '}'))) {
                        chars.next();
                        literal.push('}');
                    } else {
                        return Err(TemplateError::UnmatchedClose(pos));
                    }
                }
                other => literal.push(other),
            }
        }

        if !literal.is_empty() {
            segments.push(Segment::Literal(literal));
        }
        Ok(Self { segments })
    }

    /// Placeholder names, sorted and de-duplicated
    pub fn input_variables(&self) -> Vec<String> {
        self.segments
            .iter()
            .filter_map(|s| match s {
                Segment::Placeholder(name) => Some(name.clone()),
                Segment::Literal(_) => None,
            })
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Fill every placeholder
    ///
    /// Extra values are ignored; a missing one is an error.
    pub fn format(&self, values: &[(&str, &str)]) -> Result<String, TemplateError> {
        let lookup: HashMap<&str, &str> = values.iter().copied().collect();
        let mut out = String::new();

        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => out.push_str(text),
                Segment::Placeholder(name) => {
                    let value = lookup
                        .get(name.as_str())
                        .ok_or_else(|| TemplateError::MissingVariable(name.clone()))?;
                    out.push_str(value);
                }
            }
        }
        Ok(out)
    }
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() || first == '_' => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        _ => false,
    }
}

/// Double every brace so the text reads literally inside a template source
pub fn escape_braces(text: &str) -> String {
    text.replace('{', "{{").replace('}', "}}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_substitutes_placeholders() {
        let template = PromptTemplate::new("Task: {task}\nLanguage: {language}").unwrap();
        let out = template
            .format(&[("task", "scan ports"), ("language", "bash")])
            .unwrap();
        assert_eq!(out, "Task: scan ports\nLanguage: bash");
    }

    #[test]
    fn test_doubled_braces_are_literal() {
        let template = PromptTemplate::new("Respond as {{'commands': [...]}} for {task}").unwrap();
        assert_eq!(template.input_variables(), vec!["task"]);
        assert_eq!(
            template.format(&[("task", "x")]).unwrap(),
            "Respond as {'commands': [...]} for x"
        );
    }

    #[test]
    fn test_input_variables_sorted_and_unique() {
        let template = PromptTemplate::new("{b} {a} {b}").unwrap();
        assert_eq!(template.input_variables(), vec!["a", "b"]);
    }

    #[test]
    fn test_unescaped_context_is_rejected() {
        // Raw JSON in a template source reads as a bogus placeholder
        let err = PromptTemplate::new(r#"Docs: {"key": "value"} Task: {task}"#).unwrap_err();
        assert!(matches!(err, TemplateError::InvalidPlaceholder(_)));
    }

    #[test]
    fn test_unescaped_identifier_context_corrupts_silently() {
        // The dangerous case: a brace pair that *looks* like a placeholder
        let template = PromptTemplate::new("Docs: awk '{print}' Task: {task}").unwrap();
        assert_eq!(template.input_variables(), vec!["print", "task"]);
    }

    #[test]
    fn test_stray_braces_are_errors() {
        assert_eq!(PromptTemplate::new("open {task").unwrap_err(), TemplateError::UnmatchedOpen(5));
        assert_eq!(PromptTemplate::new("close } here").unwrap_err(), TemplateError::UnmatchedClose(6));
        assert!(matches!(
            PromptTemplate::new("empty {} here").unwrap_err(),
            TemplateError::InvalidPlaceholder(_)
        ));
    }

    #[test]
    fn test_missing_value_is_error() {
        let template = PromptTemplate::new("{task}").unwrap();
        assert_eq!(
            template.format(&[]).unwrap_err(),
            TemplateError::MissingVariable("task".to_string())
        );
    }

    #[test]
    fn test_values_are_not_rescanned() {
        let template = PromptTemplate::new("{a}").unwrap();
        assert_eq!(template.format(&[("a", "{b} }} {{")]).unwrap(), "{b} }} {{");
    }

    proptest! {
        #[test]
        fn prop_escape_then_substitute_round_trips(
            context in "[a-z{}\\[\\]:'\" \n]{0,60}",
            task in ".{0,30}",
        ) {
            let source = format!("CONTEXT:\n{}\nTASK: {{task}}", escape_braces(&context));
            let template = PromptTemplate::new(&source).unwrap();
            prop_assert_eq!(template.input_variables(), vec!["task".to_string()]);

            let out = template.format(&[("task", &task)]).unwrap();
            prop_assert_eq!(out, format!("CONTEXT:\n{}\nTASK: {}", context, task));
        }
    }
}
