//! Structured answer shapes and their required fields

use std::fmt;
use std::str::FromStr;

/// Retrieval topic used for free-form chat
pub const CHAT_TOPIC: &str = "cybersecurity tools";

/// Shape of a required field, used to pick a neutral default
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// A string value (default: `""`)
    Text,
    /// A list value (default: `[]`)
    List,
}

/// A required field of an output type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    /// Field name as it appears in the model's JSON
    pub name: &'static str,
    /// Field shape
    pub kind: FieldKind,
}

impl FieldSpec {
    const fn text(name: &'static str) -> Self {
        Self { name, kind: FieldKind::Text }
    }

    const fn list(name: &'static str) -> Self {
        Self { name, kind: FieldKind::List }
    }
}

const COMMAND_FIELDS: &[FieldSpec] = &[FieldSpec::list("commands"), FieldSpec::text("explanation")];
const CODE_FIELDS: &[FieldSpec] = &[
    FieldSpec::text("code"),
    FieldSpec::text("explanation"),
    FieldSpec::text("language"),
];
const EXPLANATION_FIELDS: &[FieldSpec] = &[FieldSpec::text("explanation")];
const EXPLOIT_FIELDS: &[FieldSpec] = &[FieldSpec::list("exploits"), FieldSpec::text("explanation")];

/// The kinds of structured answer the assistant produces
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OutputType {
    /// Ready-to-run CLI commands
    Command,
    /// A command or script in an auto-detected language
    Code,
    /// A step-by-step explanation of supplied code
    Explanation,
    /// Known exploits for a described target
    Exploit,
}

impl OutputType {
    /// All output types
    pub const ALL: [OutputType; 4] = [
        OutputType::Command,
        OutputType::Code,
        OutputType::Explanation,
        OutputType::Exploit,
    ];

    /// Fields the model must return for this output type
    pub fn required_fields(&self) -> &'static [FieldSpec] {
        match self {
            OutputType::Command => COMMAND_FIELDS,
            OutputType::Code => CODE_FIELDS,
            OutputType::Explanation => EXPLANATION_FIELDS,
            OutputType::Exploit => EXPLOIT_FIELDS,
        }
    }

    /// Query used against the reference corpus for this output type
    pub fn retrieval_topic(&self) -> &'static str {
        match self {
            OutputType::Command => "cybersecurity tools commands CLI",
            OutputType::Code => "cybersecurity scripts programming",
            OutputType::Explanation => "tools documentation syntax options",
            OutputType::Exploit => "exploits vulnerabilities CVE",
        }
    }

    /// Stable lowercase name
    pub fn as_str(&self) -> &'static str {
        match self {
            OutputType::Command => "command",
            OutputType::Code => "code",
            OutputType::Explanation => "explanation",
            OutputType::Exploit => "exploit",
        }
    }
}

impl fmt::Display for OutputType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OutputType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "command" | "commands" => Ok(OutputType::Command),
            "code" | "script" => Ok(OutputType::Code),
            "explanation" | "explain" => Ok(OutputType::Explanation),
            "exploit" | "exploits" => Ok(OutputType::Exploit),
            other => Err(format!("Unknown output type: {}", other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_requires_commands_and_explanation() {
        let names: Vec<_> = OutputType::Command
            .required_fields()
            .iter()
            .map(|f| f.name)
            .collect();
        assert_eq!(names, vec!["commands", "explanation"]);
        assert_eq!(OutputType::Command.required_fields()[0].kind, FieldKind::List);
    }

    #[test]
    fn test_every_type_requires_explanation() {
        for output_type in OutputType::ALL {
            assert!(
                output_type.required_fields().iter().any(|f| f.name == "explanation"),
                "{} should require an explanation",
                output_type
            );
        }
    }

    #[test]
    fn test_parse_aliases() {
        assert_eq!("script".parse::<OutputType>().unwrap(), OutputType::Code);
        assert_eq!(" Exploits ".parse::<OutputType>().unwrap(), OutputType::Exploit);
        assert!("poem".parse::<OutputType>().is_err());
    }
}
