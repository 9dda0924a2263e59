//! Text repair rules for near-miss JSON
//!
//! Each rule is a pure `&str -> String` rewrite. The normalizer applies them
//! in the order returned by [`default_rules`]; that order matters:
//!
//! 1. fence markers go first so nothing downstream sees backticks
//! 2. escaped-quote contractions are fixed before quote conversion
//! 3. single-to-double quote conversion brackets escaped quotes with sentinels
//! 4. trailing commas and the list/key repair assume canonical quoting

use regex::Regex;
use std::sync::LazyLock;

/// A named text rewrite
#[derive(Debug, Clone, Copy)]
pub struct RepairRule {
    /// Short identifier used in logs
    pub name: &'static str,
    /// The rewrite itself
    pub rewrite: fn(&str) -> String,
}

impl RepairRule {
    /// Create a rule
    pub const fn new(name: &'static str, rewrite: fn(&str) -> String) -> Self {
        Self { name, rewrite }
    }

    /// Apply the rule
    pub fn apply(&self, text: &str) -> String {
        (self.rewrite)(text)
    }
}

static JSON_FENCE: LazyLock<Regex> = LazyLock::new(|| compile(r"(?i)```json\s*"));
static LANG_FENCE: LazyLock<Regex> = LazyLock::new(|| compile(r"```([A-Za-z][\w+\-]*)"));
static CONTRACTION: LazyLock<Regex> = LazyLock::new(|| compile(r#"(\w)\\"(\w)"#));
static OPENING_ESCAPED_QUOTE: LazyLock<Regex> = LazyLock::new(|| compile(r#"\\"(\w)"#));
static SINGLE_QUOTED: LazyLock<Regex> = LazyLock::new(|| compile(r"'([^']*)'"));
static TRAILING_COMMA: LazyLock<Regex> = LazyLock::new(|| compile(r",(\s*[}\]])"));
static STRAY_EXPLANATION: LazyLock<Regex> = LazyLock::new(|| {
    compile(r#"(?i)(\["[^"]*"\s*),\s*"(explanation)":\s*"([^"]*)"\s*\]"#)
});

const ESCAPED_SINGLE_SENTINEL: &str = "\u{1}ESCAPED_SINGLE_QUOTE\u{1}";
const ESCAPED_DOUBLE_SENTINEL: &str = "\u{1}ESCAPED_DOUBLE_QUOTE\u{1}";

// Patterns are literals, covered by the tests below
pub(crate) fn compile(pattern: &str) -> Regex {
    Regex::new(pattern).expect("static repair pattern must compile")
}

/// Remove code fences left inside the text
///
/// ```` ```json ```` markers vanish, other ```` ```lang ```` markers become
/// an escaped newline plus the language name (so a fence inside a JSON string
/// stays a legal string), and bare fences are dropped.
///
/// Every language tag gets the newline rewrite, not only ```` ```python ````;
/// `bash` and `sh` fences show up inside values too.
pub fn strip_embedded_fences(text: &str) -> String {
    let text = JSON_FENCE.replace_all(text, "");
    let text = LANG_FENCE.replace_all(&text, r"\n$1");
    text.replace("```", "")
}

/// Turn escaped quotes that were meant as apostrophes into apostrophes
///
/// `don\"t` → `don't`, `\"Hello` → `'Hello`
pub fn fix_escaped_contractions(text: &str) -> String {
    let text = CONTRACTION.replace_all(text, "$1'$2");
    OPENING_ESCAPED_QUOTE.replace_all(&text, "'$1").into_owned()
}

/// Convert single-quote string delimiters to double quotes
///
/// Escaped quotes are swapped for sentinels during the conversion so they
/// come back untouched.
pub fn single_to_double_quotes(text: &str) -> String {
    let protected = text
        .replace("\\'", ESCAPED_SINGLE_SENTINEL)
        .replace("\\\"", ESCAPED_DOUBLE_SENTINEL);
    let converted = SINGLE_QUOTED.replace_all(&protected, "\"$1\"");
    converted
        .replace(ESCAPED_SINGLE_SENTINEL, "\\'")
        .replace(ESCAPED_DOUBLE_SENTINEL, "\\\"")
}

/// Drop a comma that sits right before `}` or `]`
pub fn remove_trailing_commas(text: &str) -> String {
    TRAILING_COMMA.replace_all(text, "$1").into_owned()
}

/// Close a string list before a stray `"explanation"` key
///
/// `["x", "explanation": "y"]` → `["x"], "explanation": "y"`
pub fn close_list_before_stray_key(text: &str) -> String {
    STRAY_EXPLANATION
        .replace_all(text, r#"${1}], "${2}": "${3}""#)
        .into_owned()
}

/// The repair chain, in application order
pub fn default_rules() -> Vec<RepairRule> {
    vec![
        RepairRule::new("strip_embedded_fences", strip_embedded_fences),
        RepairRule::new("fix_escaped_contractions", fix_escaped_contractions),
        RepairRule::new("single_to_double_quotes", single_to_double_quotes),
        RepairRule::new("remove_trailing_commas", remove_trailing_commas),
        RepairRule::new("close_list_before_stray_key", close_list_before_stray_key),
    ]
}
