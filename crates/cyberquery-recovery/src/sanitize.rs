//! Markup scrubbing for user input and model output
//!
//! Only real HTML element tags are stripped. Angle-bracket placeholders that
//! are common in command syntax, such as `<target>` or `<wordlist>`, survive.

use crate::rules::compile;
use crate::Payload;
use regex::Regex;
use serde_json::Value;
use std::sync::LazyLock;

static SCRIPT_BLOCK: LazyLock<Regex> =
    LazyLock::new(|| compile(r"(?is)<script[^>]*>.*?</script\s*>"));

static HTML_TAG: LazyLock<Regex> = LazyLock::new(|| {
    compile(
        r"(?i)</?(?:a|abbr|b|blockquote|body|br|button|code|div|em|embed|form|h[1-6]|head|hr|html|i|iframe|img|input|label|li|link|meta|object|ol|option|p|pre|script|select|small|span|strong|style|sub|sup|svg|table|tbody|td|textarea|th|thead|title|tr|u|ul)\b[^<>]*/?>",
    )
});

/// Remove `<script>` blocks and HTML tags, then trim
///
/// # Examples
///
/// ```
/// use cyberquery_recovery::sanitize_text;
///
/// assert_eq!(sanitize_text(r#"<script>alert("xss")</script>Hello"#), "Hello");
/// assert_eq!(sanitize_text(" <b>Bold</b> text "), "Bold text");
/// assert_eq!(sanitize_text("hydra -l admin -P <wordlist> ssh://<target>"),
///            "hydra -l admin -P <wordlist> ssh://<target>");
/// ```
pub fn sanitize_text(text: &str) -> String {
    let without_scripts = SCRIPT_BLOCK.replace_all(text, "");
    HTML_TAG.replace_all(&without_scripts, "").trim().to_string()
}

/// Sanitize a JSON value in place
///
/// Strings are sanitized; arrays and objects are walked; other values are
/// left untouched.
pub fn sanitize_value(value: &mut Value) {
    match value {
        Value::String(s) => *s = sanitize_text(s),
        Value::Array(items) => items.iter_mut().for_each(sanitize_value),
        Value::Object(map) => map.values_mut().for_each(sanitize_value),
        _ => {}
    }
}

/// Sanitize every value of a payload in place
pub fn sanitize_payload(payload: &mut Payload) {
    payload.values_mut().for_each(sanitize_value);
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_sanitize_text_cases() {
        let cases = [
            (r#"<script>alert("xss")</script>Hello"#, "Hello"),
            (r#"<a href="http://example.com">Link</a>"#, "Link"),
            ("  Hello  ", "Hello"),
            ("Hello world", "Hello world"),
            (" <b>Bold</b> text ", "Bold text"),
            ("", ""),
            ("<p></p>", ""),
            ("<div><p>Hello</p></div>", "Hello"),
            ("<script>code</script>", ""),
        ];
        for (input, expected) in cases {
            assert_eq!(sanitize_text(input), expected, "input: {:?}", input);
        }
    }

    #[test]
    fn test_script_block_spanning_lines() {
        assert_eq!(
            sanitize_text("before<SCRIPT type=\"text/javascript\">\nvar x = 1;\n</script>after"),
            "beforeafter"
        );
    }

    #[test]
    fn test_placeholders_and_redirects_survive() {
        assert_eq!(sanitize_text("nmap -sV <target> > scan.txt"), "nmap -sV <target> > scan.txt");
        assert_eq!(sanitize_text("if a < b && c > d"), "if a < b && c > d");
    }

    #[test]
    fn test_sanitize_payload() {
        let mut payload = json!({
            "explanation": "  value1  ",
            "commands": ["  value2  ", "  value3  "],
            "count": 123,
            "exploits": [{"title": "<b>CVE-2021-44228</b>", "severity": "critical"}]
        })
        .as_object()
        .cloned()
        .unwrap();

        sanitize_payload(&mut payload);

        assert_eq!(payload["explanation"], "value1");
        assert_eq!(payload["commands"], json!(["value2", "value3"]));
        assert_eq!(payload["count"], 123);
        assert_eq!(payload["exploits"][0]["title"], "CVE-2021-44228");
    }
}
