//! Rendering retrieved chunks as a single context block

use crate::index::RankedResult;
use cyberquery_domain::ToolMetadata;
use std::collections::BTreeSet;
use std::sync::LazyLock;

/// Visual separator placed between rendered chunks
pub static CONTEXT_SEPARATOR: LazyLock<String> =
    LazyLock::new(|| format!("\n\n{}\n\n", "=".repeat(80)));

/// Render a ranked result as one human-readable block
///
/// Each chunk gets a header line built from its non-empty metadata fields,
/// followed by the chunk text. An empty result renders as an empty string,
/// which callers treat as "no context".
///
/// The block is plain text. Callers splicing it into a template must escape
/// it first.
pub fn format_context(results: &RankedResult) -> String {
    results
        .iter()
        .map(|scored| {
            let chunk = &scored.chunk;
            format!("{}\n\n{}", header_line(chunk.metadata()), chunk.text().trim())
        })
        .collect::<Vec<_>>()
        .join(CONTEXT_SEPARATOR.as_str())
}

fn header_line(metadata: &ToolMetadata) -> String {
    let mut parts = Vec::new();
    push_field(&mut parts, "Tool", &metadata.tool_name);
    push_field(&mut parts, "Category", &metadata.category);
    push_field(&mut parts, "Subcategory", &metadata.subcategory);
    push_field(&mut parts, "Description", &metadata.description);
    push_set(&mut parts, "Tags", &metadata.tags);
    push_set(&mut parts, "Use cases", &metadata.use_cases);
    parts.join(" | ")
}

fn push_field(parts: &mut Vec<String>, label: &str, value: &str) {
    let value = value.trim();
    if !value.is_empty() {
        parts.push(format!("{}: {}", label, value));
    }
}

fn push_set(parts: &mut Vec<String>, label: &str, values: &BTreeSet<String>) {
    if !values.is_empty() {
        let joined = values.iter().map(String::as_str).collect::<Vec<_>>().join(", ");
        parts.push(format!("{}: {}", label, joined));
    }
}
