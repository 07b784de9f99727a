//! schema.org `JobPosting` detection in JSON-LD blocks.

use serde_json::Value;

use crate::models::Posting;

/// Marker that identifies a job posting node (matched case-insensitively).
const JOB_TYPE_MARKER: &str = "job";

/// Extract postings from the raw text of JSON-LD script blocks.
///
/// Blocks that fail to parse are skipped. Arrays are walked element-wise and
/// `@graph` containers are descended into.
pub fn parse_blocks(blocks: &[String]) -> Vec<Posting> {
    let mut postings = Vec::new();
    for block in blocks {
        match serde_json::from_str::<Value>(block.trim()) {
            Ok(value) => collect(&value, &mut postings),
            Err(e) => tracing::debug!(error = %e, "Skipping malformed JSON-LD block"),
        }
    }
    postings
}

fn collect(node: &Value, out: &mut Vec<Posting>) {
    match node {
        Value::Array(items) => items.iter().for_each(|item| collect(item, out)),
        Value::Object(map) => {
            if let Some(graph) = map.get("@graph") {
                collect(graph, out);
                return;
            }
            if is_job_posting(node) {
                let posting = Posting::new(
                    text_field(node, &["title", "name"]),
                    text_field(node, &["url"]),
                )
                .with_description(text_field(node, &["description"]));
                if !posting.is_blank() {
                    out.push(posting);
                }
            }
        }
        _ => {}
    }
}

/// `@type` (or `type`) is a string, or array of strings, containing the marker.
fn is_job_posting(node: &Value) -> bool {
    let declared = node.get("@type").or_else(|| node.get("type"));
    let matches = |s: &str| s.to_ascii_lowercase().contains(JOB_TYPE_MARKER);
    match declared {
        Some(Value::String(s)) => matches(s),
        Some(Value::Array(types)) => types.iter().filter_map(Value::as_str).any(matches),
        _ => false,
    }
}

fn text_field(node: &Value, keys: &[&str]) -> String {
    keys.iter()
        .filter_map(|key| node.get(*key).and_then(Value::as_str))
        .map(str::trim)
        .find(|s| !s.is_empty())
        .unwrap_or_default()
        .to_string()
}
