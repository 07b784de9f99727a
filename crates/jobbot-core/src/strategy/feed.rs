//! RSS / Atom parsing.
//!
//! Feeds are treated as text: entry blocks are located by their delimiters
//! and the title/link sub-elements are pulled out of each block. Malformed
//! XML elsewhere in the document does not prevent well-formed entries from
//! being read.

use std::sync::LazyLock;

use regex::Regex;

use crate::models::Posting;

static RE_ENTRY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)<item\b[^>]*>(.*?)</item\s*>|<entry\b[^>]*>(.*?)</entry\s*>").unwrap()
});
static RE_TITLE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<title\b[^>]*>(.*?)</title\s*>").unwrap());
static RE_LINK_TEXT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<link\b[^>]*>(.*?)</link\s*>").unwrap());
static RE_LINK_HREF: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?is)<link\b[^>]*?\bhref\s*=\s*["']([^"']*)["']"#).unwrap()
});
static RE_CDATA: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<!\[CDATA\[(.*?)\]\]>").unwrap());
static RE_TAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]+>").unwrap());

/// Extract one posting per feed entry. Description is always empty.
pub fn parse_feed(body: &str) -> Vec<Posting> {
    RE_ENTRY
        .captures_iter(body)
        .filter_map(|caps| caps.get(1).or_else(|| caps.get(2)))
        .map(|block| parse_entry(block.as_str()))
        .filter(|posting| !posting.is_blank())
        .collect()
}

fn parse_entry(block: &str) -> Posting {
    let title = RE_TITLE
        .captures(block)
        .and_then(|c| c.get(1))
        .map(|m| clean_text(m.as_str()))
        .unwrap_or_default();

    let link = RE_LINK_TEXT
        .captures(block)
        .and_then(|c| c.get(1))
        .map(|m| clean_text(m.as_str()))
        .filter(|link| !link.is_empty())
        .or_else(|| {
            RE_LINK_HREF
                .captures(block)
                .and_then(|c| c.get(1))
                .map(|m| html_escape::decode_html_entities(m.as_str().trim()).into_owned())
        })
        .unwrap_or_default();

    Posting::new(title, link)
}

/// Unwrap CDATA, strip markup, decode entities, collapse whitespace.
fn clean_text(raw: &str) -> String {
    let unwrapped = RE_CDATA.replace_all(raw, "$1");
    let stripped = RE_TAG.replace_all(&unwrapped, "");
    html_escape::decode_html_entities(&stripped)
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}
