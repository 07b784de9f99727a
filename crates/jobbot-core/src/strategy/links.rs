//! Anchor heuristics for rendered pages.

use crate::models::Anchor;

/// Markers that make a link look like a job posting on a generic site.
const JOB_MARKERS: &[&str] = &["job", "career", "position"];

/// Only navigable web links are candidates; `mailto:`, `javascript:` and
/// fragment-only targets are not postings.
fn is_web_link(href: &str) -> bool {
    let href = href.trim_start();
    ["http://", "https://"].iter().any(|scheme| {
        href.len() > scheme.len()
            && href
                .get(..scheme.len())
                .is_some_and(|prefix| prefix.eq_ignore_ascii_case(scheme))
    })
}

/// Job-board heuristic: the target contains a `jobs` path segment.
pub fn is_board_link(anchor: &Anchor) -> bool {
    is_web_link(&anchor.href) && anchor.href.to_ascii_lowercase().contains("jobs")
}

/// Generic heuristic: the target or the visible text mentions a job marker.
pub fn is_job_link(anchor: &Anchor) -> bool {
    if !is_web_link(&anchor.href) {
        return false;
    }
    let href = anchor.href.to_ascii_lowercase();
    let text = anchor.text.to_lowercase();
    JOB_MARKERS
        .iter()
        .any(|marker| href.contains(marker) || text.contains(marker))
}
