//! The four extraction strategies.
//!
//! Each runner assumes the policy check and throttle wait have already
//! happened; it performs exactly one fetch or one page load. Rendering
//! runners close their session on every exit path, and rely on the
//! session's drop when the request is cancelled mid-flight.

pub mod api;
pub mod feed;
pub mod links;
pub mod structured_data;

use crate::error::AppError;
use crate::models::{Anchor, Posting};
use crate::traits::{Fetcher, RenderSession, Renderer};

/// Fetch a syndication feed and emit one posting per entry.
pub async fn run_feed<F: Fetcher>(fetcher: &F, url: &str) -> Result<Vec<Posting>, AppError> {
    let body = fetcher.fetch(url).await?;
    tracing::debug!(bytes = body.len(), "Fetched feed");
    Ok(feed::parse_feed(&body))
}

/// Fetch a JSON API and map its postings.
pub async fn run_structured_api<F: Fetcher>(
    fetcher: &F,
    url: &str,
) -> Result<Vec<Posting>, AppError> {
    let body = fetcher.fetch(url).await?;
    tracing::debug!(bytes = body.len(), "Fetched API payload");
    api::parse_api_payload(&body)
}

/// Render the page and keep anchors that point at job postings.
pub async fn run_static_link<R: Renderer>(
    renderer: &R,
    url: &str,
) -> Result<Vec<Posting>, AppError> {
    let session = renderer.open(url).await?;
    let result = session.anchors().await;
    session.close().await;

    Ok(to_postings(result?, links::is_board_link))
}

/// Render the page once and run both extractions against it:
/// JSON-LD postings first, then heuristic links. No de-duplication.
pub async fn run_generic_rendered<R: Renderer>(
    renderer: &R,
    url: &str,
) -> Result<Vec<Posting>, AppError> {
    let session = renderer.open(url).await?;
    let result = extract_generic(&session).await;
    session.close().await;
    result
}

async fn extract_generic<S: RenderSession>(session: &S) -> Result<Vec<Posting>, AppError> {
    let blocks = session.structured_data_blocks().await?;
    let anchors = session.anchors().await?;

    let mut postings = structured_data::parse_blocks(&blocks);
    let structured = postings.len();
    postings.extend(to_postings(anchors, links::is_job_link));
    tracing::debug!(
        structured,
        links = postings.len() - structured,
        "Extracted from rendered page"
    );
    Ok(postings)
}

fn to_postings(anchors: Vec<Anchor>, keep: fn(&Anchor) -> bool) -> Vec<Posting> {
    anchors
        .into_iter()
        .filter(keep)
        .map(Anchor::into_posting)
        .filter(|p| !p.is_blank())
        .collect()
}
