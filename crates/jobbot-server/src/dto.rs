use serde::{Deserialize, Serialize};

use jobbot_core::models::Posting;

// ---------------------------------------------------------------------------
// Scrape
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct ScrapeRequest {
    /// Page, feed, or API endpoint to extract postings from.
    #[serde(default)]
    pub url: Option<String>,
    /// Strategy hint overriding URL classification
    /// (`rss`, `links`, `api`, `jsonld`, ...). Unknown values are ignored.
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct ScrapeResponse {
    pub ok: bool,
    pub jobs: Vec<PostingDto>,
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct PostingDto {
    pub title: String,
    pub url: String,
    pub description: String,
}

impl From<Posting> for PostingDto {
    fn from(p: Posting) -> Self {
        Self {
            title: p.title,
            url: p.url,
            description: p.description,
        }
    }
}

// ---------------------------------------------------------------------------
// System
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct HealthResponse {
    pub status: &'static str,
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}
