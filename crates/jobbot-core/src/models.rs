use std::fmt;

use serde::{Deserialize, Serialize};

/// A single job posting, the uniform output of every extraction strategy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Posting {
    pub title: String,
    pub url: String,
    #[serde(default)]
    pub description: String,
}

impl Posting {
    pub fn new(title: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            url: url.into(),
            description: String::new(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Only postings with a title or a URL are worth emitting.
    pub fn is_blank(&self) -> bool {
        self.title.is_empty() && self.url.is_empty()
    }
}

/// An anchor element as reported by the rendering collaborator.
///
/// `href` is the resolved (absolute) link target, `text` the raw visible text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Anchor {
    pub href: String,
    #[serde(default)]
    pub text: String,
}

impl Anchor {
    pub fn new(href: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            href: href.into(),
            text: text.into(),
        }
    }

    /// Convert into a posting with trimmed anchor text as the title.
    pub fn into_posting(self) -> Posting {
        Posting::new(self.text.trim(), self.href)
    }
}

/// The fixed set of extraction strategies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyKind {
    /// Syndication feed (RSS/Atom) parsed as text.
    Feed,
    /// Rendered page whose postings are plain anchor links.
    StaticLink,
    /// JSON API returning a list of postings.
    StructuredApi,
    /// Rendered page scanned for JSON-LD and job-like links.
    GenericRendered,
}

impl StrategyKind {
    /// Parse a caller-supplied hint. Unrecognized hints yield `None`.
    pub fn from_hint(hint: &str) -> Option<Self> {
        match hint.trim().to_ascii_lowercase().as_str() {
            "rss" | "atom" | "feed" => Some(Self::Feed),
            "links" | "static" | "static_link" | "greenhouse" => Some(Self::StaticLink),
            "api" | "json" | "structured_api" | "lever" => Some(Self::StructuredApi),
            "jsonld" | "render" | "rendered" | "generic" | "generic_rendered" => {
                Some(Self::GenericRendered)
            }
            _ => None,
        }
    }

    /// Whether this strategy needs a headless-browser session.
    pub fn needs_rendering(self) -> bool {
        matches!(self, Self::StaticLink | Self::GenericRendered)
    }
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StrategyKind::Feed => write!(f, "feed"),
            StrategyKind::StaticLink => write!(f, "static_link"),
            StrategyKind::StructuredApi => write!(f, "structured_api"),
            StrategyKind::GenericRendered => write!(f, "generic_rendered"),
        }
    }
}
