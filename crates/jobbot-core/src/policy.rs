//! robots.txt enforcement.
//!
//! The gate fails open: if the policy file cannot be fetched, the host is
//! treated as unrestricted. Only an explicit disallow stops a request.

use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use robotstxt::DefaultMatcher;
use url::Url;

use crate::traits::Fetcher;

/// Parsed robots.txt for one origin.
#[derive(Debug, Clone)]
pub struct CrawlPolicy {
    body: String,
}

impl CrawlPolicy {
    /// A leading byte-order mark is dropped; the matcher would otherwise
    /// read it as part of the first directive.
    pub fn parse(body: impl Into<String>) -> Self {
        let mut body = body.into();
        if body.starts_with('\u{feff}') {
            body.drain(..'\u{feff}'.len_utf8());
        }
        Self { body }
    }

    /// Whether `url` may be fetched by `user_agent`.
    ///
    /// Groups are matched on the agent's product token (`JobBot-Scraper/1.0`
    /// matches `User-agent: JobBot-Scraper`); `*` groups apply otherwise.
    pub fn allows(&self, url: &str, user_agent: &str) -> bool {
        if self.body.trim().is_empty() {
            return true;
        }
        let mut matcher = DefaultMatcher::default();
        matcher.one_agent_allowed_by_robots(&self.body, product_token(user_agent), url)
    }
}

/// `JobBot-Scraper/1.0 (+https://...)` → `JobBot-Scraper`.
pub fn product_token(user_agent: &str) -> &str {
    user_agent
        .split(|c: char| c == '/' || c.is_whitespace())
        .next()
        .unwrap_or(user_agent)
}

/// Well-known policy file location for a URL's origin.
pub fn policy_url(url: &Url) -> Option<Url> {
    let host = url.host_str()?;
    let origin = match url.port() {
        Some(port) => format!("{}://{}:{}/robots.txt", url.scheme(), host, port),
        None => format!("{}://{}/robots.txt", url.scheme(), host),
    };
    Url::parse(&origin).ok()
}

/// Answers whether this agent may access a URL.
///
/// Uses its own [`Fetcher`] so robots.txt can be fetched with a shorter
/// timeout than page content.
#[derive(Clone)]
pub struct PolicyGate<F> {
    fetcher: F,
    user_agent: String,
    /// Origin → policy (`None` = no readable policy). Only set when a TTL is configured.
    cache: Option<Cache<String, Option<Arc<CrawlPolicy>>>>,
}

impl<F: Fetcher> PolicyGate<F> {
    pub fn new(fetcher: F, user_agent: impl Into<String>) -> Self {
        Self {
            fetcher,
            user_agent: user_agent.into(),
            cache: None,
        }
    }

    /// Reuse fetched policies per origin for `ttl`.
    pub fn with_cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache = Some(Cache::builder().max_capacity(1024).time_to_live(ttl).build());
        self
    }

    pub async fn is_allowed(&self, url: &Url) -> bool {
        let Some(robots_url) = policy_url(url) else {
            return true;
        };

        let policy = match &self.cache {
            Some(cache) => {
                cache
                    .get_with(robots_url.to_string(), self.load(&robots_url))
                    .await
            }
            None => self.load(&robots_url).await,
        };

        match policy {
            Some(policy) => policy.allows(url.as_str(), &self.user_agent),
            None => true,
        }
    }

    async fn load(&self, robots_url: &Url) -> Option<Arc<CrawlPolicy>> {
        match self.fetcher.fetch(robots_url.as_str()).await {
            Ok(body) => Some(Arc::new(CrawlPolicy::parse(body))),
            Err(e) => {
                tracing::debug!(url = %robots_url, error = %e, "No usable robots.txt, treating host as unrestricted");
                None
            }
        }
    }
}
