//! Test utilities: mock implementations of the collaborator traits.
//!
//! Handwritten mocks for dependency injection in unit tests.
//! All mocks share their state through `Arc<Mutex<_>>`/atomics, so a clone
//! handed to the code under test can be inspected afterwards.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use crate::error::AppError;
use crate::models::Anchor;
use crate::traits::{Fetcher, RenderSession, Renderer};

// ---------------------------------------------------------------------------
// MockFetcher
// ---------------------------------------------------------------------------

/// Mock fetcher with canned responses per URL.
///
/// Unknown URLs answer with a `FetchError` mimicking HTTP 404. Every call is
/// recorded in order.
#[derive(Clone, Default)]
pub struct MockFetcher {
    responses: Arc<Mutex<HashMap<String, Result<String, AppError>>>>,
    hanging: Arc<Mutex<Vec<String>>>,
    refused_hosts: Arc<Mutex<Vec<String>>>,
    calls: Arc<Mutex<Vec<String>>>,
}

impl MockFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_page(self, url: &str, body: &str) -> Self {
        self.with_response(url, Ok(body.to_string()))
    }

    pub fn with_response(self, url: &str, response: Result<String, AppError>) -> Self {
        self.responses
            .lock()
            .unwrap()
            .insert(url.to_string(), response);
        self
    }

    /// Requests for `url` never complete.
    pub fn with_hanging(self, url: &str) -> Self {
        self.hanging.lock().unwrap().push(url.to_string());
        self
    }

    /// Every URL on `host` fails [`Fetcher::check_target`].
    pub fn with_refused_host(self, host: &str) -> Self {
        self.refused_hosts.lock().unwrap().push(host.to_string());
        self
    }

    /// URLs fetched so far, in call order.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

impl Fetcher for MockFetcher {
    async fn fetch(&self, url: &str) -> Result<String, AppError> {
        self.calls.lock().unwrap().push(url.to_string());
        let hangs = self.hanging.lock().unwrap().iter().any(|u| u == url);
        if hangs {
            futures::future::pending::<()>().await;
        }
        let response = self.responses.lock().unwrap().get(url).cloned();
        response.unwrap_or_else(|| Err(AppError::FetchError(format!("HTTP 404 for {url}"))))
    }

    async fn check_target(&self, url: &str) -> Result<(), AppError> {
        let host = url::Url::parse(url)
            .ok()
            .and_then(|u| u.host_str().map(str::to_string));
        let refused = self.refused_hosts.lock().unwrap();
        match host {
            Some(host) if refused.contains(&host) => Err(AppError::FetchError(format!(
                "SSRF blocked: {host} resolves to private/reserved IP"
            ))),
            _ => Ok(()),
        }
    }
}

// ---------------------------------------------------------------------------
// MockRenderer
// ---------------------------------------------------------------------------

/// What a mock page yields when queried.
#[derive(Clone, Default)]
pub struct MockPage {
    pub anchors: Vec<Anchor>,
    pub blocks: Vec<String>,
    /// DOM evaluation fails with a `RenderError`.
    pub fail_queries: bool,
    /// DOM evaluation never completes.
    pub hang: bool,
}

impl MockPage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_anchor(mut self, href: &str, text: &str) -> Self {
        self.anchors.push(Anchor::new(href, text));
        self
    }

    pub fn with_block(mut self, json: &str) -> Self {
        self.blocks.push(json.to_string());
        self
    }

    pub fn failing() -> Self {
        Self {
            fail_queries: true,
            ..Self::default()
        }
    }

    pub fn hanging() -> Self {
        Self {
            hang: true,
            ..Self::default()
        }
    }
}

/// Mock renderer serving [`MockPage`]s per URL.
///
/// Navigating to an unknown URL fails with a `RenderError`. Tracks how many
/// sessions were opened and how many are still alive.
#[derive(Clone, Default)]
pub struct MockRenderer {
    pages: Arc<Mutex<HashMap<String, MockPage>>>,
    opened: Arc<AtomicUsize>,
    live: Arc<AtomicUsize>,
}

impl MockRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_page(self, url: &str, page: MockPage) -> Self {
        self.pages.lock().unwrap().insert(url.to_string(), page);
        self
    }

    /// Sessions opened so far.
    pub fn opened(&self) -> usize {
        self.opened.load(Ordering::SeqCst)
    }

    /// Sessions opened but not yet released.
    pub fn live_sessions(&self) -> usize {
        self.live.load(Ordering::SeqCst)
    }
}

impl Renderer for MockRenderer {
    type Session = MockSession;

    async fn open(&self, url: &str) -> Result<MockSession, AppError> {
        let page = self.pages.lock().unwrap().get(url).cloned();
        let page = page.ok_or_else(|| {
            AppError::RenderError(format!("Failed to navigate to {url}: net::ERR_NAME_NOT_RESOLVED"))
        })?;
        self.opened.fetch_add(1, Ordering::SeqCst);
        self.live.fetch_add(1, Ordering::SeqCst);
        Ok(MockSession {
            page,
            live: Arc::clone(&self.live),
        })
    }
}

/// Session handed out by [`MockRenderer`]; releases itself on drop.
pub struct MockSession {
    page: MockPage,
    live: Arc<AtomicUsize>,
}

impl MockSession {
    async fn query<T: Clone>(&self, value: &T) -> Result<T, AppError> {
        if self.page.hang {
            futures::future::pending::<()>().await;
        }
        if self.page.fail_queries {
            return Err(AppError::RenderError("Execution context was destroyed".into()));
        }
        Ok(value.clone())
    }
}

impl RenderSession for MockSession {
    async fn anchors(&self) -> Result<Vec<Anchor>, AppError> {
        self.query(&self.page.anchors).await
    }

    async fn structured_data_blocks(&self) -> Result<Vec<String>, AppError> {
        self.query(&self.page.blocks).await
    }

    async fn close(self) {}
}

impl Drop for MockSession {
    fn drop(&mut self) {
        self.live.fetch_sub(1, Ordering::SeqCst);
    }
}
