use std::future::Future;

use futures::future::BoxFuture;

use crate::error::AppError;
use crate::models::{Anchor, Posting};

/// Fetches a URL's body as text.
///
/// Implementations send the configured user agent, enforce a bounded
/// timeout, and map non-success statuses to [`AppError::FetchError`].
pub trait Fetcher: Send + Sync + Clone {
    fn fetch(&self, url: &str) -> impl Future<Output = Result<String, AppError>> + Send;

    /// Whether `url` may be contacted at all, by this fetcher or by the
    /// renderer. Runs before any request for the URL is made.
    fn check_target(&self, url: &str) -> impl Future<Output = Result<(), AppError>> + Send {
        let _ = url;
        async { Ok(()) }
    }
}

/// Opens headless-browser sessions on a URL.
pub trait Renderer: Send + Sync + Clone {
    type Session: RenderSession;

    /// Navigate to `url` and wait until the document has been parsed.
    fn open(&self, url: &str) -> impl Future<Output = Result<Self::Session, AppError>> + Send;
}

/// A single loaded page that can be queried.
///
/// Dropping a session without calling [`close`](Self::close) must still
/// release it; that is how cancelled requests give their tab back.
pub trait RenderSession: Send + Sync {
    /// Every `a[href]` element with its resolved target and visible text.
    fn anchors(&self) -> impl Future<Output = Result<Vec<Anchor>, AppError>> + Send;

    /// Raw text of every `script[type="application/ld+json"]` element.
    fn structured_data_blocks(&self)
    -> impl Future<Output = Result<Vec<String>, AppError>> + Send;

    /// Release the session.
    fn close(self) -> impl Future<Output = ()> + Send;
}

/// A renderer for builds without headless-browser support.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullRenderer;

/// Session type of [`NullRenderer`]; never constructed.
#[derive(Debug)]
pub enum NullSession {}

impl Renderer for NullRenderer {
    type Session = NullSession;

    async fn open(&self, url: &str) -> Result<NullSession, AppError> {
        Err(AppError::RenderError(format!(
            "headless rendering is not available in this build (needed for {url})"
        )))
    }
}

impl RenderSession for NullSession {
    async fn anchors(&self) -> Result<Vec<Anchor>, AppError> {
        match *self {}
    }

    async fn structured_data_blocks(&self) -> Result<Vec<String>, AppError> {
        match *self {}
    }

    async fn close(self) {
        match self {}
    }
}

/// Object-safe entry point for turning a URL into postings.
///
/// Lets the HTTP layer hold any `ExtractionService` behind a trait object.
pub trait PostingExtractor: Send + Sync {
    fn extract<'a>(
        &'a self,
        url: &'a str,
        hint: Option<&'a str>,
    ) -> BoxFuture<'a, Result<Vec<Posting>, AppError>>;
}
