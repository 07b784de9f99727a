use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use chromiumoxide::{Browser, BrowserConfig, Page};
use futures::StreamExt;
use jobbot_core::error::AppError;
use jobbot_core::models::Anchor;
use jobbot_core::traits::{RenderSession, Renderer};
use serde::de::DeserializeOwned;

/// Every `a[href]` with its resolved target and visible text.
const ANCHORS_JS: &str = r#"
Array.from(document.querySelectorAll('a[href]')).map(a => ({
    href: a.href,
    text: (a.innerText || a.textContent || '').trim()
}))
"#;

/// Raw text of every JSON-LD script block.
const STRUCTURED_DATA_JS: &str = r#"
Array.from(document.querySelectorAll('script[type="application/ld+json"]'))
    .map(s => s.textContent || '')
"#;

/// Headless-browser renderer using Chromium via the Chrome DevTools Protocol.
///
/// A single Chromium process is shared across all clones of this struct;
/// each [`Renderer::open`] call opens a new tab that belongs to exactly one
/// request and is closed when its [`BrowserSession`] is closed or dropped.
#[derive(Clone)]
pub struct BrowserRenderer {
    browser: Arc<Browser>,
    timeout: Duration,
}

impl BrowserRenderer {
    /// Launches a headless Chromium browser with a **30 s** navigation timeout.
    ///
    /// Requires a Chromium / Chrome binary reachable via `$PATH`, `CHROME_BIN`,
    /// or the default locations checked by `chromiumoxide`.
    pub async fn launch(user_agent: &str) -> Result<Self, AppError> {
        Self::launch_with_timeout(user_agent, Duration::from_secs(30)).await
    }

    /// Launches a headless Chromium browser with a custom timeout, applied to
    /// navigation and to each DOM query.
    pub async fn launch_with_timeout(user_agent: &str, timeout: Duration) -> Result<Self, AppError> {
        let mut builder = BrowserConfig::builder().no_sandbox().disable_default_args();

        if let Some(bin) = find_chrome_binary() {
            tracing::info!("Using Chrome binary: {}", bin.display());
            builder = builder.chrome_executable(bin);
        }

        let config = builder
            .arg("--headless=new")
            .arg("--disable-gpu")
            .arg("--disable-dev-shm-usage")
            .arg("--disable-extensions")
            .arg("--no-first-run")
            .arg(format!("--user-agent={user_agent}"))
            .build()
            .map_err(|e| AppError::ConfigError(format!("Browser config error: {e}")))?;

        let (browser, mut handler) = Browser::launch(config)
            .await
            .map_err(|e| AppError::RenderError(format!("Failed to launch browser: {e}")))?;

        // The CDP handler must be polled continuously for the connection to work.
        tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if event.is_err() {
                    tracing::warn!("Browser CDP handler error: {event:?}");
                    break;
                }
            }
        });

        Ok(Self {
            browser: Arc::new(browser),
            timeout,
        })
    }
}

/// Tries to locate the real Chrome/Chromium binary.
///
/// The snap wrapper at `/snap/bin/chromium` strips unknown CLI flags and
/// breaks headless mode, so the binary inside the snap is preferred. `None`
/// lets `chromiumoxide` do its own lookup.
fn find_chrome_binary() -> Option<PathBuf> {
    const CANDIDATES: &[&str] = &[
        "/snap/chromium/current/usr/lib/chromium-browser/chrome",
        "/var/lib/flatpak/exports/bin/org.chromium.Chromium",
        "/usr/bin/google-chrome-stable",
        "/usr/bin/google-chrome",
        "/usr/bin/chromium",
        "/usr/bin/chromium-browser",
    ];

    if let Ok(p) = std::env::var("CHROME_BIN") {
        let path = PathBuf::from(p);
        if path.exists() {
            return Some(path);
        }
    }

    CANDIDATES.iter().map(PathBuf::from).find(|p| p.exists())
}

impl Renderer for BrowserRenderer {
    type Session = BrowserSession;

    async fn open(&self, url: &str) -> Result<BrowserSession, AppError> {
        // `new_page` navigates and waits for the page's load event.
        let page = tokio::time::timeout(self.timeout, self.browser.new_page(url))
            .await
            .map_err(|_| AppError::Timeout(self.timeout.as_secs()))?
            .map_err(|e| AppError::RenderError(format!("Failed to navigate to {url}: {e}")))?;

        tracing::debug!(%url, "Opened browser tab");
        Ok(BrowserSession {
            page: Some(page),
            timeout: self.timeout,
        })
    }
}

/// One browser tab.
///
/// Dropping the session without [`close`](RenderSession::close) closes the
/// tab in the background.
pub struct BrowserSession {
    page: Option<Page>,
    timeout: Duration,
}

impl BrowserSession {
    async fn evaluate<T: DeserializeOwned>(&self, script: &str) -> Result<T, AppError> {
        let page = self
            .page
            .as_ref()
            .ok_or_else(|| AppError::RenderError("Session already closed".into()))?;

        let result = tokio::time::timeout(self.timeout, page.evaluate(script))
            .await
            .map_err(|_| AppError::Timeout(self.timeout.as_secs()))?
            .map_err(|e| AppError::RenderError(format!("DOM evaluation failed: {e}")))?;

        result
            .into_value()
            .map_err(|e| AppError::RenderError(format!("Unexpected DOM evaluation result: {e}")))
    }
}

impl RenderSession for BrowserSession {
    async fn anchors(&self) -> Result<Vec<Anchor>, AppError> {
        self.evaluate(ANCHORS_JS).await
    }

    async fn structured_data_blocks(&self) -> Result<Vec<String>, AppError> {
        self.evaluate(STRUCTURED_DATA_JS).await
    }

    async fn close(mut self) {
        let Some(page) = self.page.take() else {
            return;
        };
        if let Err(e) = page.close().await {
            tracing::debug!(error = %e, "Failed to close browser tab");
        }
    }
}

impl Drop for BrowserSession {
    fn drop(&mut self) {
        let Some(page) = self.page.take() else {
            return;
        };
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn(async move {
                    let _ = page.close().await;
                });
            }
            Err(_) => tracing::warn!("No runtime to close dropped browser tab"),
        }
    }
}
