use futures::FutureExt;
use futures::future::BoxFuture;
use tokio_util::sync::CancellationToken;
use tracing::Instrument;
use url::Url;
use uuid::Uuid;

use crate::config::ScraperConfig;
use crate::dispatch::Dispatcher;
use crate::error::AppError;
use crate::models::{Posting, StrategyKind};
use crate::policy::PolicyGate;
use crate::strategy;
use crate::throttle::HostThrottle;
use crate::traits::{Fetcher, PostingExtractor, Renderer};

/// Turns a URL into postings: classify → policy check → throttle → strategy.
///
/// Generic over its network collaborators so it can be driven by mocks.
/// The [`HostThrottle`] is a shared handle; give every service in the
/// process the same one.
pub struct ExtractionService<F, R>
where
    F: Fetcher,
    R: Renderer,
{
    fetcher: F,
    renderer: R,
    policy: PolicyGate<F>,
    throttle: HostThrottle,
    dispatcher: Dispatcher,
}

impl<F, R> ExtractionService<F, R>
where
    F: Fetcher,
    R: Renderer,
{
    /// `policy_fetcher` is used only for robots.txt and usually has a
    /// shorter timeout than `fetcher`.
    pub fn new(
        fetcher: F,
        policy_fetcher: F,
        renderer: R,
        throttle: HostThrottle,
        config: &ScraperConfig,
    ) -> Self {
        let mut policy = PolicyGate::new(policy_fetcher, config.user_agent.clone());
        if let Some(ttl) = config.policy_cache_ttl {
            policy = policy.with_cache_ttl(ttl);
        }
        Self {
            fetcher,
            renderer,
            policy,
            throttle,
            dispatcher: Dispatcher::default(),
        }
    }

    /// Replace the default classification rules.
    pub fn with_dispatcher(mut self, dispatcher: Dispatcher) -> Self {
        self.dispatcher = dispatcher;
        self
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    /// Run one extraction request.
    ///
    /// 1. Parse the URL and pick a strategy
    /// 2. Ask the fetcher whether the target may be contacted at all
    /// 3. Check robots.txt (rejects before any throttle wait or content fetch)
    /// 4. Wait for this host's turn
    /// 5. Run the strategy
    pub async fn extract(&self, url: &str, hint: Option<&str>) -> Result<Vec<Posting>, AppError> {
        let kind = self.dispatcher.classify(url, hint);
        let span = tracing::info_span!(
            "extract",
            request_id = %Uuid::new_v4(),
            %url,
            strategy = %kind
        );
        self.run(url, kind).instrument(span).await
    }

    /// Like [`extract`](Self::extract), but gives up with
    /// [`AppError::Cancelled`] as soon as `cancel` fires. The in-flight
    /// fetch or rendering session is dropped, which releases it.
    pub async fn extract_with_cancel(
        &self,
        url: &str,
        hint: Option<&str>,
        cancel: &CancellationToken,
    ) -> Result<Vec<Posting>, AppError> {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                tracing::info!(%url, "Extraction cancelled");
                Err(AppError::Cancelled)
            }
            result = self.extract(url, hint) => result,
        }
    }

    async fn run(&self, url: &str, kind: StrategyKind) -> Result<Vec<Posting>, AppError> {
        let parsed = Url::parse(url).map_err(|e| AppError::InvalidUrl(format!("{url}: {e}")))?;
        let host = HostThrottle::host_key(&parsed)
            .ok_or_else(|| AppError::InvalidUrl(format!("{url}: URL has no host")))?;

        if let Err(e) = self.fetcher.check_target(url).await {
            tracing::warn!(error = %e, "Target refused");
            return Err(e);
        }

        if !self.policy.is_allowed(&parsed).await {
            tracing::warn!("Rejected by robots.txt");
            return Err(AppError::PolicyRejected(url.to_string()));
        }

        self.throttle.await_turn(&host).await;

        tracing::info!(rendered = kind.needs_rendering(), "Extracting");
        let result = match kind {
            StrategyKind::Feed => strategy::run_feed(&self.fetcher, url).await,
            StrategyKind::StructuredApi => strategy::run_structured_api(&self.fetcher, url).await,
            StrategyKind::StaticLink => strategy::run_static_link(&self.renderer, url).await,
            StrategyKind::GenericRendered => {
                strategy::run_generic_rendered(&self.renderer, url).await
            }
        };

        match &result {
            Ok(postings) => tracing::info!(count = postings.len(), "Extraction complete"),
            Err(e) => tracing::warn!(error = %e, kind = e.kind(), "Extraction failed"),
        }
        result
    }
}

impl<F, R> PostingExtractor for ExtractionService<F, R>
where
    F: Fetcher + 'static,
    R: Renderer + 'static,
{
    fn extract<'a>(
        &'a self,
        url: &'a str,
        hint: Option<&'a str>,
    ) -> BoxFuture<'a, Result<Vec<Posting>, AppError>> {
        ExtractionService::extract(self, url, hint).boxed()
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::testutil::{MockFetcher, MockPage, MockRenderer};
    use crate::throttle::ThrottleConfig;

    const ROBOTS: &str = "https://example.com/robots.txt";

    fn service(
        fetcher: MockFetcher,
        renderer: MockRenderer,
    ) -> (ExtractionService<MockFetcher, MockRenderer>, HostThrottle) {
        let throttle = HostThrottle::new(ThrottleConfig::new(Duration::from_millis(2000)));
        let svc = ExtractionService::new(
            fetcher.clone(),
            fetcher,
            renderer,
            throttle.clone(),
            &ScraperConfig::default(),
        );
        (svc, throttle)
    }

    #[tokio::test]
    async fn feed_example_yields_two_postings() {
        let fetcher = MockFetcher::new().with_page(
            "https://example.com/jobs.rss",
            "<item><title>A</title><link>https://x/1</link></item>\
             <item><title>B</title><link>https://x/2</link></item>",
        );
        let (svc, _) = service(fetcher, MockRenderer::new());

        let postings = svc.extract("https://example.com/jobs.rss", None).await.unwrap();
        assert_eq!(
            postings,
            vec![Posting::new("A", "https://x/1"), Posting::new("B", "https://x/2")]
        );
    }

    #[tokio::test]
    async fn structured_api_example() {
        let fetcher = MockFetcher::new().with_page(
            "https://example.com/postings",
            r#"{ "data": [{"text":"Engineer","applyUrl":"https://x/3"}] }"#,
        );
        let (svc, _) = service(fetcher, MockRenderer::new());

        let postings = svc
            .extract("https://example.com/postings", Some("api"))
            .await
            .unwrap();
        assert_eq!(postings, vec![Posting::new("Engineer", "https://x/3")]);
    }

    #[tokio::test]
    async fn structured_api_unexpected_shape_is_empty() {
        let fetcher = MockFetcher::new()
            .with_page("https://api.lever.co/v0/postings/acme", r#"{"ok": true}"#);
        let (svc, _) = service(fetcher, MockRenderer::new());

        let postings = svc
            .extract("https://api.lever.co/v0/postings/acme", None)
            .await
            .unwrap();
        assert!(postings.is_empty());
    }

    #[tokio::test]
    async fn policy_rejection_happens_before_throttle_and_fetch() {
        let fetcher = MockFetcher::new()
            .with_page(ROBOTS, "User-agent: *\nDisallow: /private\n")
            .with_page("https://example.com/private/feed.rss", "<item><title>A</title></item>");
        let renderer = MockRenderer::new();
        let (svc, throttle) = service(fetcher.clone(), renderer.clone());

        let err = svc
            .extract("https://example.com/private/feed.rss", None)
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::PolicyRejected(_)));
        assert_eq!(fetcher.calls(), vec![ROBOTS]);
        assert!(throttle.last_granted("example.com").is_none());
        assert_eq!(renderer.opened(), 0);
    }

    #[tokio::test]
    async fn policy_fetch_failure_proceeds_unrestricted() {
        let fetcher = MockFetcher::new()
            .with_response(
                ROBOTS,
                Err(AppError::NetworkError("Connection refused".into())),
            )
            .with_page(
                "https://example.com/private/feed.rss",
                "<item><title>A</title><link>https://x/1</link></item>",
            );
        let (svc, throttle) = service(fetcher.clone(), MockRenderer::new());

        let postings = svc
            .extract("https://example.com/private/feed.rss", None)
            .await
            .unwrap();
        assert_eq!(postings.len(), 1);
        assert_eq!(
            fetcher.calls(),
            vec![ROBOTS, "https://example.com/private/feed.rss"]
        );
        assert!(throttle.last_granted("example.com").is_some());
    }

    #[tokio::test]
    async fn refused_target_is_never_contacted() {
        let url = "http://169.254.169.254/latest/meta-data/jobs";
        let fetcher = MockFetcher::new().with_refused_host("169.254.169.254");
        let renderer = MockRenderer::new().with_page(
            url,
            MockPage::new().with_anchor("http://169.254.169.254/jobs/role", "iam-role-secret"),
        );
        let (svc, throttle) = service(fetcher.clone(), renderer.clone());

        let err = svc.extract(url, None).await.unwrap_err();
        assert!(matches!(err, AppError::FetchError(_)));
        assert!(fetcher.calls().is_empty());
        assert_eq!(renderer.opened(), 0);
        assert!(throttle.last_granted("169.254.169.254").is_none());
    }

    #[tokio::test]
    async fn fetch_error_propagates() {
        let fetcher = MockFetcher::new().with_response(
            "https://example.com/jobs.rss",
            Err(AppError::FetchError("HTTP 500 for https://example.com/jobs.rss".into())),
        );
        let (svc, _) = service(fetcher, MockRenderer::new());

        let err = svc
            .extract("https://example.com/jobs.rss", None)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::FetchError(_)));
    }

    #[tokio::test]
    async fn invalid_url_is_rejected_without_network() {
        let fetcher = MockFetcher::new();
        let (svc, _) = service(fetcher.clone(), MockRenderer::new());

        let err = svc.extract("not a url", None).await.unwrap_err();
        assert!(matches!(err, AppError::InvalidUrl(_)));
        assert!(fetcher.calls().is_empty());
    }

    #[tokio::test]
    async fn generic_rendered_runs_against_one_page_load() {
        let url = "https://example.com/careers";
        let renderer = MockRenderer::new().with_page(
            url,
            MockPage::new()
                .with_anchor("https://example.com/careers/1", "Welder")
                .with_block(r#"{"@type":"JobPosting","title":"Welder","url":"https://example.com/careers/1"}"#),
        );
        let (svc, _) = service(MockFetcher::new(), renderer.clone());

        let postings = svc.extract(url, None).await.unwrap();
        assert_eq!(postings.len(), 2);
        assert_eq!(renderer.opened(), 1);
        assert_eq!(renderer.live_sessions(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn repeated_requests_to_same_host_are_spaced() {
        let fetcher = MockFetcher::new().with_page("https://example.com/jobs.rss", "<rss/>");
        let (svc, _) = service(fetcher, MockRenderer::new());

        let start = tokio::time::Instant::now();
        svc.extract("https://example.com/jobs.rss", None).await.unwrap();
        svc.extract("https://example.com/jobs.rss", None).await.unwrap();
        assert!(start.elapsed() >= Duration::from_millis(2000));
    }

    #[tokio::test]
    async fn cancellation_releases_rendering_session() {
        let url = "https://example.com/careers";
        let renderer = MockRenderer::new().with_page(url, MockPage::hanging());
        let (svc, _) = service(MockFetcher::new(), renderer.clone());
        let cancel = CancellationToken::new();

        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            trigger.cancel();
        });

        let err = svc.extract_with_cancel(url, None, &cancel).await.unwrap_err();
        assert!(matches!(err, AppError::Cancelled));
        assert_eq!(renderer.opened(), 1);
        assert_eq!(renderer.live_sessions(), 0);
    }

    #[tokio::test]
    async fn cancellation_aborts_in_flight_fetch() {
        let fetcher = MockFetcher::new().with_hanging("https://example.com/jobs.rss");
        let (svc, _) = service(fetcher.clone(), MockRenderer::new());
        let cancel = CancellationToken::new();

        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            trigger.cancel();
        });

        let result = svc
            .extract_with_cancel("https://example.com/jobs.rss", None, &cancel)
            .await;
        assert!(matches!(result, Err(AppError::Cancelled)));
        assert_eq!(fetcher.calls(), vec![ROBOTS, "https://example.com/jobs.rss"]);
    }

    #[tokio::test]
    async fn usable_as_trait_object() {
        let fetcher = MockFetcher::new().with_page("https://example.com/jobs.rss", "<rss/>");
        let (svc, _) = service(fetcher, MockRenderer::new());
        let extractor: std::sync::Arc<dyn PostingExtractor> = std::sync::Arc::new(svc);

        let postings = extractor
            .extract("https://example.com/jobs.rss", Some("rss"))
            .await
            .unwrap();
        assert!(postings.is_empty());
    }
}
