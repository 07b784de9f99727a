use std::sync::Arc;

use anyhow::Context;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use jobbot_client::ReqwestFetcher;
use jobbot_core::{ExtractionService, HostThrottle, PostingExtractor, ScraperConfig};
use jobbot_server::routes;
use jobbot_server::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("jobbot=info".parse()?))
        .with_target(false)
        .init();

    let config = ScraperConfig::from_env()?;
    let port = std::env::var("JOBBOT_SERVER_PORT").unwrap_or_else(|_| "4000".to_string());
    let allow_private = std::env::var("JOBBOT_ALLOW_PRIVATE_URLS")
        .map(|v| matches!(v.trim(), "1" | "true" | "yes"))
        .unwrap_or(false);
    let addr = format!("0.0.0.0:{port}");

    let mut fetcher = ReqwestFetcher::with_timeout(&config.user_agent, config.fetch_timeout)?;
    let mut policy_fetcher =
        ReqwestFetcher::with_timeout(&config.user_agent, config.policy_timeout)?;
    if allow_private {
        tracing::warn!("SSRF protection disabled (JOBBOT_ALLOW_PRIVATE_URLS)");
        fetcher = fetcher.allow_private_urls();
        policy_fetcher = policy_fetcher.allow_private_urls();
    }

    let throttle = HostThrottle::new(config.throttle());
    let extractor = build_extractor(fetcher, policy_fetcher, throttle, &config).await?;
    let state = Arc::new(AppState { extractor });

    let app = routes::router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    tracing::info!(user_agent = %config.user_agent, "Starting server on {addr}");
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

#[cfg(feature = "browser")]
async fn build_extractor(
    fetcher: ReqwestFetcher,
    policy_fetcher: ReqwestFetcher,
    throttle: HostThrottle,
    config: &ScraperConfig,
) -> anyhow::Result<Arc<dyn PostingExtractor>> {
    let renderer =
        jobbot_client::BrowserRenderer::launch_with_timeout(&config.user_agent, config.render_timeout)
            .await?;
    Ok(Arc::new(ExtractionService::new(
        fetcher,
        policy_fetcher,
        renderer,
        throttle,
        config,
    )))
}

#[cfg(not(feature = "browser"))]
async fn build_extractor(
    fetcher: ReqwestFetcher,
    policy_fetcher: ReqwestFetcher,
    throttle: HostThrottle,
    config: &ScraperConfig,
) -> anyhow::Result<Arc<dyn PostingExtractor>> {
    tracing::warn!("Built without the `browser` feature; rendered strategies will fail");
    Ok(Arc::new(ExtractionService::new(
        fetcher,
        policy_fetcher,
        jobbot_core::NullRenderer,
        throttle,
        config,
    )))
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to install CTRL+C handler");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
