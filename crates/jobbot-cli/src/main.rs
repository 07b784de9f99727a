use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

use jobbot_client::ReqwestFetcher;
use jobbot_core::{Dispatcher, ExtractionService, HostThrottle, Renderer, ScraperConfig};

#[derive(Parser)]
#[command(name = "jobbot", version, about = "Polite job-posting extractor")]
struct Cli {
    /// User-Agent sent with every request and matched against robots.txt
    #[arg(long, global = true, env = "JOBBOT_USER_AGENT")]
    user_agent: Option<String>,

    /// Minimum delay between two requests to the same host, in milliseconds
    #[arg(long, global = true, env = "JOBBOT_MIN_DELAY_MS")]
    min_delay_ms: Option<u64>,

    /// Timeout for fetching feeds and API payloads, in seconds
    #[arg(long, global = true, env = "JOBBOT_FETCH_TIMEOUT_SECS")]
    fetch_timeout_secs: Option<u64>,

    /// Allow requests to private/reserved IP ranges
    #[arg(
        long,
        global = true,
        env = "JOBBOT_ALLOW_PRIVATE_URLS",
        value_parser = clap::builder::BoolishValueParser::new()
    )]
    allow_private_urls: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract job postings from a page, feed, or API endpoint
    Scrape {
        /// Target URL
        #[arg(short, long)]
        url: String,

        /// Strategy hint (rss, links, api, jsonld, ...)
        #[arg(short = 't', long = "type")]
        kind: Option<String>,
    },

    /// Show which extraction strategy a URL would use
    Classify {
        /// Target URL
        #[arg(short, long)]
        url: String,

        /// Strategy hint (rss, links, api, jsonld, ...)
        #[arg(short = 't', long = "type")]
        kind: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    // Logs go to stderr so stdout stays valid JSON
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("jobbot=info".parse()?))
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = cli.scraper_config()?;

    match cli.command {
        Commands::Scrape { ref url, ref kind } => {
            cmd_scrape(url, kind.as_deref(), &config, cli.allow_private_urls).await?;
        }
        Commands::Classify { ref url, ref kind } => {
            println!("{}", Dispatcher::default().classify(url, kind.as_deref()));
        }
    }

    Ok(())
}

impl Cli {
    /// Environment configuration with command-line overrides applied.
    fn scraper_config(&self) -> Result<ScraperConfig> {
        let mut config = ScraperConfig::from_env()?;
        if let Some(ua) = self.user_agent.as_deref().map(str::trim) {
            anyhow::ensure!(!ua.is_empty(), "--user-agent must not be empty");
            config.user_agent = ua.to_string();
        }
        if let Some(ms) = self.min_delay_ms {
            config.min_delay = Duration::from_millis(ms);
        }
        if let Some(secs) = self.fetch_timeout_secs {
            anyhow::ensure!(secs > 0, "--fetch-timeout-secs must be at least 1");
            config.fetch_timeout = Duration::from_secs(secs);
        }
        Ok(config)
    }
}

async fn cmd_scrape(
    url: &str,
    hint: Option<&str>,
    config: &ScraperConfig,
    allow_private_urls: bool,
) -> Result<()> {
    let mut fetcher = ReqwestFetcher::with_timeout(&config.user_agent, config.fetch_timeout)
        .context("Failed to create HTTP client")?;
    let mut policy_fetcher =
        ReqwestFetcher::with_timeout(&config.user_agent, config.policy_timeout)
            .context("Failed to create HTTP client")?;
    if allow_private_urls {
        fetcher = fetcher.allow_private_urls();
        policy_fetcher = policy_fetcher.allow_private_urls();
    }

    #[cfg(feature = "browser")]
    let renderer = jobbot_client::BrowserRenderer::launch_with_timeout(
        &config.user_agent,
        config.render_timeout,
    )
    .await
    .context("Failed to launch headless browser")?;
    #[cfg(not(feature = "browser"))]
    let renderer = jobbot_core::NullRenderer;

    run_scrape(url, hint, config, fetcher, policy_fetcher, renderer).await
}

async fn run_scrape<R: Renderer>(
    url: &str,
    hint: Option<&str>,
    config: &ScraperConfig,
    fetcher: ReqwestFetcher,
    policy_fetcher: ReqwestFetcher,
    renderer: R,
) -> Result<()> {
    let throttle = HostThrottle::new(config.throttle());
    let service = ExtractionService::new(fetcher, policy_fetcher, renderer, throttle, config);

    let cancel = CancellationToken::new();
    let on_signal = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Interrupted, cancelling");
            on_signal.cancel();
        }
    });

    tracing::info!(
        %url,
        strategy = %service.dispatcher().classify(url, hint),
        "Scraping"
    );
    let postings = service.extract_with_cancel(url, hint, &cancel).await?;
    tracing::info!(count = postings.len(), "Done");

    println!("{}", serde_json::to_string_pretty(&postings)?);
    Ok(())
}
