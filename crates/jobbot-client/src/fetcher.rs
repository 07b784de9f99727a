use std::net::IpAddr;
use std::time::Duration;

use jobbot_core::error::AppError;
use jobbot_core::traits::Fetcher;
use reqwest::Client;
use url::Url;

/// HTTP fetcher using reqwest.
///
/// Sends the configured User-Agent on every request and gives up after a
/// bounded timeout. SSRF protection is **enabled** by default: requests to
/// private/reserved IP ranges are blocked. Use
/// [`allow_private_urls`](Self::allow_private_urls) to disable it (e.g. for
/// CLI usage where the user controls the machine).
#[derive(Clone)]
pub struct ReqwestFetcher {
    client: Client,
    timeout_secs: u64,
    ssrf_protection: bool,
}

impl ReqwestFetcher {
    pub fn new(user_agent: &str) -> Result<Self, AppError> {
        Self::with_timeout(user_agent, Duration::from_secs(15))
    }

    pub fn with_timeout(user_agent: &str, timeout: Duration) -> Result<Self, AppError> {
        let client = Client::builder()
            .user_agent(user_agent)
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::ConfigError(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            timeout_secs: timeout.as_secs().max(1),
            ssrf_protection: true,
        })
    }

    /// Disable SSRF protection, allowing requests to private/reserved IPs.
    pub fn allow_private_urls(mut self) -> Self {
        self.ssrf_protection = false;
        self
    }
}

impl Fetcher for ReqwestFetcher {
    async fn fetch(&self, url: &str) -> Result<String, AppError> {
        self.check_target(url).await?;

        let response = self.client.get(url).send().await.map_err(|e| {
            if e.is_timeout() {
                AppError::Timeout(self.timeout_secs)
            } else if e.is_connect() {
                AppError::NetworkError(format!("Connection failed: {e}"))
            } else {
                AppError::NetworkError(e.to_string())
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::FetchError(format!(
                "HTTP {} for {}",
                status.as_u16(),
                url
            )));
        }

        response.text().await.map_err(|e| {
            if e.is_timeout() {
                AppError::Timeout(self.timeout_secs)
            } else {
                AppError::FetchError(format!("Failed to read response body: {e}"))
            }
        })
    }

    /// Applies the SSRF guard, which also covers pages handed to the renderer.
    async fn check_target(&self, url: &str) -> Result<(), AppError> {
        if self.ssrf_protection {
            validate_url(url).await?;
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// SSRF protection
// ---------------------------------------------------------------------------

/// Validate a URL to prevent server-side request forgery (SSRF).
///
/// 1. Only allow `http` and `https` schemes.
/// 2. Resolve the hostname via DNS.
/// 3. Reject if any resolved IP is private/reserved.
async fn validate_url(url: &str) -> Result<(), AppError> {
    let parsed = Url::parse(url).map_err(|e| AppError::InvalidUrl(format!("{url}: {e}")))?;

    match parsed.scheme() {
        "http" | "https" => {}
        scheme => {
            return Err(AppError::FetchError(format!(
                "URL scheme '{scheme}' is not allowed (only http/https)"
            )));
        }
    }

    let host = parsed
        .host_str()
        .ok_or_else(|| AppError::InvalidUrl(format!("{url}: URL has no host")))?;
    let host = host.trim_start_matches('[').trim_end_matches(']');

    if let Ok(ip) = host.parse::<IpAddr>() {
        if is_private_ip(ip) {
            return Err(AppError::FetchError(format!(
                "SSRF blocked: {host} resolves to private/reserved IP"
            )));
        }
        return Ok(());
    }

    let port = parsed.port_or_known_default().unwrap_or(80);
    let addrs: Vec<_> = tokio::net::lookup_host((host, port))
        .await
        .map_err(|e| AppError::NetworkError(format!("DNS resolution failed for {host}: {e}")))?
        .collect();

    if addrs.is_empty() {
        return Err(AppError::NetworkError(format!(
            "DNS resolution returned no addresses for {host}"
        )));
    }

    if let Some(blocked) = addrs.iter().find(|a| is_private_ip(a.ip())) {
        return Err(AppError::FetchError(format!(
            "SSRF blocked: {host} resolves to private/reserved IP {}",
            blocked.ip()
        )));
    }

    Ok(())
}

/// Check if an IP address is in a private/reserved/link-local range.
fn is_private_ip(ip: IpAddr) -> bool {
    match ip {
        IpAddr::V4(v4) => {
            v4.is_loopback()
                || v4.is_private()
                || v4.is_link_local() // 169.254.0.0/16, cloud metadata
                || v4.is_unspecified()
                || v4.is_broadcast()
                || v4.is_documentation()
                || v4.octets()[0] == 100 && (v4.octets()[1] & 0xC0) == 64 // 100.64.0.0/10
        }
        IpAddr::V6(v6) => {
            v6.is_loopback()
                || v6.is_unspecified()
                || (v6.segments()[0] & 0xFFC0) == 0xFE80 // fe80::/10
                || (v6.segments()[0] & 0xFE00) == 0xFC00 // fc00::/7
                || v6
                    .to_ipv4_mapped()
                    .is_some_and(|v4| is_private_ip(IpAddr::V4(v4)))
        }
    }
}
