use std::str::FromStr;
use std::time::Duration;

use crate::error::AppError;
use crate::throttle::ThrottleConfig;

/// Identifying user agent sent with every request and matched against robots.txt.
pub const DEFAULT_USER_AGENT: &str = "JobBot-Scraper/1.0";

/// Runtime settings for the extraction pipeline.
#[derive(Debug, Clone)]
pub struct ScraperConfig {
    pub user_agent: String,
    /// Minimum spacing between two accesses to the same host.
    pub min_delay: Duration,
    /// Extra random delay on top of `min_delay` (zero disables).
    pub jitter: Duration,
    pub policy_timeout: Duration,
    pub fetch_timeout: Duration,
    pub render_timeout: Duration,
    /// Cache robots.txt per origin for this long. `None` re-fetches every request.
    pub policy_cache_ttl: Option<Duration>,
    /// Soft cap on the number of hosts the throttle remembers.
    pub max_tracked_hosts: usize,
}

impl Default for ScraperConfig {
    fn default() -> Self {
        Self {
            user_agent: DEFAULT_USER_AGENT.to_string(),
            min_delay: Duration::from_millis(2000),
            jitter: Duration::ZERO,
            policy_timeout: Duration::from_secs(5),
            fetch_timeout: Duration::from_secs(15),
            render_timeout: Duration::from_secs(30),
            policy_cache_ttl: None,
            max_tracked_hosts: 10_000,
        }
    }
}

impl ScraperConfig {
    /// Read configuration from environment variables, falling back to defaults.
    ///
    /// - `JOBBOT_USER_AGENT`
    /// - `JOBBOT_MIN_DELAY_MS`, `JOBBOT_JITTER_MS`
    /// - `JOBBOT_POLICY_TIMEOUT_SECS`, `JOBBOT_FETCH_TIMEOUT_SECS`, `JOBBOT_RENDER_TIMEOUT_SECS`
    /// - `JOBBOT_POLICY_CACHE_TTL_SECS` (unset disables the cache)
    /// - `JOBBOT_MAX_TRACKED_HOSTS`
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, AppError> {
        let defaults = Self::default();

        let user_agent = match lookup("JOBBOT_USER_AGENT") {
            Some(ua) if ua.trim().is_empty() => {
                return Err(AppError::ConfigError(
                    "JOBBOT_USER_AGENT must not be empty".into(),
                ));
            }
            Some(ua) => ua.trim().to_string(),
            None => defaults.user_agent,
        };

        let millis = |key: &str, default: Duration| -> Result<Duration, AppError> {
            Ok(parse_var::<u64>(&lookup, key)?
                .map(Duration::from_millis)
                .unwrap_or(default))
        };
        let secs = |key: &str, default: Duration| -> Result<Duration, AppError> {
            Ok(parse_var::<u64>(&lookup, key)?
                .map(Duration::from_secs)
                .unwrap_or(default))
        };

        let policy_timeout = secs("JOBBOT_POLICY_TIMEOUT_SECS", defaults.policy_timeout)?;
        let fetch_timeout = secs("JOBBOT_FETCH_TIMEOUT_SECS", defaults.fetch_timeout)?;
        let render_timeout = secs("JOBBOT_RENDER_TIMEOUT_SECS", defaults.render_timeout)?;
        for (key, value) in [
            ("JOBBOT_POLICY_TIMEOUT_SECS", policy_timeout),
            ("JOBBOT_FETCH_TIMEOUT_SECS", fetch_timeout),
            ("JOBBOT_RENDER_TIMEOUT_SECS", render_timeout),
        ] {
            if value.is_zero() {
                return Err(AppError::ConfigError(format!("{key} must be at least 1")));
            }
        }

        let max_tracked_hosts = parse_var::<usize>(&lookup, "JOBBOT_MAX_TRACKED_HOSTS")?
            .unwrap_or(defaults.max_tracked_hosts);
        if max_tracked_hosts == 0 {
            return Err(AppError::ConfigError(
                "JOBBOT_MAX_TRACKED_HOSTS must be at least 1".into(),
            ));
        }

        Ok(Self {
            user_agent,
            min_delay: millis("JOBBOT_MIN_DELAY_MS", defaults.min_delay)?,
            jitter: millis("JOBBOT_JITTER_MS", defaults.jitter)?,
            policy_timeout,
            fetch_timeout,
            render_timeout,
            policy_cache_ttl: parse_var::<u64>(&lookup, "JOBBOT_POLICY_CACHE_TTL_SECS")?
                .filter(|&s| s > 0)
                .map(Duration::from_secs),
            max_tracked_hosts,
        })
    }

    /// Throttle settings derived from this config.
    pub fn throttle(&self) -> ThrottleConfig {
        ThrottleConfig::new(self.min_delay)
            .with_jitter(self.jitter)
            .with_max_hosts(self.max_tracked_hosts)
    }
}

fn parse_var<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
) -> Result<Option<T>, AppError> {
    match lookup(key) {
        None => Ok(None),
        Some(raw) => raw.trim().parse().map(Some).map_err(|_| {
            AppError::ConfigError(format!(
                "Invalid {key} '{raw}': must be a non-negative integer"
            ))
        }),
    }
}
