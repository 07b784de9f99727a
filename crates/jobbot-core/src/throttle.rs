//! Per-host access spacing shared by every extraction request.
//!
//! One [`HostThrottle`] is created at process start and handed (cloned) to
//! every request. Each call to [`HostThrottle::await_turn`] reserves the next
//! free slot for its host and sleeps until that slot, so two callers for the
//! same host are always at least `min_delay` apart no matter how they race.
//!
//! # Example
//!
//! ```rust,no_run
//! use std::time::Duration;
//! use jobbot_core::throttle::{HostThrottle, ThrottleConfig};
//!
//! # async fn run() {
//! let throttle = HostThrottle::new(ThrottleConfig::new(Duration::from_secs(2)));
//! throttle.await_turn("boards.greenhouse.io").await;
//! // ... first request to the host ...
//! throttle.await_turn("boards.greenhouse.io").await; // returns ~2s later
//! # }
//! ```

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::time::Instant;
use url::Url;

/// Configuration for the host throttle.
#[derive(Debug, Clone)]
pub struct ThrottleConfig {
    /// Minimum gap between two granted turns for the same host.
    pub min_delay: Duration,

    /// Maximum random jitter added on top of `min_delay` (uniform [0, jitter]).
    pub jitter: Duration,

    /// Once this many hosts are tracked, stale entries are evicted.
    pub max_hosts: usize,
}

impl ThrottleConfig {
    /// Create a new config with the given per-host delay and no jitter.
    pub fn new(min_delay: Duration) -> Self {
        Self {
            min_delay,
            jitter: Duration::ZERO,
            max_hosts: 10_000,
        }
    }

    /// Add random jitter (uniform [0, jitter]) on top of the base delay.
    pub fn with_jitter(mut self, jitter: Duration) -> Self {
        self.jitter = jitter;
        self
    }

    pub fn with_max_hosts(mut self, max_hosts: usize) -> Self {
        self.max_hosts = max_hosts.max(1);
        self
    }

    /// Spacing for a single reservation (delay + random jitter).
    fn effective_delay(&self) -> Duration {
        if self.jitter.is_zero() {
            return self.min_delay;
        }
        self.min_delay + Duration::from_millis(rand_jitter_ms(self.jitter.as_millis() as u64))
    }

    /// Longest spacing any reservation can ask for.
    fn max_delay(&self) -> Duration {
        self.min_delay + self.jitter
    }
}

impl Default for ThrottleConfig {
    /// 2 seconds between accesses to the same host, no jitter.
    fn default() -> Self {
        Self::new(Duration::from_millis(2000))
    }
}

/// Process-wide per-host throttle.
///
/// Cheap to clone; all clones share the same host table.
#[derive(Clone)]
pub struct HostThrottle {
    config: ThrottleConfig,
    /// Last granted slot per host key.
    slots: Arc<Mutex<HashMap<String, Instant>>>,
}

impl HostThrottle {
    pub fn new(config: ThrottleConfig) -> Self {
        Self {
            config,
            slots: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Host key for a URL: lowercase `host[:port]`.
    pub fn host_key(url: &Url) -> Option<String> {
        let host = url.host_str()?.to_ascii_lowercase();
        Some(match url.port() {
            Some(port) => format!("{host}:{port}"),
            None => host,
        })
    }

    /// Suspend until this caller may access `host`. Never fails.
    pub async fn await_turn(&self, host: &str) {
        let now = Instant::now();
        let slot = self.reserve(host, now);
        if slot > now {
            tracing::debug!(
                host = %host,
                wait_ms = %(slot - now).as_millis(),
                "Throttling request"
            );
            tokio::time::sleep_until(slot).await;
        }
    }

    /// Atomically claim the next slot for `host`: `max(now, last + delay)`.
    ///
    /// The lock is held only for this read-modify-write, never across a sleep.
    fn reserve(&self, host: &str, now: Instant) -> Instant {
        let mut slots = self.slots.lock().unwrap_or_else(|e| e.into_inner());

        let slot = match slots.get(host) {
            Some(&last) => std::cmp::max(now, last + self.config.effective_delay()),
            None => now,
        };
        slots.insert(host.to_string(), slot);

        if slots.len() > self.config.max_hosts {
            // An entry older than the largest delay can no longer hold anyone back.
            let horizon = self.config.max_delay();
            slots.retain(|_, &mut last| last + horizon > now);
        }

        slot
    }

    /// Last slot granted to `host`, if it is still tracked.
    pub fn last_granted(&self, host: &str) -> Option<Instant> {
        let slots = self.slots.lock().unwrap_or_else(|e| e.into_inner());
        slots.get(host).copied()
    }

    /// Number of hosts currently tracked.
    pub fn tracked_hosts(&self) -> usize {
        self.slots.lock().unwrap_or_else(|e| e.into_inner()).len()
    }
}

// Jitter only needs to be unpredictable enough to spread requests out;
// a time-seeded xorshift is sufficient.
fn rand_jitter_ms(max_ms: u64) -> u64 {
    if max_ms == 0 {
        return 0;
    }
    let mut x = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos() as u64
        | 1;
    x ^= x << 13;
    x ^= x >> 7;
    x ^= x << 17;
    x % max_ms
}
