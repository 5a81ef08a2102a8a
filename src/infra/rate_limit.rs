//! Sliding-window rate limiting.
//!
//! [`RateLimiter`] is injected wherever requests or outbound e-mails are
//! throttled. The Redis-backed [`Cache`](super::Cache) shares counters
//! between instances; [`InMemoryRateLimiter`] is per-process and forgets
//! everything on restart.

use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use tokio::time::{Duration, Instant};

use crate::errors::{AppError, AppResult};

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

/// Hits between sweeps of idle keys.
const SWEEP_INTERVAL: u64 = 1024;

#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait RateLimiter: Send + Sync {
    /// Record one hit for `key` and return `(hits in window, allowed)`.
    ///
    /// Rejected hits are not recorded.
    async fn hit(&self, key: &str, max: u64, window_seconds: u64) -> AppResult<(u64, bool)>;

    /// Backend name reported by the health check.
    fn backend(&self) -> &'static str;

    async fn is_healthy(&self) -> bool {
        true
    }
}

/// Hits for one key, pruned against the window that key was last hit with.
struct KeyWindow {
    window: Duration,
    hits: VecDeque<Instant>,
}

impl KeyWindow {
    fn prune(&mut self, now: Instant) {
        while let Some(oldest) = self.hits.front() {
            if now.duration_since(*oldest) >= self.window {
                self.hits.pop_front();
            } else {
                break;
            }
        }
    }
}

#[derive(Default)]
struct Windows {
    keys: HashMap<String, KeyWindow>,
    since_sweep: u64,
}

/// Per-key deque of hit instants.
#[derive(Default)]
pub struct InMemoryRateLimiter {
    windows: Mutex<Windows>,
}

impl InMemoryRateLimiter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of keys currently tracked.
    pub fn tracked_keys(&self) -> usize {
        self.windows.lock().map(|w| w.keys.len()).unwrap_or(0)
    }
}

#[async_trait]
impl RateLimiter for InMemoryRateLimiter {
    async fn hit(&self, key: &str, max: u64, window_seconds: u64) -> AppResult<(u64, bool)> {
        let now = Instant::now();
        let window = Duration::from_secs(window_seconds);
        let mut windows = self
            .windows
            .lock()
            .map_err(|_| AppError::internal("Rate limiter state poisoned"))?;

        windows.since_sweep += 1;
        if windows.since_sweep >= SWEEP_INTERVAL {
            windows.since_sweep = 0;
            windows.keys.retain(|_, entry| {
                entry.prune(now);
                !entry.hits.is_empty()
            });
        }

        let entry = windows
            .keys
            .entry(key.to_string())
            .or_insert_with(|| KeyWindow {
                window,
                hits: VecDeque::new(),
            });
        entry.window = window;
        entry.prune(now);

        let count = entry.hits.len() as u64;
        if count >= max {
            return Ok((count, false));
        }
        entry.hits.push_back(now);
        Ok((count + 1, true))
    }

    fn backend(&self) -> &'static str {
        "memory"
    }
}
