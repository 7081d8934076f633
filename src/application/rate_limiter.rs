//! Fixed-window rate limiter keyed by client address.
//!
//! Each key owns one window `{count, window_start}`. A request that arrives at
//! or after `window_start + period` starts a fresh window; otherwise it is
//! counted against the current one. Bursts straddling a window boundary can
//! therefore admit up to `2 * limit` requests.
//!
//! Windows live in a [`DashMap`]; the read-modify-write on a key happens under
//! that key's entry lock, so concurrent requests from one client are counted
//! exactly and different clients only contend on shard locks.

use chrono::{DateTime, TimeDelta, Utc};
use dashmap::DashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;

/// Outcome of a single [`RateLimiter::check`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitDecision {
    pub allowed: bool,
    pub limit: u32,
    pub remaining: u32,
    /// Unix timestamp (seconds) at which the current window ends.
    pub reset_at: i64,
}

#[derive(Debug, Clone, Copy)]
struct Window {
    count: u32,
    window_start: DateTime<Utc>,
}

#[derive(Debug)]
pub struct RateLimiter {
    windows: DashMap<String, Window>,
    limit: u32,
    period: TimeDelta,
}

impl RateLimiter {
    /// Creates a limiter admitting `limit` requests per `period` for each key.
    pub fn new(limit: u32, period: Duration) -> Self {
        Self {
            windows: DashMap::new(),
            limit,
            period: TimeDelta::from_std(period).unwrap_or_else(|_| TimeDelta::seconds(60)),
        }
    }

    /// Counts one request for `key` against the current clock.
    pub fn check(&self, key: &str) -> RateLimitDecision {
        self.check_at(key, Utc::now())
    }

    /// Counts one request for `key` as if it arrived at `now`.
    pub fn check_at(&self, key: &str, now: DateTime<Utc>) -> RateLimitDecision {
        let mut window = self.windows.entry(key.to_owned()).or_insert(Window {
            count: 0,
            window_start: now,
        });

        let window_end = window.window_start + self.period;
        if now >= window_end {
            window.count = 0;
            window.window_start = now;
        }

        window.count = window.count.saturating_add(1);

        RateLimitDecision {
            allowed: window.count <= self.limit,
            limit: self.limit,
            remaining: self.limit.saturating_sub(window.count),
            reset_at: (window.window_start + self.period).timestamp(),
        }
    }

    /// Drops windows that have been idle for at least one full period.
    ///
    /// Returns the number of evicted keys.
    pub fn purge_idle(&self, now: DateTime<Utc>) -> usize {
        let before = self.windows.len();
        let period = self.period;
        self.windows
            .retain(|_, window| now < window.window_start + period);
        before.saturating_sub(self.windows.len())
    }

    /// Number of keys currently holding a window.
    pub fn tracked_keys(&self) -> usize {
        self.windows.len()
    }

    /// Spawns a background task that calls [`purge_idle`](Self::purge_idle)
    /// once per period.
    pub fn spawn_sweeper(self: Arc<Self>) -> JoinHandle<()> {
        let every = self.period.to_std().unwrap_or(Duration::from_secs(60));
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(every);
            // The first tick completes immediately.
            interval.tick().await;
            loop {
                interval.tick().await;
                let evicted = self.purge_idle(Utc::now());
                if evicted > 0 {
                    tracing::debug!(
                        evicted,
                        remaining = self.tracked_keys(),
                        "rate limit windows purged"
                    );
                }
            }
        })
    }
}
