//! Sliding-window limiter for search requests

use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;

pub const DEFAULT_MAX_REQUESTS: usize = 30;

/// Allows `max_requests` per key within any `window`.
pub struct RateLimiter {
    max_requests: usize,
    window: Duration,
    requests: DashMap<String, Vec<DateTime<Utc>>>,
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_REQUESTS, Duration::seconds(60))
    }
}

impl RateLimiter {
    pub fn new(max_requests: usize, window: Duration) -> Self {
        Self {
            max_requests,
            window,
            requests: DashMap::new(),
        }
    }

    /// Record a request at `now` unless the key is over its budget.
    ///
    /// Returns true when the request is refused; refused requests are not
    /// counted.
    pub fn is_rate_limited(&self, key: &str, now: DateTime<Utc>) -> bool {
        let mut stamps = self.requests.entry(key.to_string()).or_default();
        stamps.retain(|t| now - *t < self.window);
        if stamps.len() >= self.max_requests {
            return true;
        }
        stamps.push(now);
        false
    }

    pub fn remaining(&self, key: &str, now: DateTime<Utc>) -> usize {
        let used = self
            .requests
            .get(key)
            .map(|stamps| stamps.iter().filter(|t| now - **t < self.window).count())
            .unwrap_or(0);
        self.max_requests.saturating_sub(used)
    }
}
