use std::{
    net::SocketAddr,
    sync::Arc,
    time::{Duration, Instant},
};

use dashmap::DashMap;

/// Fixed-window limiter keyed by client IP.
#[derive(Clone)]
pub struct RateLimiter {
    buckets: Arc<DashMap<String, Window>>,
    requests_per_window: u32,
    window_duration: Duration,
}

#[derive(Debug)]
struct Window {
    started: Instant,
    request_count: u32,
}

impl RateLimiter {
    pub fn new(requests_per_window: u32, window_duration: Duration) -> Self {
        Self {
            buckets: Arc::new(DashMap::new()),
            requests_per_window,
            window_duration,
        }
    }

    pub fn per_minute(requests_per_minute: u32) -> Self {
        Self::new(requests_per_minute, Duration::from_secs(60))
    }

    pub fn get_client_key(&self, addr: &SocketAddr) -> String {
        addr.ip().to_string()
    }

    pub fn check_rate_limit(&self, client_key: &str) -> bool {
        let now = Instant::now();

        let mut entry = self
            .buckets
            .entry(client_key.to_string())
            .or_insert(Window {
                started: now,
                request_count: 0,
            });

        if now.duration_since(entry.started) >= self.window_duration {
            entry.started = now;
            entry.request_count = 0;
        }

        if entry.request_count >= self.requests_per_window {
            return false;
        }

        entry.request_count += 1;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_after_budget_spent() {
        let limiter = RateLimiter::per_minute(2);

        assert!(limiter.check_rate_limit("10.0.0.1"));
        assert!(limiter.check_rate_limit("10.0.0.1"));
        assert!(!limiter.check_rate_limit("10.0.0.1"));
        assert!(limiter.check_rate_limit("10.0.0.2"));
    }

    #[test]
    fn test_window_resets() {
        let limiter = RateLimiter::new(1, Duration::from_millis(0));

        assert!(limiter.check_rate_limit("10.0.0.1"));
        assert!(limiter.check_rate_limit("10.0.0.1"));
    }
}
