//! Sliding-window limiter for outbound provider requests.
//!
//! The window is the trailing 60 seconds; timestamps older than that are
//! pruned on every check. The limit applies to provider calls, not to
//! inbound HTTP requests, so cache hits never consume budget.

use serde::Serialize;
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use utoipa::ToSchema;

#[derive(Clone)]
pub struct RateLimiter {
    limit: u32,
    window: Duration,
    hits: Arc<RwLock<VecDeque<Instant>>>,
}

/// Budget snapshot exposed at `/rate-limit`.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct RateLimitStats {
    pub limit: u32,
    pub used: u32,
    pub remaining: u32,
    /// Seconds until the oldest in-window request ages out.
    pub reset_in_secs: u64,
}

impl RateLimiter {
    pub fn new(requests_per_minute: u32) -> Self {
        Self {
            limit: requests_per_minute,
            window: Duration::from_secs(60),
            hits: Arc::new(RwLock::new(VecDeque::new())),
        }
    }

    /// Record a request if budget remains. Returns false once the window
    /// is full.
    pub async fn check_and_record(&self) -> bool {
        let now = Instant::now();
        let mut hits = self.hits.write().await;
        Self::prune(&mut hits, now, self.window);

        if hits.len() < self.limit as usize {
            hits.push_back(now);
            true
        } else {
            metrics::counter!("provider_rate_limited_total").increment(1);
            false
        }
    }

    pub async fn stats(&self) -> RateLimitStats {
        let now = Instant::now();
        let mut hits = self.hits.write().await;
        Self::prune(&mut hits, now, self.window);

        let used = hits.len() as u32;
        let reset_in_secs = hits
            .front()
            .map(|oldest| self.window.saturating_sub(now - *oldest).as_secs())
            .unwrap_or(0);

        RateLimitStats {
            limit: self.limit,
            used,
            remaining: self.limit.saturating_sub(used),
            reset_in_secs,
        }
    }

    fn prune(hits: &mut VecDeque<Instant>, now: Instant, window: Duration) {
        while hits.front().is_some_and(|t| now - *t >= window) {
            hits.pop_front();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_allows_up_to_limit_then_denies() {
        let limiter = RateLimiter::new(3);
        for _ in 0..3 {
            assert!(limiter.check_and_record().await);
        }
        assert!(!limiter.check_and_record().await);
    }

    #[tokio::test]
    async fn test_stats_track_usage() {
        let limiter = RateLimiter::new(10);
        for _ in 0..4 {
            limiter.check_and_record().await;
        }
        let stats = limiter.stats().await;
        assert_eq!(stats.limit, 10);
        assert_eq!(stats.used, 4);
        assert_eq!(stats.remaining, 6);
        assert!(stats.reset_in_secs <= 60);
    }

    #[tokio::test]
    async fn test_empty_window_resets_immediately() {
        let limiter = RateLimiter::new(5);
        let stats = limiter.stats().await;
        assert_eq!(stats.used, 0);
        assert_eq!(stats.reset_in_secs, 0);
    }
}
