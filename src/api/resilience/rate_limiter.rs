//! Token bucket rate limiter
//!
//! Tag Manager enforces a small per-user request quota, so the client paces
//! itself before every call instead of leaning on 429 retries alone.

use super::config::RateLimitConfig;
use log::{debug, warn};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};
use tokio::time::sleep;

/// Token bucket rate limiter for controlling API request rates
#[derive(Debug, Clone)]
pub struct RateLimiter {
    inner: Arc<Mutex<Bucket>>,
    config: RateLimitConfig,
}

#[derive(Debug)]
struct Bucket {
    tokens: f64,
    last_refill: Instant,
    requests_made: u64,
    requests_delayed: u64,
}

impl RateLimiter {
    /// A zero rate or burst would never yield a token; both are raised to 1.
    pub fn new(mut config: RateLimitConfig) -> Self {
        if config.enabled && (config.requests_per_minute == 0 || config.burst_capacity == 0) {
            warn!(
                "Rate limit of {} rpm with burst {} can never admit a request, using at least 1",
                config.requests_per_minute, config.burst_capacity
            );
        }
        config.requests_per_minute = config.requests_per_minute.max(1);
        config.burst_capacity = config.burst_capacity.max(1);

        Self {
            inner: Arc::new(Mutex::new(Bucket {
                tokens: config.burst_capacity as f64,
                last_refill: Instant::now(),
                requests_made: 0,
                requests_delayed: 0,
            })),
            config,
        }
    }

    /// Wait until a token is available, then take it
    pub async fn acquire(&self) {
        if !self.config.enabled {
            return;
        }

        let mut delayed = false;
        loop {
            if self.try_take() {
                return;
            }
            if !delayed {
                delayed = true;
                self.bucket().requests_delayed += 1;
            }

            let wait = self.token_interval();
            debug!("Rate limiter: waiting {:?} for next token", wait);
            sleep(wait).await;
        }
    }

    /// Take a token without waiting; false when the bucket is empty
    pub fn try_acquire(&self) -> bool {
        if !self.config.enabled || self.try_take() {
            return true;
        }
        self.bucket().requests_delayed += 1;
        false
    }

    pub fn stats(&self) -> RateLimiterStats {
        let bucket = self.bucket();
        RateLimiterStats {
            tokens_available: bucket.tokens,
            requests_made: bucket.requests_made,
            requests_delayed: bucket.requests_delayed,
            enabled: self.config.enabled,
        }
    }

    fn try_take(&self) -> bool {
        let mut bucket = self.bucket();
        self.refill(&mut bucket);

        if bucket.tokens >= 1.0 {
            bucket.tokens -= 1.0;
            bucket.requests_made += 1;
            true
        } else {
            false
        }
    }

    fn bucket(&self) -> MutexGuard<'_, Bucket> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn refill(&self, bucket: &mut Bucket) {
        let now = Instant::now();
        let elapsed = now.duration_since(bucket.last_refill).as_secs_f64();
        let tokens_per_second = self.config.requests_per_minute as f64 / 60.0;
        let added = elapsed * tokens_per_second;

        if added > 0.0 {
            bucket.tokens = (bucket.tokens + added).min(self.config.burst_capacity as f64);
            bucket.last_refill = now;
        }
    }

    fn token_interval(&self) -> Duration {
        Duration::from_secs_f64(60.0 / self.config.requests_per_minute as f64)
    }
}

/// Rate limiter statistics
#[derive(Debug, Clone)]
pub struct RateLimiterStats {
    pub tokens_available: f64,
    pub requests_made: u64,
    pub requests_delayed: u64,
    pub enabled: bool,
}
