//! Proactive rate limiting for webhook deliveries
//!
//! Chat webhooks typically allow a fixed number of posts per minute and
//! answer 429 beyond that. Deliveries are never retried, so the notifier
//! waits for a token *before* posting instead of reacting to 429s.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use grouptrack_notify::rate_limit::TokenBucket;
//!
//! # async fn example() {
//! let bucket = TokenBucket::per_minute(30);
//! bucket.acquire().await;
//! // ... post the notification ...
//! # }
//! ```

use std::sync::Mutex;
use std::time::Duration;

use tokio::time::Instant;
use tracing::debug;

/// Internal mutable state for the token bucket, protected by a Mutex.
#[derive(Debug)]
struct TokenBucketInner {
    /// Current number of available tokens (fractional for smooth refill)
    tokens: f64,
    /// Timestamp of the last refill calculation
    last_refill: Instant,
}

/// Token bucket rate limiter
///
/// Tokens are consumed on each delivery and refilled at a constant rate.
/// When no tokens are available, callers wait for refill.
#[derive(Debug)]
pub struct TokenBucket {
    /// Maximum number of tokens in the bucket
    capacity: u32,
    /// Rate at which tokens are added (tokens per second)
    refill_rate: f64,
    inner: Mutex<TokenBucketInner>,
}

impl TokenBucket {
    /// Creates a new `TokenBucket`; the bucket starts full
    pub fn new(capacity: u32, refill_rate: f64) -> Self {
        Self {
            capacity,
            refill_rate,
            inner: Mutex::new(TokenBucketInner {
                tokens: capacity as f64,
                last_refill: Instant::now(),
            }),
        }
    }

    /// Bucket allowing `requests` deliveries per minute with bursts up to `requests`
    pub fn per_minute(requests: u32) -> Self {
        let requests = requests.max(1);
        Self::new(requests, requests as f64 / 60.0)
    }

    fn refill(inner: &mut TokenBucketInner, refill_rate: f64, capacity: u32) {
        let now = Instant::now();
        let elapsed_secs = now.duration_since(inner.last_refill).as_secs_f64();

        if elapsed_secs > 0.0 {
            inner.tokens = (inner.tokens + elapsed_secs * refill_rate).min(capacity as f64);
            inner.last_refill = now;
        }
    }

    /// Attempts to take a single token without waiting
    pub fn try_acquire(&self) -> bool {
        let mut inner = self.inner.lock().unwrap();
        Self::refill(&mut inner, self.refill_rate, self.capacity);

        if inner.tokens >= 1.0 {
            inner.tokens -= 1.0;
            true
        } else {
            false
        }
    }

    /// Estimated time until a token becomes available
    pub fn time_until_available(&self) -> Duration {
        let mut inner = self.inner.lock().unwrap();
        Self::refill(&mut inner, self.refill_rate, self.capacity);

        if inner.tokens >= 1.0 {
            Duration::ZERO
        } else {
            Duration::from_secs_f64((1.0 - inner.tokens) / self.refill_rate)
        }
    }

    /// Waits until a token is available and takes it
    pub async fn acquire(&self) {
        loop {
            if self.try_acquire() {
                return;
            }

            let wait = self.time_until_available().max(Duration::from_millis(10));
            debug!(wait_ms = wait.as_millis() as u64, "Delivery throttled, waiting for token");
            tokio::time::sleep(wait).await;
        }
    }

    pub fn capacity(&self) -> u32 {
        self.capacity
    }
}

/// Parses a `Retry-After` header value given in (possibly fractional) seconds
pub fn parse_retry_after(value: &str) -> Option<f64> {
    value
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|secs| secs.is_finite() && *secs >= 0.0)
}
