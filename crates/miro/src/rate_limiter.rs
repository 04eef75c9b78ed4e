//! Token bucket rate limiter and retry wrapper for board API calls.
//!
//! Every outbound request consumes one token; callers await availability
//! instead of failing immediately. The limiter also owns the retry policy for
//! transient failures, so call sites wrap their request in [`RateLimiter::execute`]
//! and get admission control, classified retries, and stats in one place.
//!
//! The bucket is in-process state: a soft, best-effort throttle shared within
//! one worker instance, not a distributed limit.

use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard};
use std::time::{Duration, Instant};

use log::{debug, warn};
use rand::Rng;

use crate::error::{MiroError, RetryClass};

/// Bucket capacity (burst allowance).
const DEFAULT_CAPACITY: f64 = 20.0;

/// Token refill rate per second.
const DEFAULT_REFILL_PER_SEC: f64 = 5.0;

/// Upper bound on a single token-wait sleep.
const MAX_WAIT_SLICE: Duration = Duration::from_millis(200);

/// Window for the rolling request-rate stat.
const STATS_WINDOW: Duration = Duration::from_secs(60);

/// Token bucket state.
///
/// Kept as an explicit struct with pure `refill`/`try_consume` methods so the
/// arithmetic is directly unit-testable.
#[derive(Debug)]
struct TokenBucket {
    /// Current number of available tokens.
    tokens: f64,
    /// Last time the bucket was refilled.
    last_refill: Instant,
    /// Token refill rate (tokens per second).
    rate: f64,
    /// Maximum bucket capacity.
    capacity: f64,
}

impl TokenBucket {
    fn new(capacity: f64, rate: f64) -> Self {
        Self {
            tokens: capacity,
            last_refill: Instant::now(),
            rate,
            capacity,
        }
    }

    /// Refill tokens based on elapsed time.
    fn refill(&mut self) {
        let now = Instant::now();
        let elapsed = now.duration_since(self.last_refill).as_secs_f64();
        self.tokens = (self.tokens + elapsed * self.rate).min(self.capacity);
        self.last_refill = now;
    }

    /// Try to consume one token immediately.
    fn try_consume(&mut self) -> bool {
        self.refill();
        if self.tokens >= 1.0 {
            self.tokens -= 1.0;
            true
        } else {
            false
        }
    }

    /// Time until one token becomes available.
    fn time_until_available(&mut self) -> Duration {
        self.refill();
        if self.tokens >= 1.0 {
            Duration::ZERO
        } else {
            Duration::from_secs_f64((1.0 - self.tokens) / self.rate)
        }
    }
}

/// Retry policy for transient board API failures.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Maximum number of retries after the initial attempt.
    pub max_retries: u32,
    /// Base delay; attempt `n` waits `2^n * base + jitter`.
    pub base_delay: Duration,
    /// Jitter added to each delay, uniformly sampled from `[0, jitter)`.
    pub jitter: Duration,
    /// Cap on any single retry delay.
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay: Duration::from_millis(1000),
            jitter: Duration::from_millis(1000),
            max_delay: Duration::from_secs(30),
        }
    }
}

impl RetryPolicy {
    /// Delay before retry number `attempt` (1-based).
    fn delay_for(&self, attempt: u32) -> Duration {
        let exp = self
            .base_delay
            .saturating_mul(2u32.saturating_pow(attempt));
        let jitter_ms = if self.jitter.is_zero() {
            0
        } else {
            rand::thread_rng().gen_range(0..self.jitter.as_millis() as u64)
        };
        (exp + Duration::from_millis(jitter_ms)).min(self.max_delay)
    }
}

/// Rolling observability counters.
#[derive(Debug)]
struct StatsInner {
    /// Timestamps of requests within the rolling window.
    request_times: VecDeque<Instant>,
    total_requests: u64,
    retries: u64,
    rate_limit_hits: u64,
}

impl StatsInner {
    fn record_request(&mut self) {
        let now = Instant::now();
        self.request_times.push_back(now);
        self.total_requests += 1;
        while let Some(front) = self.request_times.front() {
            if now.duration_since(*front) > STATS_WINDOW {
                self.request_times.pop_front();
            } else {
                break;
            }
        }
    }
}

/// Snapshot of the limiter's rolling stats.
#[derive(Debug, Clone, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RateLimiterStats {
    pub requests_last_minute: usize,
    pub total_requests: u64,
    pub retries: u64,
    pub rate_limit_hits: u64,
    pub available_tokens: f64,
}

/// Token bucket rate limiter with a built-in retry wrapper.
///
/// Explicit service object: construct one per worker (or share via `Arc`),
/// never a process-wide static, so instances can be tested in isolation.
pub struct RateLimiter {
    bucket: Mutex<TokenBucket>,
    stats: Mutex<StatsInner>,
    policy: RetryPolicy,
}

impl RateLimiter {
    /// Create a limiter with the default bucket (capacity 20, 5 tokens/s)
    /// and retry policy.
    pub fn new() -> Self {
        Self::with_config(DEFAULT_CAPACITY, DEFAULT_REFILL_PER_SEC, RetryPolicy::default())
    }

    /// Create a limiter with custom bucket settings and retry policy.
    pub fn with_config(capacity: f64, refill_per_sec: f64, policy: RetryPolicy) -> Self {
        Self {
            bucket: Mutex::new(TokenBucket::new(capacity, refill_per_sec)),
            stats: Mutex::new(StatsInner {
                request_times: VecDeque::new(),
                total_requests: 0,
                retries: 0,
                rate_limit_hits: 0,
            }),
            policy,
        }
    }

    /// Lock the bucket mutex, recovering from poison.
    ///
    /// Worst case after recovery is slightly inaccurate throttling, which
    /// beats panicking the worker.
    fn lock_bucket(&self) -> MutexGuard<'_, TokenBucket> {
        self.bucket.lock().unwrap_or_else(|poisoned| {
            warn!("Rate limiter bucket mutex was poisoned, recovering");
            poisoned.into_inner()
        })
    }

    fn lock_stats(&self) -> MutexGuard<'_, StatsInner> {
        self.stats.lock().unwrap_or_else(|poisoned| {
            warn!("Rate limiter stats mutex was poisoned, recovering");
            poisoned.into_inner()
        })
    }

    /// Acquire one token, waiting (in ≤200ms slices) until available.
    pub async fn acquire(&self) {
        loop {
            let wait = {
                let mut bucket = self.lock_bucket();
                if bucket.try_consume() {
                    self.lock_stats().record_request();
                    return;
                }
                bucket.time_until_available()
            };

            let slice = wait.min(MAX_WAIT_SLICE);
            debug!("Rate limiter: waiting {:?} for a token", slice);
            tokio::time::sleep(slice).await;
        }
    }

    /// Try to consume a token without waiting.
    pub fn try_acquire(&self) -> bool {
        let acquired = self.lock_bucket().try_consume();
        if acquired {
            self.lock_stats().record_request();
        }
        acquired
    }

    /// Remaining tokens in the bucket.
    pub fn remaining_tokens(&self) -> f64 {
        let mut bucket = self.lock_bucket();
        bucket.refill();
        bucket.tokens
    }

    /// Run a board API call under admission control and the retry policy.
    ///
    /// Each attempt consumes a token. Errors classified
    /// [`RetryClass::WithBackoff`] are retried up to `max_retries` times with
    /// exponentially growing, jittered delays; everything else is returned
    /// immediately.
    pub async fn execute<T, F, Fut>(&self, operation: F) -> Result<T, MiroError>
    where
        F: Fn() -> Fut,
        Fut: std::future::Future<Output = Result<T, MiroError>>,
    {
        let mut attempt: u32 = 0;
        loop {
            self.acquire().await;

            match operation().await {
                Ok(value) => return Ok(value),
                Err(err) => {
                    if matches!(err, MiroError::RateLimited { .. }) {
                        self.lock_stats().rate_limit_hits += 1;
                    }

                    if err.retry_class() != RetryClass::WithBackoff
                        || attempt >= self.policy.max_retries
                    {
                        return Err(err);
                    }

                    attempt += 1;
                    self.lock_stats().retries += 1;
                    let delay = self.policy.delay_for(attempt);
                    debug!(
                        "Retrying board API call (attempt {}/{}) after {:?}: {}",
                        attempt, self.policy.max_retries, delay, err
                    );
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }

    /// Snapshot the rolling stats.
    pub fn stats(&self) -> RateLimiterStats {
        let tokens = self.remaining_tokens();
        let mut inner = self.lock_stats();
        // Prune the window against now so an idle limiter decays to zero.
        let now = Instant::now();
        while let Some(front) = inner.request_times.front() {
            if now.duration_since(*front) > STATS_WINDOW {
                inner.request_times.pop_front();
            } else {
                break;
            }
        }
        RateLimiterStats {
            requests_last_minute: inner.request_times.len(),
            total_requests: inner.total_requests,
            retries: inner.retries,
            rate_limit_hits: inner.rate_limit_hits,
            available_tokens: tokens,
        }
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new()
    }
}
