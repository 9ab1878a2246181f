//! Token-bucket limiter for hidden-frame navigations
//!
//! One bucket per host, kept in a bounded LRU so a long session touching
//! many hosts cannot grow without limit. Token arithmetic is fixed-point and
//! lock-free inside a bucket; the LRU itself sits behind an async mutex.

use lru::LruCache;
use std::num::NonZeroUsize;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

/// Scaling factor for fixed-point token arithmetic (1000x precision)
const TOKEN_SCALE: u64 = 1000;

const NANOS_PER_SEC: u64 = 1_000_000_000;

const MAX_TRACKED_HOSTS: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateLimitDecision {
    Allow,
    /// Retry after the given duration
    Deny { retry_after: Duration },
}

#[derive(Debug)]
struct TokenBucket {
    /// Available tokens scaled by `TOKEN_SCALE`
    tokens: AtomicU64,
    /// Nanoseconds since `epoch` at the last credited refill
    last_refill_nanos: AtomicU64,
    /// Scaled tokens added per second
    rate_scaled: u64,
    max_tokens: u64,
    epoch: Instant,
}

impl TokenBucket {
    fn new(rate_per_sec: f64) -> Self {
        let max_tokens = (rate_per_sec.max(1.0) * TOKEN_SCALE as f64) as u64;
        let rate_scaled = (rate_per_sec * TOKEN_SCALE as f64) as u64;
        Self {
            tokens: AtomicU64::new(TOKEN_SCALE.min(max_tokens)),
            last_refill_nanos: AtomicU64::new(0),
            rate_scaled,
            max_tokens,
            epoch: Instant::now(),
        }
    }

    fn now_nanos(&self) -> u64 {
        self.epoch.elapsed().as_nanos() as u64
    }

    fn try_consume(&self) -> RateLimitDecision {
        self.refill(self.now_nanos());
        loop {
            let current = self.tokens.load(Ordering::Relaxed);
            if current < TOKEN_SCALE {
                let needed = TOKEN_SCALE - current;
                let nanos = if self.rate_scaled > 0 {
                    needed.saturating_mul(NANOS_PER_SEC) / self.rate_scaled
                } else {
                    1_000_000
                };
                return RateLimitDecision::Deny {
                    retry_after: Duration::from_nanos(nanos.max(1)),
                };
            }
            if self
                .tokens
                .compare_exchange_weak(current, current - TOKEN_SCALE, Ordering::Relaxed, Ordering::Relaxed)
                .is_ok()
            {
                return RateLimitDecision::Allow;
            }
        }
    }

    /// Advance `last_refill_nanos` only by the time that produced whole
    /// scaled tokens, so short intervals keep accumulating.
    fn refill(&self, now: u64) {
        loop {
            let last = self.last_refill_nanos.load(Ordering::Relaxed);
            if now <= last {
                return;
            }
            let added = (now - last).saturating_mul(self.rate_scaled) / NANOS_PER_SEC;
            if added == 0 {
                return;
            }
            let credited = if self.rate_scaled > 0 {
                added.saturating_mul(NANOS_PER_SEC) / self.rate_scaled
            } else {
                0
            };
            if self
                .last_refill_nanos
                .compare_exchange_weak(last, last + credited, Ordering::Relaxed, Ordering::Relaxed)
                .is_err()
            {
                continue;
            }
            let _ = self
                .tokens
                .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |t| {
                    Some(t.saturating_add(added).min(self.max_tokens))
                });
            return;
        }
    }
}

/// Per-host navigation limiter
#[derive(Debug)]
pub struct NavigationRateLimiter {
    rate_per_sec: f64,
    buckets: Mutex<LruCache<String, Arc<TokenBucket>>>,
}

impl NavigationRateLimiter {
    #[must_use]
    pub fn new(rate_per_sec: f64) -> Self {
        let capacity = NonZeroUsize::new(MAX_TRACKED_HOSTS).unwrap_or(NonZeroUsize::MIN);
        Self {
            rate_per_sec,
            buckets: Mutex::new(LruCache::new(capacity)),
        }
    }

    async fn bucket(&self, host: &str) -> Arc<TokenBucket> {
        let mut buckets = self.buckets.lock().await;
        if let Some(bucket) = buckets.get(host) {
            return Arc::clone(bucket);
        }
        let bucket = Arc::new(TokenBucket::new(self.rate_per_sec));
        buckets.put(host.to_string(), Arc::clone(&bucket));
        bucket
    }

    /// Immediate decision for one navigation to `host`
    pub async fn check(&self, host: &str) -> RateLimitDecision {
        self.bucket(host).await.try_consume()
    }

    /// Wait until a navigation to `host` is allowed
    pub async fn acquire(&self, host: &str) {
        let bucket = self.bucket(host).await;
        while let RateLimitDecision::Deny { retry_after } = bucket.try_consume() {
            tokio::time::sleep(retry_after).await;
        }
    }
}
