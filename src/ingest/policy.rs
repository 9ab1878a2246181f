//! Retry policy for backend calls
//!
//! Kept free of I/O so backoff bounds can be tested on their own.

use std::time::Duration;

use rand::Rng;

use crate::config::BackendConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the first attempt
    pub max_retries: u32,
    pub base: Duration,
    pub cap: Duration,
    pub jitter_max: Duration,
}

impl RetryPolicy {
    #[must_use]
    pub fn new(max_retries: u32, base: Duration, cap: Duration, jitter_max: Duration) -> Self {
        Self {
            max_retries,
            base,
            cap,
            jitter_max,
        }
    }

    /// No retries at all
    #[must_use]
    pub fn none() -> Self {
        Self::new(0, Duration::ZERO, Duration::ZERO, Duration::ZERO)
    }

    #[must_use]
    pub fn from_config(config: &BackendConfig) -> Self {
        Self::new(
            config.max_retries,
            Duration::from_millis(config.backoff_base_ms),
            Duration::from_millis(config.backoff_cap_ms),
            Duration::from_millis(config.jitter_max_ms),
        )
    }

    /// Whether `retry` (0-based) is still allowed
    #[must_use]
    pub fn allows(&self, retry: u32) -> bool {
        retry < self.max_retries
    }

    /// `min(base * 2^retry, cap)` without jitter
    #[must_use]
    pub fn backoff_delay(&self, retry: u32) -> Duration {
        let factor = 2u32.checked_pow(retry).unwrap_or(u32::MAX);
        self.base.saturating_mul(factor).min(self.cap)
    }

    /// Backoff for `retry` plus `jitter`, with jitter clamped to `jitter_max`
    #[must_use]
    pub fn backoff_with_jitter(&self, retry: u32, jitter: Duration) -> Duration {
        self.backoff_delay(retry) + jitter.min(self.jitter_max)
    }

    /// Backoff for `retry` with random jitter in `[0, jitter_max]`
    #[must_use]
    pub fn backoff(&self, retry: u32) -> Duration {
        let max_ms = u64::try_from(self.jitter_max.as_millis()).unwrap_or(u64::MAX);
        let jitter = if max_ms == 0 {
            Duration::ZERO
        } else {
            Duration::from_millis(rand::rng().random_range(0..=max_ms))
        };
        self.backoff_with_jitter(retry, jitter)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&BackendConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn doubles_until_capped() {
        let p = RetryPolicy::default();
        assert_eq!(p.backoff_delay(0), Duration::from_secs(1));
        assert_eq!(p.backoff_delay(1), Duration::from_secs(2));
        assert_eq!(p.backoff_delay(2), Duration::from_secs(4));
        assert_eq!(p.backoff_delay(5), Duration::from_secs(10));
        assert_eq!(p.backoff_delay(40), Duration::from_secs(10));
        assert!(p.allows(2));
        assert!(!p.allows(3));
    }

    proptest! {
        #[test]
        fn backoff_stays_within_cap_plus_jitter(retry in 0u32..64) {
            let p = RetryPolicy::default();
            let d = p.backoff(retry);
            prop_assert!(d >= p.backoff_delay(retry));
            prop_assert!(d <= p.cap + p.jitter_max);
        }

        #[test]
        fn backoff_is_monotonic(retry in 0u32..63) {
            let p = RetryPolicy::default();
            prop_assert!(p.backoff_delay(retry) <= p.backoff_delay(retry + 1));
        }
    }
}
