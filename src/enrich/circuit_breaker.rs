//! Host-level circuit breaker for profile loads
//!
//! When a host keeps failing (auth wall, throttling page, dead network) the
//! enricher stops loading profiles from it for a cooldown instead of burning
//! a hidden navigation and three field timeouts per record.
//!
//! States per host:
//! - Closed: loads proceed
//! - Open: loads are skipped until the cooldown elapses
//! - `HalfOpen`: one probe load decides whether to close or re-open

use dashmap::DashMap;
use log::{debug, info, warn};
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CircuitState {
    Closed,
    HalfOpen,
    Open,
}

/// Health tracking for a single host
#[derive(Debug, Clone)]
pub struct HostHealth {
    pub consecutive_failures: u32,
    pub total_loads: u32,
    pub total_successes: u32,
    /// When the circuit last opened, for the cooldown check
    pub opened_at: Option<Instant>,
    pub state: CircuitState,
}

impl HostHealth {
    fn new() -> Self {
        Self {
            consecutive_failures: 0,
            total_loads: 0,
            total_successes: 0,
            opened_at: None,
            state: CircuitState::Closed,
        }
    }
}

pub struct CircuitBreaker {
    hosts: DashMap<String, HostHealth>,
    /// Consecutive failures before opening
    failure_threshold: u32,
    cooldown: Duration,
}

impl CircuitBreaker {
    #[must_use]
    pub fn new(failure_threshold: u32, cooldown: Duration) -> Self {
        Self {
            hosts: DashMap::new(),
            failure_threshold: failure_threshold.max(1),
            cooldown,
        }
    }

    /// Whether a load against `host` should be attempted now
    pub fn should_attempt(&self, host: &str) -> bool {
        let mut health = self
            .hosts
            .entry(host.to_string())
            .or_insert_with(HostHealth::new);

        match health.state {
            CircuitState::Closed | CircuitState::HalfOpen => true,
            CircuitState::Open => match health.opened_at {
                Some(opened) if opened.elapsed() >= self.cooldown => {
                    health.state = CircuitState::HalfOpen;
                    info!(
                        "Profile circuit HALF-OPEN for {} after {:?}",
                        host,
                        opened.elapsed()
                    );
                    true
                }
                _ => false,
            },
        }
    }

    pub fn record_success(&self, host: &str) {
        let mut health = self
            .hosts
            .entry(host.to_string())
            .or_insert_with(HostHealth::new);
        health.consecutive_failures = 0;
        health.total_successes += 1;
        health.total_loads += 1;
        if health.state != CircuitState::Closed {
            health.state = CircuitState::Closed;
            health.opened_at = None;
            info!("Profile circuit CLOSED for {host}");
        }
    }

    pub fn record_failure(&self, host: &str, error: &str) {
        let mut health = self
            .hosts
            .entry(host.to_string())
            .or_insert_with(HostHealth::new);
        health.consecutive_failures += 1;
        health.total_loads += 1;

        let trip = health.state == CircuitState::HalfOpen
            || (health.state == CircuitState::Closed
                && health.consecutive_failures >= self.failure_threshold);
        if trip {
            health.state = CircuitState::Open;
            health.opened_at = Some(Instant::now());
            warn!(
                "Profile circuit OPEN for {} after {} consecutive failures. Last error: {}",
                host, health.consecutive_failures, error
            );
        } else {
            debug!(
                "Profile load failure for {} ({}/{}): {}",
                host, health.consecutive_failures, self.failure_threshold, error
            );
        }
    }

    #[must_use]
    pub fn health(&self, host: &str) -> Option<HostHealth> {
        self.hosts.get(host).map(|r| r.value().clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn opens_after_threshold() {
        let cb = CircuitBreaker::new(3, Duration::from_secs(60));
        for _ in 0..2 {
            cb.record_failure("linkedin.com", "authwall");
            assert!(cb.should_attempt("linkedin.com"));
        }
        cb.record_failure("linkedin.com", "authwall");
        assert!(!cb.should_attempt("linkedin.com"));
        let health = cb.health("linkedin.com").expect("tracked host");
        assert_eq!(health.state, CircuitState::Open);
        assert_eq!(health.consecutive_failures, 3);
    }

    #[test]
    fn half_open_probe_decides() {
        let cb = CircuitBreaker::new(1, Duration::from_millis(20));
        cb.record_failure("linkedin.com", "timeout");
        assert!(!cb.should_attempt("linkedin.com"));

        std::thread::sleep(Duration::from_millis(40));
        assert!(cb.should_attempt("linkedin.com"));
        cb.record_failure("linkedin.com", "timeout");
        assert!(!cb.should_attempt("linkedin.com"));

        std::thread::sleep(Duration::from_millis(40));
        assert!(cb.should_attempt("linkedin.com"));
        cb.record_success("linkedin.com");
        assert_eq!(
            cb.health("linkedin.com").expect("tracked host").state,
            CircuitState::Closed
        );
    }
}
