//! Human pacing: per-record delays, periodic cooldowns, navigation throttling

pub mod pacer;
pub mod rate_limiter;

pub use pacer::{Pacer, random_between};
pub use rate_limiter::{NavigationRateLimiter, RateLimitDecision};
