//! Per-connection token bucket for chat and typing events

use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use roomchat_common::RateLimitConfig;
use std::num::NonZeroU32;

/// Token bucket owned by one connection
pub struct EventRateLimiter {
    limiter: DefaultDirectRateLimiter,
}

impl EventRateLimiter {
    /// Bucket refilled at `per_second` tokens per second holding up to `burst` tokens.
    /// Zero values are raised to one.
    #[must_use]
    pub fn new(per_second: u32, burst: u32) -> Self {
        let rate = NonZeroU32::new(per_second).unwrap_or(NonZeroU32::MIN);
        let burst = NonZeroU32::new(burst).unwrap_or(NonZeroU32::MIN);

        Self {
            limiter: RateLimiter::direct(Quota::per_second(rate).allow_burst(burst)),
        }
    }

    #[must_use]
    pub fn from_config(config: &RateLimitConfig) -> Self {
        Self::new(config.messages_per_second, config.burst)
    }

    /// Take one token; false when the bucket is empty
    pub fn try_acquire(&self) -> bool {
        self.limiter.check().is_ok()
    }
}

impl Default for EventRateLimiter {
    fn default() -> Self {
        Self::from_config(&RateLimitConfig::default())
    }
}

impl std::fmt::Debug for EventRateLimiter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventRateLimiter").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_burst_then_reject() {
        let limiter = EventRateLimiter::new(1, 3);

        assert!(limiter.try_acquire());
        assert!(limiter.try_acquire());
        assert!(limiter.try_acquire());
        assert!(!limiter.try_acquire());
    }

    #[test]
    fn test_zero_config_still_allows_one() {
        let limiter = EventRateLimiter::new(0, 0);
        assert!(limiter.try_acquire());
        assert!(!limiter.try_acquire());
    }

    #[tokio::test]
    async fn test_bucket_refills() {
        let limiter = EventRateLimiter::new(20, 1);
        assert!(limiter.try_acquire());
        assert!(!limiter.try_acquire());

        tokio::time::sleep(std::time::Duration::from_millis(80)).await;
        assert!(limiter.try_acquire());
    }
}
