//! Capped exponential backoff for notification fetches.

use std::time::Duration;

use crate::config::NotificationSettings;

/// `delay(n) = min(base * 2^n, max_delay)` for retry `n` (0-based), at most
/// `max_retries` retries after the first attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub base_delay: Duration,
    pub max_delay: Duration,
    pub max_retries: u32,
}

impl RetryPolicy {
    pub const fn new(base_delay: Duration, max_delay: Duration, max_retries: u32) -> Self {
        Self {
            base_delay,
            max_delay,
            max_retries,
        }
    }

    /// Delay to wait before retry number `retry` (0 is the first retry).
    pub fn delay(&self, retry: u32) -> Duration {
        let base_ms = self.base_delay.as_millis() as u64;
        let factor = 2u64.saturating_pow(retry);
        let delay_ms = base_ms.saturating_mul(factor);
        Duration::from_millis(delay_ms).min(self.max_delay)
    }

    /// The full schedule of waits, one per allowed retry.
    pub fn schedule(&self) -> impl Iterator<Item = Duration> + '_ {
        (0..self.max_retries).map(|retry| self.delay(retry))
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(Duration::from_secs(1), Duration::from_secs(10), 3)
    }
}

impl From<&NotificationSettings> for RetryPolicy {
    fn from(settings: &NotificationSettings) -> Self {
        Self::new(
            Duration::from_millis(settings.retry_base_delay_ms),
            Duration::from_millis(settings.retry_max_delay_ms),
            settings.max_retries,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_default_schedule() {
        let delays: Vec<_> = RetryPolicy::default().schedule().collect();
        assert_eq!(
            delays,
            vec![
                Duration::from_secs(1),
                Duration::from_secs(2),
                Duration::from_secs(4)
            ]
        );
    }

    #[test]
    fn test_delay_is_capped() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.delay(3), Duration::from_secs(8));
        assert_eq!(policy.delay(4), Duration::from_secs(10));
        assert_eq!(policy.delay(63), Duration::from_secs(10));
        assert_eq!(policy.delay(u32::MAX), Duration::from_secs(10));
    }

    #[test]
    fn test_from_settings() {
        let policy = RetryPolicy::from(&NotificationSettings::default());
        assert_eq!(policy, RetryPolicy::default());
    }

    proptest! {
        #[test]
        fn delays_never_decrease_and_never_exceed_cap(
            base_ms in 1u64..5_000,
            cap_ms in 5_000u64..120_000,
            retry in 0u32..40,
        ) {
            let policy = RetryPolicy::new(
                Duration::from_millis(base_ms),
                Duration::from_millis(cap_ms),
                3,
            );
            let current = policy.delay(retry);
            let next = policy.delay(retry + 1);
            prop_assert!(current <= next);
            prop_assert!(next <= Duration::from_millis(cap_ms));
        }
    }
}
