//! Conflict retry configuration
//!
//! Bounds how often a mutation is re-run after a storage conflict.

use std::time::Duration;

/// Default number of attempts for one mutation (first try included)
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Default backoff step between attempts
pub const DEFAULT_RETRY_BACKOFF: Duration = Duration::from_millis(10);

/// Bounded retry for `Conflict` failures
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    max_attempts: u32,
    backoff: Duration,
}

impl RetryPolicy {
    /// `max_attempts` is clamped to at least one.
    pub fn new(max_attempts: u32, backoff: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            backoff,
        }
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Linear backoff before attempt `attempt + 1`, saturating at `Duration::MAX`.
    pub fn delay_after(&self, attempt: u32) -> Duration {
        self.backoff.saturating_mul(attempt)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_ATTEMPTS, DEFAULT_RETRY_BACKOFF)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.max_attempts(), 3);
        assert_eq!(policy.delay_after(1), Duration::from_millis(10));
    }

    #[test]
    fn backoff_is_linear() {
        let policy = RetryPolicy::new(5, Duration::from_millis(4));
        assert_eq!(policy.delay_after(1), Duration::from_millis(4));
        assert_eq!(policy.delay_after(3), Duration::from_millis(12));
    }

    #[test]
    fn huge_backoff_saturates() {
        let policy = RetryPolicy::new(3, Duration::from_millis(u64::MAX));
        assert_eq!(policy.delay_after(2), Duration::MAX);
    }

    #[test]
    fn zero_attempts_clamped() {
        assert_eq!(RetryPolicy::new(0, Duration::ZERO).max_attempts(), 1);
    }
}
