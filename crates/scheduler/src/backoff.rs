//! Retry backoff for suspended requests
//!
//! A request that needs a page layout which has not materialized yet is not
//! an error; it is retried with a linearly increasing delay and a bounded
//! attempt count, then failed with an empty result.

use serde::{Deserialize, Serialize};

/// Bounded, linearly increasing retry policy
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RetryBackoff {
    /// Delay added per attempt, in milliseconds
    pub base_delay_ms: u64,

    /// Attempts allowed before the request fails
    pub max_attempts: u32,
}

impl Default for RetryBackoff {
    fn default() -> Self {
        Self {
            base_delay_ms: 120,
            max_attempts: 5,
        }
    }
}

impl RetryBackoff {
    /// Create a new backoff policy
    pub fn new(base_delay_ms: u64, max_attempts: u32) -> Self {
        Self {
            base_delay_ms,
            max_attempts,
        }
    }

    /// Delay before retry number `attempt` (1-based)
    pub fn delay_for(&self, attempt: u32) -> u64 {
        self.base_delay_ms * u64::from(attempt.max(1))
    }

    /// Check whether `attempt` retries exhaust the policy
    pub fn exhausted(&self, attempt: u32) -> bool {
        attempt >= self.max_attempts
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_delay_increases_linearly() {
        let backoff = RetryBackoff::new(100, 4);
        assert_eq!(backoff.delay_for(1), 100);
        assert_eq!(backoff.delay_for(2), 200);
        assert_eq!(backoff.delay_for(3), 300);
    }

    #[test]
    fn test_exhaustion_bound() {
        let backoff = RetryBackoff::new(100, 3);
        assert!(!backoff.exhausted(2));
        assert!(backoff.exhausted(3));
        assert!(backoff.exhausted(4));
    }
}
