//! Shared retry/backoff policy (spec §9 design note) used by the webhook
//! dispatcher, the LLM client, and the extractor client alike.

use rand::Rng;
use std::time::Duration;

/// Exponential backoff with full jitter, shared by every component that
/// calls an upstream it doesn't control.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub backoff_start: Duration,
    pub backoff_factor: f64,
    pub jitter_fraction: f64,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, backoff_start: Duration, backoff_factor: f64) -> Self {
        Self {
            max_attempts,
            backoff_start,
            backoff_factor,
            jitter_fraction: 0.2,
        }
    }

    /// Delay before the given attempt (1-indexed: the wait *after* attempt N fails).
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let exp = self.backoff_factor.powi(attempt.saturating_sub(1) as i32);
        let base = self.backoff_start.as_secs_f64() * exp;

        let mut rng = rand::thread_rng();
        let jitter_range = base * self.jitter_fraction;
        let jitter = rng.gen_range(-jitter_range..=jitter_range);

        Duration::from_secs_f64((base + jitter).max(0.0))
    }

    pub fn should_retry(&self, attempt: u32) -> bool {
        attempt < self.max_attempts
    }
}

impl Default for RetryPolicy {
    /// Matches the webhook retry table in spec §4.5: 1s, 2s, 4s, 3 attempts.
    fn default() -> Self {
        Self::new(3, Duration::from_secs(1), 2.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backoff_grows_geometrically_before_jitter() {
        let policy = RetryPolicy::new(5, Duration::from_secs(1), 2.0);
        // With jitter_fraction 0.2, attempt 1 delay is within [0.8, 1.2]s.
        let d1 = policy.delay_for_attempt(1).as_secs_f64();
        assert!((0.8..=1.2).contains(&d1));

        let d3 = policy.delay_for_attempt(3).as_secs_f64();
        // base = 1 * 2^2 = 4s, jitter +/-20% => [3.2, 4.8]
        assert!((3.2..=4.8).contains(&d3));
    }

    #[test]
    fn should_retry_respects_max_attempts() {
        let policy = RetryPolicy::new(3, Duration::from_secs(1), 2.0);
        assert!(policy.should_retry(1));
        assert!(policy.should_retry(2));
        assert!(!policy.should_retry(3));
    }
}
