//! Retry policy value object.

use std::time::Duration;

/// Bounded exponential backoff for transient failures.
///
/// The delay before retry `n` (1-indexed) is
/// `min(initial_delay * 2^(n - 1), max_delay)`. There is no jitter:
/// deterministic backoff keeps test runs reproducible.
///
/// Construction clamps out-of-range values instead of failing:
/// at least one attempt, at least half a second of initial delay.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    max_attempts: u32,
    initial_delay: Duration,
    max_delay: Duration,
}

const MIN_INITIAL_DELAY: Duration = Duration::from_millis(500);

impl RetryPolicy {
    /// Create a policy, clamping values into their valid ranges.
    pub fn new(max_attempts: u32, initial_delay: Duration, max_delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            initial_delay: initial_delay.max(MIN_INITIAL_DELAY),
            max_delay,
        }
    }

    /// Create a policy from fractional seconds, clamping negatives to zero.
    pub fn from_secs(max_attempts: u32, initial_delay_secs: f64, max_delay_secs: f64) -> Self {
        Self::new(
            max_attempts,
            Duration::from_secs_f64(initial_delay_secs.max(0.0)),
            Duration::from_secs_f64(max_delay_secs.max(0.0)),
        )
    }

    /// Maximum number of attempts per logical call.
    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Delay before the retry following the given attempt (1-indexed).
    pub fn delay_for(&self, attempt: u32) -> Duration {
        // Cap the exponent so the f64 math cannot blow up on huge budgets.
        let exponent = attempt.saturating_sub(1).min(32) as i32;
        let delay = self.initial_delay.as_secs_f64() * 2f64.powi(exponent);
        Duration::from_secs_f64(delay.min(self.max_delay.as_secs_f64()))
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(5, Duration::from_millis(500), Duration::from_secs(30))
    }
}
