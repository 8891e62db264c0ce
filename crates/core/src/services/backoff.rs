use std::time::Duration;

use crate::models::settings::Settings;

/// Jitter source: fraction of a second in `[0, 1)` added to each delay.
/// A plain function pointer so tests can pin it to a constant.
pub type JitterFn = fn() -> f64;

fn uniform_jitter() -> f64 {
    rand::random::<f64>()
}

/// Exponential backoff policy for retrying rate-limited upstream calls.
///
/// Delay before retry `attempt` (0-based) is
/// `2^attempt * base_delay + jitter()` seconds. With the defaults
/// (3 attempts, 2 s base) a caller that exhausts the budget has waited
/// roughly 2 + 4 seconds plus jitter; the budget bounds the total wait.
///
/// Waiting suspends only the calling task (`tokio::time::sleep`); it must
/// never be done while holding a lock on the shared cache.
#[derive(Debug, Clone)]
pub struct BackoffPolicy {
    /// Total attempts, first try included. 1 means no retries.
    pub max_attempts: u32,

    /// Base delay, doubled on each successive retry.
    pub base_delay: Duration,

    jitter: JitterFn,
}

impl BackoffPolicy {
    pub fn new(max_attempts: u32, base_delay: Duration) -> Self {
        Self {
            max_attempts,
            base_delay,
            jitter: uniform_jitter,
        }
    }

    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(
            settings.retry_attempts,
            Duration::from_secs(settings.retry_base_secs),
        )
    }

    /// Replace the jitter source (tests pass `|| 0.0`-style constants).
    pub fn with_jitter(mut self, jitter: JitterFn) -> Self {
        self.jitter = jitter;
        self
    }

    /// Whether the policy allows another try after `attempt` (0-based)
    /// failed.
    pub fn should_retry(&self, attempt: u32) -> bool {
        attempt + 1 < self.max_attempts
    }

    /// Delay to wait before re-trying after failed attempt `attempt`.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let exp = 2u32.saturating_pow(attempt);
        let base = self.base_delay.saturating_mul(exp);
        base + Duration::from_secs_f64((self.jitter)())
    }
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self::new(3, Duration::from_secs(2))
    }
}
