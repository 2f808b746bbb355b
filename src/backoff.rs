//! Exponential backoff for callers retrying after the pool is exhausted

use rand::Rng;
use std::time::Duration;
use tracing::trace;

const DEFAULT_BASE_DELAY: Duration = Duration::from_secs(1);
const DEFAULT_MAX_DELAY: Duration = Duration::from_secs(120);
const DEFAULT_MULTIPLIER: f64 = 1.6;
const JITTER_FACTOR: f64 = 0.2;

/// Exponentially growing delay, optionally jittered, capped at a maximum.
///
/// Each call to [`Backoff::sleep`] (or [`Backoff::next_delay`]) advances the
/// attempt counter; [`Backoff::reset`] starts over after a success.
///
/// # Examples
///
/// ```
/// use general_pool::Backoff;
/// use std::time::Duration;
///
/// let mut backoff = Backoff::new()
///     .with_base_delay(Duration::from_millis(100))
///     .with_multiplier(2.0)
///     .with_max_delay(Duration::from_millis(300));
///
/// assert_eq!(backoff.next_delay(), Duration::from_millis(100));
/// assert_eq!(backoff.next_delay(), Duration::from_millis(200));
/// assert_eq!(backoff.next_delay(), Duration::from_millis(300));
/// assert_eq!(backoff.next_delay(), Duration::from_millis(300));
/// ```
#[derive(Debug, Clone)]
pub struct Backoff {
    base_delay: Duration,
    max_delay: Duration,
    multiplier: f64,
    jitter: bool,
    attempt: u32,
}

impl Default for Backoff {
    fn default() -> Self {
        Self {
            base_delay: DEFAULT_BASE_DELAY,
            max_delay: DEFAULT_MAX_DELAY,
            multiplier: DEFAULT_MULTIPLIER,
            jitter: false,
            attempt: 0,
        }
    }
}

impl Backoff {
    /// Create a backoff with default settings (1s base, x1.6, 120s cap, no jitter)
    pub fn new() -> Self {
        Self::default()
    }

    /// Randomize each delay by up to ±20%
    pub fn with_jitter(mut self, jitter: bool) -> Self {
        self.jitter = jitter;
        self
    }

    /// Upper bound for any single delay
    pub fn with_max_delay(mut self, max_delay: Duration) -> Self {
        self.max_delay = max_delay;
        self
    }

    /// Delay of the first attempt
    pub fn with_base_delay(mut self, base_delay: Duration) -> Self {
        self.base_delay = base_delay;
        self
    }

    /// Growth factor between consecutive attempts
    pub fn with_multiplier(mut self, multiplier: f64) -> Self {
        self.multiplier = multiplier;
        self
    }

    /// Number of delays handed out since creation or the last reset
    pub fn attempts(&self) -> u32 {
        self.attempt
    }

    /// Start over from the base delay
    pub fn reset(&mut self) {
        self.attempt = 0;
    }

    /// Compute the next delay and advance the attempt counter
    pub fn next_delay(&mut self) -> Duration {
        let exponent = i32::try_from(self.attempt).unwrap_or(i32::MAX);
        self.attempt = self.attempt.saturating_add(1);

        let max_secs = self.max_delay.as_secs_f64();
        // f64::min discards NaN and infinity from a runaway exponent.
        let mut secs = (self.base_delay.as_secs_f64() * self.multiplier.powi(exponent)).min(max_secs);

        if self.jitter {
            let factor = rand::rng().random_range(-JITTER_FACTOR..=JITTER_FACTOR);
            secs = (secs * (1.0 + factor)).min(max_secs);
        }

        Duration::from_secs_f64(secs.max(0.0))
    }

    /// Block the current thread for the next delay
    pub fn sleep(&mut self) {
        let delay = self.next_delay();
        trace!(attempt = self.attempt, ?delay, "backing off");
        std::thread::sleep(delay);
    }

    /// Wait for the next delay without blocking the runtime
    pub async fn sleep_async(&mut self) {
        let delay = self.next_delay();
        trace!(attempt = self.attempt, ?delay, "backing off");
        tokio::time::sleep(delay).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_sequence() {
        let mut backoff = Backoff::new();
        assert_eq!(backoff.next_delay(), Duration::from_secs(1));
        assert_eq!(backoff.next_delay(), Duration::from_secs_f64(1.6));
        assert_eq!(backoff.attempts(), 2);
    }

    #[test]
    fn test_capped_at_max_delay() {
        let mut backoff = Backoff::new().with_max_delay(Duration::from_secs(5));
        for _ in 0..50 {
            assert!(backoff.next_delay() <= Duration::from_secs(5));
        }
        assert_eq!(backoff.next_delay(), Duration::from_secs(5));
    }

    #[test]
    fn test_huge_attempt_count_does_not_overflow() {
        let mut backoff = Backoff::new().with_max_delay(Duration::from_secs(3));
        backoff.attempt = u32::MAX;
        assert_eq!(backoff.next_delay(), Duration::from_secs(3));
        assert_eq!(backoff.attempts(), u32::MAX);
    }

    #[test]
    fn test_jitter_stays_in_bounds() {
        let mut backoff = Backoff::new()
            .with_jitter(true)
            .with_base_delay(Duration::from_millis(100))
            .with_multiplier(1.0);
        for _ in 0..200 {
            let delay = backoff.next_delay();
            assert!(delay >= Duration::from_millis(79), "{delay:?}");
            assert!(delay <= Duration::from_millis(121), "{delay:?}");
        }
    }

    #[test]
    fn test_reset() {
        let mut backoff = Backoff::new().with_base_delay(Duration::from_millis(10));
        backoff.next_delay();
        backoff.next_delay();
        backoff.reset();
        assert_eq!(backoff.attempts(), 0);
        assert_eq!(backoff.next_delay(), Duration::from_millis(10));
    }
}
