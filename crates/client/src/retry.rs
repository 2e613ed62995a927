//! Retry policy for transient transport failures.
//!
//! Only timeouts and connection errors are retried; any response from the
//! server, including 5xx, is returned to the caller as-is.

use std::time::Duration;

use crate::config::TaruviConfig;

/// Tracks attempts for one logical request and computes backoff delays.
///
/// Delays grow exponentially: `backoff_factor * 2^attempt` seconds, so the
/// sequence for the default factor of 0.5 is 0.5s, 1s, 2s.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    max_retries: u32,
    backoff_factor: f64,
    attempt: u32,
}

impl RetryPolicy {
    pub fn new(max_retries: u32, backoff_factor: f64) -> Self {
        Self {
            max_retries,
            backoff_factor,
            attempt: 0,
        }
    }

    pub fn from_config(config: &TaruviConfig) -> Self {
        Self::new(config.max_retries(), config.backoff_factor())
    }

    /// Number of retries consumed so far.
    pub fn attempts(&self) -> u32 {
        self.attempt
    }

    /// Consume one retry attempt.
    ///
    /// Returns the delay to sleep before the next attempt, or `None` when
    /// the budget is exhausted and the caller should surface the error.
    pub fn next_delay(&mut self) -> Option<Duration> {
        if self.attempt >= self.max_retries {
            return None;
        }
        let delay = self.backoff_factor * f64::from(1u32 << self.attempt.min(31));
        self.attempt += 1;
        Some(Duration::from_secs_f64(delay.max(0.0)))
    }
}
