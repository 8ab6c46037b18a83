//! `RetryPolicy` — ambient addition (SPEC_FULL §6.3), grounded on the
//! teacher's `ProviderError::is_retryable()` convention.

use crate::responder::ResponderError;
use std::time::Duration;

/// How backoff grows between retry attempts.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Backoff {
    /// Same delay every attempt.
    Fixed(Duration),
    /// Delay doubles each attempt, starting from the given base.
    Exponential(Duration),
}

/// A transport-error retry policy (§4.4 step 4, §6.3).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryPolicy {
    /// Maximum number of attempts, including the first.
    pub max_attempts: u32,
    /// Backoff shape between attempts.
    pub backoff: Backoff,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 1,
            backoff: Backoff::Fixed(Duration::from_millis(0)),
        }
    }
}

impl RetryPolicy {
    /// A policy that never retries.
    pub fn none() -> Self {
        Self::default()
    }

    /// Exponential backoff with a given base delay and attempt count.
    pub fn exponential(max_attempts: u32, base: Duration) -> Self {
        Self {
            max_attempts,
            backoff: Backoff::Exponential(base),
        }
    }

    /// Whether `attempt` (1-indexed) should be retried given `error`.
    pub fn should_retry(&self, error: &ResponderError, attempt: u32) -> bool {
        error.is_retryable() && attempt < self.max_attempts
    }

    /// The delay to wait before the given attempt (1-indexed).
    pub fn delay_for(&self, attempt: u32) -> Duration {
        match self.backoff {
            Backoff::Fixed(d) => d,
            Backoff::Exponential(base) => base.saturating_mul(2u32.saturating_pow(attempt.saturating_sub(1))),
        }
    }
}
