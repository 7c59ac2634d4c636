use std::time::Duration;

use crate::config::RetryConfig;

/// How a failed attempt should be treated by the backoff loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Connect or transfer deadline hit; HTTP 408.
    Timeout,
    /// HTTP 429 or 503.
    Throttled,
    /// Refused, reset, DNS failure or truncated response.
    Connection,
    /// Any other 5xx.
    Http5xx(u16),
    /// Permanent for this run: 4xx, disk errors, undersized bodies, aborts.
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    NoRetry,
    /// Wait this long, then make the next attempt.
    RetryAfter(Duration),
}

/// Per-resource attempt budget with doubling backoff.
///
/// Attempt `n` (1-based) that fails with a retryable kind waits
/// `base_delay * 2^(n-1)`, never more than `max_delay`.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Attempts per resource, first one included. Always at least 1.
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&RetryConfig::default())
    }
}

impl RetryPolicy {
    /// Single attempt. Used when the config has no `[retry]` section.
    pub fn none() -> Self {
        Self {
            max_attempts: 1,
            base_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
        }
    }

    pub fn from_config(cfg: &RetryConfig) -> Self {
        Self {
            max_attempts: cfg.max_attempts.max(1),
            base_delay: Duration::from_secs_f64(cfg.base_delay_secs.max(0.0)),
            max_delay: Duration::from_secs(cfg.max_delay_secs),
        }
    }

    fn backoff(&self, attempt: u32) -> Duration {
        // Shift capped at 8 so the multiplier stays small; max_delay caps the rest.
        let factor = 1u32 << attempt.saturating_sub(1).min(8);
        self.base_delay.saturating_mul(factor).min(self.max_delay)
    }

    /// What to do after `attempt` failed with `kind`.
    pub fn decide(&self, attempt: u32, kind: ErrorKind) -> RetryDecision {
        let retryable = !matches!(kind, ErrorKind::Other);
        if !retryable || attempt >= self.max_attempts {
            return RetryDecision::NoRetry;
        }
        RetryDecision::RetryAfter(self.backoff(attempt))
    }
}
