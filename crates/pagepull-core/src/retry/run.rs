//! Retry loop: run a closure until success or policy says stop.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use super::classify;
use super::error::FetchError;
use super::policy::{RetryDecision, RetryPolicy};

const ABORT_POLL: Duration = Duration::from_millis(50);

/// Calls `f` until it succeeds or `policy` gives up, sleeping the backoff
/// between attempts. `f` receives the 1-based attempt number. If `abort` is
/// set while waiting, [`FetchError::Aborted`] is returned without another
/// attempt.
pub fn run_with_retry<T, F>(policy: &RetryPolicy, abort: &AtomicBool, mut f: F) -> Result<T, FetchError>
where
    F: FnMut(u32) -> Result<T, FetchError>,
{
    let mut attempt = 1u32;
    loop {
        let e = match f(attempt) {
            Ok(v) => return Ok(v),
            Err(e) => e,
        };
        let kind = classify::classify(&e);
        match policy.decide(attempt, kind) {
            RetryDecision::NoRetry => return Err(e),
            RetryDecision::RetryAfter(d) => {
                tracing::warn!(id = e.id(), attempt, ?kind, delay_ms = d.as_millis() as u64, "retrying: {}", e);
                if !sleep_unless_aborted(d, abort) {
                    tracing::debug!(id = e.id(), attempt, "abort requested during backoff");
                    return Err(FetchError::Aborted { id: e.id() });
                }
                attempt += 1;
            }
        }
    }
}

/// Sleeps for `d` in short slices. Returns false if `abort` was set.
fn sleep_unless_aborted(d: Duration, abort: &AtomicBool) -> bool {
    let deadline = Instant::now() + d;
    loop {
        if abort.load(Ordering::Relaxed) {
            return false;
        }
        let now = Instant::now();
        if now >= deadline {
            return true;
        }
        std::thread::sleep((deadline - now).min(ABORT_POLL));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fast_policy(max_attempts: u32) -> RetryPolicy {
        RetryPolicy {
            max_attempts,
            base_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(5),
        }
    }

    #[test]
    fn retries_transient_then_succeeds() {
        let abort = AtomicBool::new(false);
        let mut calls = 0;
        let res = run_with_retry(&fast_policy(3), &abort, |attempt| {
            calls += 1;
            if attempt < 3 {
                Err(FetchError::FetchFailed { id: 9, status: 503 })
            } else {
                Ok(attempt)
            }
        });
        assert_eq!(res.unwrap(), 3);
        assert_eq!(calls, 3);
    }

    #[test]
    fn does_not_retry_404() {
        let abort = AtomicBool::new(false);
        let mut calls = 0;
        let res: Result<(), _> = run_with_retry(&fast_policy(5), &abort, |_| {
            calls += 1;
            Err(FetchError::FetchFailed { id: 42, status: 404 })
        });
        assert!(matches!(res, Err(FetchError::FetchFailed { id: 42, status: 404 })));
        assert_eq!(calls, 1);
    }

    #[test]
    fn gives_up_after_max_attempts() {
        let abort = AtomicBool::new(false);
        let mut calls = 0;
        let res: Result<(), _> = run_with_retry(&fast_policy(2), &abort, |_| {
            calls += 1;
            Err(FetchError::FetchFailed { id: 1, status: 500 })
        });
        assert!(res.is_err());
        assert_eq!(calls, 2);
    }

    #[test]
    fn abort_stops_retrying() {
        let abort = AtomicBool::new(true);
        let mut calls = 0;
        let res: Result<(), _> = run_with_retry(&fast_policy(5), &abort, |_| {
            calls += 1;
            Err(FetchError::FetchFailed { id: 1, status: 503 })
        });
        assert!(matches!(res, Err(FetchError::Aborted { id: 1 })));
        assert_eq!(calls, 1);
    }

    #[test]
    fn non_retryable_error_kept_even_when_aborted() {
        let abort = AtomicBool::new(true);
        let res: Result<(), _> = run_with_retry(&fast_policy(5), &abort, |_| {
            Err(FetchError::FetchFailed { id: 4, status: 404 })
        });
        assert!(matches!(res, Err(FetchError::FetchFailed { id: 4, status: 404 })));
    }

    #[test]
    fn abort_during_long_backoff_returns_promptly() {
        let abort = std::sync::Arc::new(AtomicBool::new(false));
        let setter = std::sync::Arc::clone(&abort);
        let handle = std::thread::spawn(move || {
            std::thread::sleep(Duration::from_millis(50));
            setter.store(true, Ordering::SeqCst);
        });
        let policy = RetryPolicy {
            max_attempts: 3,
            base_delay: Duration::from_secs(10),
            max_delay: Duration::from_secs(10),
        };
        let started = Instant::now();
        let res: Result<(), _> = run_with_retry(&policy, &abort, |_| {
            Err(FetchError::FetchFailed { id: 2, status: 503 })
        });
        handle.join().unwrap();
        assert!(matches!(res, Err(FetchError::Aborted { id: 2 })));
        assert!(started.elapsed() < Duration::from_secs(5));
    }
}
