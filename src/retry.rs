//! Bounded retry for the I/O-backed capabilities (reference store queries and
//! external formula decomposition).
//!
//! Only errors the caller classifies as transient are retried; anything else,
//! or the last transient error after `max_attempts`, is returned unchanged.
//! Backoff doubles per attempt and is capped at 32 times the base delay.

use std::thread;
use std::time::Duration;

use log::warn;

/// Retry settings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, the first one included (at least 1)
    pub max_attempts: u32,
    /// Delay before the second attempt
    pub backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff: Duration::from_millis(50),
        }
    }
}

impl RetryPolicy {
    /// Policy that never retries
    pub fn none() -> Self {
        Self {
            max_attempts: 1,
            backoff: Duration::ZERO,
        }
    }

    /// Run `op` until it succeeds, fails permanently, or attempts run out.
    pub fn run<T, E, F, P>(&self, what: &str, mut op: F, is_transient: P) -> Result<T, E>
    where
        F: FnMut() -> Result<T, E>,
        P: Fn(&E) -> bool,
        E: std::fmt::Display,
    {
        let attempts = self.max_attempts.max(1);
        let mut attempt = 1;
        loop {
            match op() {
                Ok(value) => return Ok(value),
                Err(e) if attempt < attempts && is_transient(&e) => {
                    let delay = self.backoff * (1u32 << (attempt - 1).min(5));
                    warn!("{what} failed (attempt {attempt}/{attempts}), retrying in {delay:?}: {e}");
                    thread::sleep(delay);
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn test_retries_transient_until_success() {
        let calls = Cell::new(0);
        let policy = RetryPolicy {
            max_attempts: 3,
            backoff: Duration::ZERO,
        };
        let result: Result<u32, String> = policy.run(
            "op",
            || {
                calls.set(calls.get() + 1);
                if calls.get() < 3 {
                    Err("busy".to_string())
                } else {
                    Ok(7)
                }
            },
            |_| true,
        );
        assert_eq!(result, Ok(7));
        assert_eq!(calls.get(), 3);
    }

    #[test]
    fn test_gives_up_after_max_attempts() {
        let calls = Cell::new(0);
        let policy = RetryPolicy {
            max_attempts: 2,
            backoff: Duration::ZERO,
        };
        let result: Result<(), String> = policy.run(
            "op",
            || {
                calls.set(calls.get() + 1);
                Err("busy".to_string())
            },
            |_| true,
        );
        assert!(result.is_err());
        assert_eq!(calls.get(), 2);
    }

    #[test]
    fn test_permanent_error_not_retried() {
        let calls = Cell::new(0);
        let result: Result<(), String> = RetryPolicy::default().run(
            "op",
            || {
                calls.set(calls.get() + 1);
                Err("fatal".to_string())
            },
            |_| false,
        );
        assert!(result.is_err());
        assert_eq!(calls.get(), 1);
    }
}
