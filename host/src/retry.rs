use std::fmt::Display;
use std::thread;
use std::time::Duration;

use tracing::warn;

/// Bounded retry with exponential backoff: after failed attempt `n` the
/// policy waits `base_delay * 2^n` before trying again.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self { max_attempts: 3, base_delay: Duration::from_secs(1) }
    }
}

/// How a retried fetch ended.
#[derive(Debug)]
pub enum RetryOutcome<T, E> {
    Fetched(T),
    /// Every attempt failed; `value` was substituted.
    Fallback { value: T, cause: E },
    Failed(E),
}

impl RetryPolicy {
    /// No waiting between attempts.
    pub fn immediate(max_attempts: u32) -> Self {
        Self { max_attempts, base_delay: Duration::ZERO }
    }

    pub fn delay_after(&self, attempt: u32) -> Duration {
        self.base_delay.saturating_mul(2u32.saturating_pow(attempt))
    }

    /// Call `op` with the 1-based attempt number until it succeeds or the
    /// attempts run out.
    pub fn run<T, E, F>(&self, what: &str, mut op: F) -> RetryOutcome<T, E>
    where
        E: Display,
        F: FnMut(u32) -> Result<T, E>,
    {
        let attempts = self.max_attempts.max(1);
        let mut attempt = 1;
        loop {
            match op(attempt) {
                Ok(v) => return RetryOutcome::Fetched(v),
                Err(e) if attempt >= attempts => {
                    warn!("{} failed after {} attempts: {}", what, attempt, e);
                    return RetryOutcome::Failed(e);
                }
                Err(e) => {
                    let delay = self.delay_after(attempt);
                    warn!("{} failed (attempt {}/{}): {}; retrying in {:?}", what, attempt, attempts, e, delay);
                    if !delay.is_zero() {
                        thread::sleep(delay);
                    }
                    attempt += 1;
                }
            }
        }
    }
}

impl<T, E> RetryOutcome<T, E> {
    /// Turn `Failed` into `Fallback` with the value from `f`.
    pub fn or_fallback(self, f: impl FnOnce() -> T) -> Self {
        match self {
            RetryOutcome::Failed(cause) => RetryOutcome::Fallback { value: f(), cause },
            other => other,
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, RetryOutcome::Fallback { .. })
    }

    pub fn into_result(self) -> Result<T, E> {
        match self {
            RetryOutcome::Fetched(v) | RetryOutcome::Fallback { value: v, .. } => Ok(v),
            RetryOutcome::Failed(e) => Err(e),
        }
    }
}
