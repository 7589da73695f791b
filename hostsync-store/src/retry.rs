//! Retry wrapper for remote operations.
//!
//! The default policy retries transient failures forever with no delay.
//! Non-transient failures (see [`Transient`]) are returned on the first
//! occurrence.

use std::time::Duration;

use hostsync_core::RetrySettings;

use crate::error::Transient;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts before giving up; `None` retries forever.
    pub max_attempts: Option<u32>,
    /// Pause between attempts.
    pub backoff: Duration,
}

impl RetryPolicy {
    pub fn unbounded() -> Self {
        Self::default()
    }

    pub fn bounded(max_attempts: u32) -> Self {
        Self {
            max_attempts: Some(max_attempts.max(1)),
            backoff: Duration::ZERO,
        }
    }
}

impl From<&RetrySettings> for RetryPolicy {
    fn from(settings: &RetrySettings) -> Self {
        Self {
            max_attempts: settings.max_attempts.map(|n| n.max(1)),
            backoff: Duration::from_millis(settings.backoff_ms),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Retrier {
    policy: RetryPolicy,
}

impl Retrier {
    pub fn new(policy: RetryPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Run `action` until it succeeds.
    ///
    /// `on_failure` sees every failed attempt that is about to be retried,
    /// with its 1-based attempt number. A non-transient error, or the last
    /// attempt allowed by the policy, is returned without calling it.
    pub fn retry<T, E, A, F>(&self, mut action: A, mut on_failure: F) -> Result<T, E>
    where
        A: FnMut() -> Result<T, E>,
        F: FnMut(&E, u32),
        E: Transient,
    {
        let mut attempt: u32 = 0;
        loop {
            attempt = attempt.saturating_add(1);
            let err = match action() {
                Ok(value) => return Ok(value),
                Err(err) => err,
            };
            if !err.is_transient() {
                return Err(err);
            }
            if let Some(max) = self.policy.max_attempts {
                if attempt >= max {
                    return Err(err);
                }
            }
            on_failure(&err, attempt);
            if !self.policy.backoff.is_zero() {
                std::thread::sleep(self.policy.backoff);
            }
        }
    }
}
