//! Fixed-delay retry policy
//!
//! Transient transport failures are retried up to `attempts` times with a
//! fixed `delay` between attempts. Authorization failures abort at once.
//! Running out of attempts is not an error: it yields
//! [`TrackerReply::Unavailable`].

use crate::client::TrackerReply;
use crate::error::{TrackerAuthorizationFailure, TransportError};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Attempt count and inter-attempt delay for tracker calls
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    /// Total attempts per call, at least one
    pub attempts: u32,
    /// Pause between consecutive attempts
    #[serde(with = "millis", rename = "delay_ms")]
    pub delay: Duration,
}

impl RetryPolicy {
    /// Create policy
    #[inline]
    #[must_use]
    pub fn new(attempts: u32, delay: Duration) -> Self {
        Self { attempts, delay }
    }

    /// Single attempt, no waiting
    #[inline]
    #[must_use]
    pub fn no_retry() -> Self {
        Self::new(1, Duration::ZERO)
    }

    /// Worst-case time spent sleeping for one call
    #[must_use]
    pub fn max_wait(&self) -> Duration {
        self.delay * self.attempts.max(1).saturating_sub(1)
    }

    /// Run `attempt` under this policy
    ///
    /// # Errors
    /// Returns [`TrackerAuthorizationFailure`] as soon as an attempt fails
    /// with a non-retryable error.
    pub fn run<T>(
        &self,
        operation: &str,
        mut attempt: impl FnMut() -> Result<T, TransportError>,
    ) -> Result<TrackerReply<T>, TrackerAuthorizationFailure> {
        let attempts = self.attempts.max(1);

        for n in 1..=attempts {
            match attempt() {
                Ok(value) => return Ok(TrackerReply::Done(value)),
                Err(e) if e.is_retryable() => {
                    tracing::warn!(operation, attempt = n, attempts, error = %e, "tracker call failed");
                    if n < attempts && !self.delay.is_zero() {
                        std::thread::sleep(self.delay);
                    }
                }
                Err(e) => {
                    tracing::error!(operation, error = %e, "tracker refused credentials");
                    return Err(TrackerAuthorizationFailure::new(operation, e));
                }
            }
        }

        tracing::warn!(operation, attempts, "tracker unavailable, giving up");
        Ok(TrackerReply::Unavailable)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(3, Duration::from_secs(1))
    }
}

mod millis {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub(super) fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(u64::try_from(value.as_millis()).unwrap_or(u64::MAX))
    }

    pub(super) fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::time::Instant;

    #[test]
    fn succeeds_after_transient_failures() {
        let calls = Cell::new(0);
        let reply = RetryPolicy::new(3, Duration::ZERO)
            .run("search", || {
                calls.set(calls.get() + 1);
                if calls.get() < 3 {
                    Err(TransportError::Http { status: 502 })
                } else {
                    Ok("found")
                }
            })
            .unwrap();

        assert_eq!(reply, TrackerReply::Done("found"));
        assert_eq!(calls.get(), 3);
    }

    #[test]
    fn exhausted_retries_are_unavailable() {
        let calls = Cell::new(0);
        let reply = RetryPolicy::new(3, Duration::ZERO)
            .run("search", || -> Result<(), _> {
                calls.set(calls.get() + 1);
                Err(TransportError::Malformed("truncated".into()))
            })
            .unwrap();

        assert_eq!(reply, TrackerReply::Unavailable);
        assert_eq!(calls.get(), 3);
    }

    #[test]
    fn authorization_failure_is_not_retried() {
        let calls = Cell::new(0);
        let err = RetryPolicy::new(5, Duration::ZERO)
            .run("connect", || -> Result<(), _> {
                calls.set(calls.get() + 1);
                Err(TransportError::Unauthorized { status: 403 })
            })
            .unwrap_err();

        assert_eq!(calls.get(), 1);
        assert_eq!(err.operation, "connect");
    }

    #[test]
    fn zero_attempts_still_tries_once() {
        let calls = Cell::new(0);
        let _ = RetryPolicy::new(0, Duration::ZERO).run("search", || -> Result<(), _> {
            calls.set(calls.get() + 1);
            Err(TransportError::Network("refused".into()))
        });
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn sleeps_between_attempts_only() {
        let policy = RetryPolicy::new(3, Duration::from_millis(15));
        let started = Instant::now();
        let _ = policy.run("search", || -> Result<(), _> {
            Err(TransportError::Network("refused".into()))
        });
        assert!(started.elapsed() >= policy.max_wait());
        assert_eq!(policy.max_wait(), Duration::from_millis(30));
    }

    #[test]
    fn policy_reads_delay_in_millis() {
        let policy: RetryPolicy = serde_json::from_str(r#"{"attempts":4,"delay_ms":250}"#).unwrap();
        assert_eq!(policy, RetryPolicy::new(4, Duration::from_millis(250)));
    }
}
