//! Bounded retry of transient store failures.
//!
//! Only errors whose code is transient (`service_unavailable`) are retried.
//! Validation, authorisation, conflict and not-found failures are returned to
//! the caller on the first attempt.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use mockable::Clock;
use tracing::warn;

use super::Error;

/// Retry limits and backoff bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Maximum attempts per operation, including the first call.
    pub max_attempts: u32,
    /// Delay before the second attempt.
    pub initial_backoff: Duration,
    /// Cap applied to the exponential delay.
    pub max_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_backoff: Duration::from_millis(50),
            max_backoff: Duration::from_secs(1),
        }
    }
}

impl RetryPolicy {
    /// Exponential delay after `attempt` failed attempts, before jitter.
    ///
    /// # Examples
    /// ```
    /// use std::time::Duration;
    /// use helpdesk::domain::RetryPolicy;
    ///
    /// let policy = RetryPolicy::default();
    /// assert_eq!(policy.base_delay(1), Duration::from_millis(50));
    /// assert_eq!(policy.base_delay(2), Duration::from_millis(100));
    /// assert_eq!(policy.base_delay(10), Duration::from_secs(1));
    /// ```
    pub fn base_delay(&self, attempt: u32) -> Duration {
        let exponent = 2_u32.saturating_pow(attempt.saturating_sub(1));
        let base_ms = u64::try_from(self.initial_backoff.as_millis()).unwrap_or(u64::MAX);
        let max_ms = u64::try_from(self.max_backoff.as_millis()).unwrap_or(u64::MAX);
        Duration::from_millis(base_ms.saturating_mul(u64::from(exponent)).min(max_ms))
    }
}

/// Async sleeping abstraction so tests can skip real delays.
#[async_trait]
pub trait Sleeper: Send + Sync {
    /// Suspend execution for `duration`.
    async fn sleep(&self, duration: Duration);
}

/// Retry backoff jitter abstraction.
pub trait BackoffJitter: Send + Sync {
    /// Return a jittered delay from the exponential base delay.
    fn jittered_delay(&self, base: Duration, attempt: u32, now: DateTime<Utc>) -> Duration;
}

/// Tokio-based sleeper implementation.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Adds up to a quarter of the base delay, seeded from the clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct AttemptJitter;

impl BackoffJitter for AttemptJitter {
    fn jittered_delay(&self, base: Duration, attempt: u32, now: DateTime<Utc>) -> Duration {
        let base_ms = u64::try_from(base.as_millis()).unwrap_or(u64::MAX);
        let max_extra = (base_ms / 4).max(1);
        let seed = u64::from(now.timestamp_subsec_nanos()) ^ u64::from(attempt);
        let extra = seed % (max_extra.saturating_add(1));
        Duration::from_millis(base_ms.saturating_add(extra))
    }
}

/// Runs fallible store operations under a [`RetryPolicy`].
#[derive(Clone)]
pub struct Retrier {
    policy: RetryPolicy,
    clock: Arc<dyn Clock>,
    sleeper: Arc<dyn Sleeper>,
    jitter: Arc<dyn BackoffJitter>,
}

impl Retrier {
    /// Build a retrier that sleeps on the Tokio timer.
    pub fn new(policy: RetryPolicy, clock: Arc<dyn Clock>) -> Self {
        Self {
            policy,
            clock,
            sleeper: Arc::new(TokioSleeper),
            jitter: Arc::new(AttemptJitter),
        }
    }

    /// Replace the sleeping and jitter strategies.
    #[must_use]
    pub fn with_runtime(mut self, sleeper: Arc<dyn Sleeper>, jitter: Arc<dyn BackoffJitter>) -> Self {
        self.sleeper = sleeper;
        self.jitter = jitter;
        self
    }

    /// Configured policy.
    pub fn policy(&self) -> RetryPolicy {
        self.policy
    }

    /// Run `operation`, retrying transient failures until the attempt budget
    /// is spent. The final error is returned unchanged.
    pub async fn run<T, F, Fut>(&self, operation: &'static str, mut attempt_fn: F) -> Result<T, Error>
    where
        T: Send,
        F: FnMut() -> Fut + Send,
        Fut: Future<Output = Result<T, Error>> + Send,
    {
        let mut attempt = 1_u32;
        loop {
            match attempt_fn().await {
                Err(error)
                    if error.code().is_transient() && attempt < self.policy.max_attempts =>
                {
                    let delay = self.jitter.jittered_delay(
                        self.policy.base_delay(attempt),
                        attempt,
                        self.clock.utc(),
                    );
                    warn!(
                        operation,
                        attempt,
                        delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                        error = %error,
                        "retrying transient store failure"
                    );
                    self.sleeper.sleep(delay).await;
                    attempt = attempt.saturating_add(1);
                }
                outcome => return outcome,
            }
        }
    }
}
