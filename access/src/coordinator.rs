//! Transactional-consistency coordinator.
//!
//! This module provides [`TransactionCoordinator`], which runs a
//! caller-supplied unit of work inside a SERIALIZABLE database
//! transaction and retries it from scratch with exponential backoff when
//! the database reports a serialization conflict.
//!
//! # Side effects
//!
//! Retries re-execute the unit of work from the top, so non-idempotent
//! external effects (sending a notification, charging a card) must never
//! be placed inside it. The coordinator owns the transaction boundary;
//! callers own everything outside it:
//!
//! ```text
//! let result = coordinator.run(unit_of_work).await?;
//! perform_side_effects(result);
//! ```

use bookstay_core::{AccessError, Result};
use futures::future::BoxFuture;
use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;

/// A source of serializable database transactions.
///
/// This trait abstracts over the connection pool: `begin` acquires a
/// connection and opens a transaction at the serializable isolation
/// level, `commit`/`rollback` close it. The connection returns to the
/// pool when the `Conn` value is dropped, which makes release
/// unconditional on every exit path.
pub trait TransactionSource: Send + Sync {
    /// Handle to one open transaction.
    type Conn: Send;

    /// Acquire a connection and begin a SERIALIZABLE transaction.
    ///
    /// # Errors
    ///
    /// Returns an error if no connection can be acquired or the
    /// transaction cannot be opened.
    fn begin(&self) -> impl Future<Output = Result<Self::Conn>> + Send;

    /// Commit the transaction.
    ///
    /// # Errors
    ///
    /// Returns [`AccessError::SerializationConflict`] when the database
    /// detects a non-serializable interleaving at commit time, or a
    /// database error otherwise.
    fn commit(&self, conn: Self::Conn) -> impl Future<Output = Result<()>> + Send;

    /// Roll the transaction back.
    ///
    /// # Errors
    ///
    /// Returns an error if the rollback itself fails; callers treat this
    /// as best-effort.
    fn rollback(&self, conn: Self::Conn) -> impl Future<Output = Result<()>> + Send;
}

/// Retry policy for serialization conflicts.
///
/// # Default Values
///
/// - `max_retries`: 3
/// - `initial_delay`: 100ms
/// - `max_delay`: 30 seconds
/// - `multiplier`: 2.0 (delay doubles each retry)
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Maximum number of retry attempts after the first try.
    pub max_retries: u32,
    /// Delay before the first retry.
    pub initial_delay: Duration,
    /// Maximum delay between retries (cap for exponential backoff).
    pub max_delay: Duration,
    /// Multiplier for exponential backoff.
    pub multiplier: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_delay: Duration::from_millis(100),
            max_delay: Duration::from_secs(30),
            multiplier: 2.0,
        }
    }
}

impl RetryPolicy {
    /// Create a new policy builder.
    #[must_use]
    pub const fn builder() -> RetryPolicyBuilder {
        RetryPolicyBuilder {
            max_retries: Some(3),
            initial_delay: Some(Duration::from_millis(100)),
            max_delay: Some(Duration::from_secs(30)),
            multiplier: Some(2.0),
        }
    }

    /// Calculate delay for a given attempt number.
    ///
    /// Uses exponential backoff: delay = `initial_delay` * (`multiplier` ^ attempt),
    /// capped at `max_delay`.
    #[must_use]
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        if attempt == 0 {
            return self.initial_delay;
        }

        let delay_ms =
            self.initial_delay.as_millis() as f64 * self.multiplier.powi(attempt as i32);

        let delay = Duration::from_millis(delay_ms as u64);

        if delay > self.max_delay {
            self.max_delay
        } else {
            delay
        }
    }
}

/// Builder for [`RetryPolicy`].
#[derive(Debug, Clone)]
pub struct RetryPolicyBuilder {
    max_retries: Option<u32>,
    initial_delay: Option<Duration>,
    max_delay: Option<Duration>,
    multiplier: Option<f64>,
}

impl RetryPolicyBuilder {
    /// Set maximum number of retries.
    #[must_use]
    pub const fn max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = Some(max_retries);
        self
    }

    /// Set delay before the first retry.
    #[must_use]
    pub const fn initial_delay(mut self, delay: Duration) -> Self {
        self.initial_delay = Some(delay);
        self
    }

    /// Set maximum delay (cap for exponential backoff).
    #[must_use]
    pub const fn max_delay(mut self, delay: Duration) -> Self {
        self.max_delay = Some(delay);
        self
    }

    /// Set multiplier for exponential backoff.
    #[must_use]
    pub const fn multiplier(mut self, multiplier: f64) -> Self {
        self.multiplier = Some(multiplier);
        self
    }

    /// Build the [`RetryPolicy`].
    #[must_use]
    pub fn build(self) -> RetryPolicy {
        RetryPolicy {
            max_retries: self.max_retries.unwrap_or(3),
            initial_delay: self.initial_delay.unwrap_or(Duration::from_millis(100)),
            max_delay: self.max_delay.unwrap_or(Duration::from_secs(30)),
            multiplier: self.multiplier.unwrap_or(2.0),
        }
    }
}

/// Runs units of work inside serializable transactions with
/// conflict-retry.
#[derive(Debug, Clone)]
pub struct TransactionCoordinator<S> {
    source: S,
    policy: RetryPolicy,
}

impl<S: TransactionSource> TransactionCoordinator<S> {
    /// Create a coordinator with the default retry policy.
    #[must_use]
    pub fn new(source: S) -> Self {
        Self {
            source,
            policy: RetryPolicy::default(),
        }
    }

    /// Create a coordinator with a custom retry policy.
    #[must_use]
    pub const fn with_policy(source: S, policy: RetryPolicy) -> Self {
        Self { source, policy }
    }

    /// Run `work` inside a SERIALIZABLE transaction.
    ///
    /// The unit of work receives the open transaction handle and must
    /// keep itself limited to database interaction: on a serialization
    /// conflict the whole closure is re-invoked against a fresh
    /// transaction, not replayed from partial state.
    ///
    /// # Errors
    ///
    /// - [`AccessError::TransactionFailed`] once conflict retries are
    ///   exhausted.
    /// - Any non-conflict failure from the unit of work, commit, or
    ///   `begin`, re-raised immediately without retry.
    pub async fn run<T, F>(&self, mut work: F) -> Result<T>
    where
        T: Send,
        F: for<'c> FnMut(&'c mut S::Conn) -> BoxFuture<'c, Result<T>> + Send,
    {
        let mut attempt: u32 = 0;

        loop {
            let mut conn = self.source.begin().await?;

            let outcome = match work(&mut conn).await {
                Ok(value) => self.source.commit(conn).await.map(|()| value),
                Err(err) => {
                    // Best-effort: a rollback failure must not mask the
                    // original error.
                    if let Err(rollback_err) = self.source.rollback(conn).await {
                        tracing::debug!(
                            error = %rollback_err,
                            "rollback after failed unit of work also failed"
                        );
                    }
                    Err(err)
                }
            };

            match outcome {
                Ok(value) => {
                    if attempt > 0 {
                        tracing::info!(attempt, "transaction committed after conflict retry");
                    }
                    return Ok(value);
                }
                Err(err) if err.is_serialization_conflict() => {
                    metrics::counter!("bookstay_txn_conflicts_total").increment(1);

                    if attempt >= self.policy.max_retries {
                        tracing::error!(attempt, "serialization conflict retries exhausted");
                        return Err(AccessError::TransactionFailed {
                            attempts: attempt + 1,
                        });
                    }

                    let delay = self.policy.delay_for_attempt(attempt);
                    tracing::warn!(
                        attempt,
                        delay_ms = delay.as_millis(),
                        "serialization conflict, restarting unit of work"
                    );

                    sleep(delay).await;
                    attempt += 1;
                }
                Err(err) => return Err(err),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retry_policy_delay_calculation() {
        let policy = RetryPolicy::builder()
            .initial_delay(Duration::from_millis(100))
            .multiplier(2.0)
            .max_delay(Duration::from_secs(10))
            .build();

        assert_eq!(policy.delay_for_attempt(0), Duration::from_millis(100));
        assert_eq!(policy.delay_for_attempt(1), Duration::from_millis(200));
        assert_eq!(policy.delay_for_attempt(2), Duration::from_millis(400));
        assert_eq!(policy.delay_for_attempt(3), Duration::from_millis(800));
    }

    #[test]
    fn test_retry_policy_max_delay_cap() {
        let policy = RetryPolicy::builder()
            .initial_delay(Duration::from_millis(1000))
            .multiplier(10.0)
            .max_delay(Duration::from_secs(2))
            .build();

        // 1000ms * 10^5 = 100,000,000ms, but capped at 2000ms
        assert_eq!(policy.delay_for_attempt(5), Duration::from_secs(2));
    }

    #[test]
    fn test_default_policy_matches_contract() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.max_retries, 3);
        assert_eq!(policy.initial_delay, Duration::from_millis(100));
        assert_eq!(policy.multiplier, 2.0);
    }
}
