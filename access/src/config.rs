//! Guest-access configuration.
//!
//! Configuration values should be provided by the application, not
//! hardcoded.

use crate::coordinator::RetryPolicy;
use chrono::Duration;

/// Guest access-credential configuration.
#[derive(Debug, Clone)]
pub struct AccessConfig {
    /// Process-wide secret used to sign access tokens.
    ///
    /// Rotating the secret invalidates all outstanding tokens: they
    /// still have rows in storage, but their signatures no longer
    /// verify.
    pub signing_secret: Vec<u8>,

    /// Credential time-to-live from issuance.
    ///
    /// Default: 24 hours
    pub credential_ttl: Duration,

    /// Retry policy for the transactional coordinator.
    pub retry: RetryPolicy,
}

impl AccessConfig {
    /// Create new configuration with the given signing secret.
    #[must_use]
    pub fn new(signing_secret: Vec<u8>) -> Self {
        Self {
            signing_secret,
            credential_ttl: Duration::hours(24),
            retry: RetryPolicy::default(),
        }
    }

    /// Set credential time-to-live.
    #[must_use]
    pub const fn with_credential_ttl(mut self, ttl: Duration) -> Self {
        self.credential_ttl = ttl;
        self
    }

    /// Set the coordinator retry policy.
    #[must_use]
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }
}
