//! Periodic removal of expired credential records.

use crate::providers::CredentialStore;
use bookstay_core::Result;
use chrono::Utc;
use std::time::Duration;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{info, warn};

/// Removes expired access-credential rows.
///
/// Idempotent: a sweep right after another with no new expirations
/// removes zero rows.
#[derive(Debug, Clone)]
pub struct CleanupSweeper<St: CredentialStore> {
    store: St,
}

impl<St: CredentialStore> CleanupSweeper<St> {
    /// Create a new sweeper.
    #[must_use]
    pub const fn new(store: St) -> Self {
        Self { store }
    }

    /// Delete all rows whose `expires_at` has passed, independent of
    /// their `used` flag. Returns the number removed.
    ///
    /// # Errors
    ///
    /// Returns an error if the delete fails.
    pub async fn sweep(&self) -> Result<u64> {
        let removed = self.store.delete_expired(Utc::now()).await?;

        if removed > 0 {
            info!(removed, "removed expired access credentials");
        }
        metrics::counter!("bookstay_credentials_swept_total").increment(removed);

        Ok(removed)
    }

    /// Run sweeps on a fixed interval until the task is dropped.
    ///
    /// Failures are logged and swallowed here, at the scheduling layer,
    /// so one failed sweep never stops the next from running. Intended
    /// to be spawned as a background task:
    ///
    /// ```rust,ignore
    /// tokio::spawn(sweeper.run(Duration::from_secs(3600)));
    /// ```
    pub async fn run(self, period: Duration) {
        let mut ticker = interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;

            if let Err(err) = self.sweep().await {
                warn!(error = %err, "cleanup sweep failed; next sweep unaffected");
            }
        }
    }
}
