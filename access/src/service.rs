//! Request-handler facade over the guest-access components.

use crate::config::AccessConfig;
use crate::coordinator::{TransactionCoordinator, TransactionSource};
use crate::issuer::{CredentialIssuer, IssuedAccess};
use crate::providers::{CredentialStore, NotificationSender};
use crate::sweeper::CleanupSweeper;
use crate::token::TokenSigner;
use crate::verifier::{CredentialVerifier, Verification};
use bookstay_core::{BookingId, Result};

/// The surface exposed to request handlers: `issue`, `verify`,
/// `mark_used`, and `sweep`.
///
/// Wires the issuer, verifier, and sweeper over one transaction source,
/// one store, and one notification collaborator.
#[derive(Debug, Clone)]
pub struct GuestAccessService<S, St, N>
where
    S: TransactionSource,
    St: CredentialStore<Conn = S::Conn> + Clone + 'static,
    N: NotificationSender,
{
    issuer: CredentialIssuer<S, St, N>,
    verifier: CredentialVerifier<St>,
    sweeper: CleanupSweeper<St>,
}

impl<S, St, N> GuestAccessService<S, St, N>
where
    S: TransactionSource,
    St: CredentialStore<Conn = S::Conn> + Clone + 'static,
    N: NotificationSender,
{
    /// Assemble the service from its collaborators.
    #[must_use]
    pub fn new(source: S, store: St, notifier: N, config: AccessConfig) -> Self {
        let signer = TokenSigner::new(config.signing_secret.clone());
        let coordinator = TransactionCoordinator::with_policy(source, config.retry.clone());

        Self {
            issuer: CredentialIssuer::new(
                coordinator,
                store.clone(),
                notifier,
                signer.clone(),
                &config,
            ),
            verifier: CredentialVerifier::new(store.clone(), signer),
            sweeper: CleanupSweeper::new(store),
        }
    }

    /// Issue (or reuse) an access credential. See
    /// [`CredentialIssuer::issue`].
    ///
    /// # Errors
    ///
    /// See [`CredentialIssuer::issue`].
    pub async fn issue(&self, booking_id: &BookingId, email: &str) -> Result<IssuedAccess> {
        self.issuer.issue(booking_id, email).await
    }

    /// Verify a presented token. See [`CredentialVerifier::verify`].
    ///
    /// # Errors
    ///
    /// See [`CredentialVerifier::verify`].
    pub async fn verify(&self, token: &str) -> Result<Verification> {
        self.verifier.verify(token).await
    }

    /// Consume a credential. See [`CredentialVerifier::mark_used`].
    ///
    /// # Errors
    ///
    /// See [`CredentialVerifier::mark_used`].
    pub async fn mark_used(&self, token: &str) -> Result<()> {
        self.verifier.mark_used(token).await
    }

    /// Remove expired credentials now. See [`CleanupSweeper::sweep`].
    ///
    /// # Errors
    ///
    /// See [`CleanupSweeper::sweep`].
    pub async fn sweep(&self) -> Result<u64> {
        self.sweeper.sweep().await
    }

    /// A sweeper handle for spawning the hourly background loop.
    #[must_use]
    pub fn sweeper(&self) -> CleanupSweeper<St> {
        self.sweeper.clone()
    }
}
