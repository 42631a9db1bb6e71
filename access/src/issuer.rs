//! Credential issuance.
//!
//! # Flow
//!
//! 1. Validate inputs (rejected before any transaction starts)
//! 2. Inside one serializable unit of work: resolve the booking contact,
//!    reuse an existing valid credential if one exists, otherwise mint a
//!    signed token and persist it
//! 3. After the transaction commits, deliver the token via the
//!    notification collaborator
//!
//! Delivery is deliberately outside the unit of work: conflict retries
//! re-execute the closure from the top, and a notification cannot be
//! rolled back.

use crate::config::AccessConfig;
use crate::coordinator::{TransactionCoordinator, TransactionSource};
use crate::providers::{CredentialStore, NotificationSender};
use crate::token::{TokenClaims, TokenSigner};
use bookstay_core::{AccessCredential, AccessError, BookingId, CredentialId, Result};
use chrono::{Duration, Utc};
use futures::FutureExt;
use tracing::{info, warn};

/// Outcome of a successful issuance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssuedAccess {
    /// The signed token granting access.
    pub token: String,

    /// `true` when an existing valid credential was returned instead of
    /// minting a new one.
    pub reused: bool,
}

/// Issues guest access credentials.
///
/// All persistence runs through the [`TransactionCoordinator`], so
/// concurrent issuance requests for the same `(booking_id, email)` pair
/// converge on a single valid credential: the losing transaction
/// restarts, finds the winner's row, and reuses it.
#[derive(Debug, Clone)]
pub struct CredentialIssuer<S, St, N>
where
    S: TransactionSource,
    St: CredentialStore<Conn = S::Conn> + Clone,
    N: NotificationSender,
{
    coordinator: TransactionCoordinator<S>,
    store: St,
    notifier: N,
    signer: TokenSigner,
    credential_ttl: Duration,
}

impl<S, St, N> CredentialIssuer<S, St, N>
where
    S: TransactionSource,
    St: CredentialStore<Conn = S::Conn> + Clone + 'static,
    N: NotificationSender,
{
    /// Create a new issuer.
    #[must_use]
    pub fn new(
        coordinator: TransactionCoordinator<S>,
        store: St,
        notifier: N,
        signer: TokenSigner,
        config: &AccessConfig,
    ) -> Self {
        Self {
            coordinator,
            store,
            notifier,
            signer,
            credential_ttl: config.credential_ttl,
        }
    }

    /// Issue (or reuse) an access credential for the booking and email.
    ///
    /// # Errors
    ///
    /// - [`AccessError::Validation`] for malformed inputs, before any
    ///   transaction starts.
    /// - [`AccessError::NotFound`] when the booking is absent or the
    ///   email does not match its contact.
    /// - [`AccessError::TransactionFailed`] when conflict retries are
    ///   exhausted.
    /// - [`AccessError::DeliveryFailed`] when the credential committed
    ///   but the notification collaborator failed. The credential stays
    ///   valid; retrying `issue` reuses it.
    pub async fn issue(&self, booking_id: &BookingId, email: &str) -> Result<IssuedAccess> {
        if !crate::utils::is_valid_booking_id(booking_id.as_str()) {
            return Err(AccessError::validation("malformed booking id"));
        }
        if !crate::utils::is_valid_email(email) {
            return Err(AccessError::validation("malformed email address"));
        }

        let store = self.store.clone();
        let signer = self.signer.clone();
        let ttl = self.credential_ttl;

        let (grant, contact) = self
            .coordinator
            .run(move |conn| {
                // Cloned per attempt: a conflict retry re-runs the whole
                // closure against a fresh transaction.
                let store = store.clone();
                let signer = signer.clone();
                let booking_id = booking_id.clone();
                let email = email.to_string();
                async move {
                    let Some(contact) =
                        store.find_booking_contact(conn, &booking_id, &email).await?
                    else {
                        return Err(AccessError::NotFound);
                    };

                    let now = Utc::now();
                    if let Some(token) = store
                        .find_valid_credential(conn, &booking_id, &email, now)
                        .await?
                    {
                        return Ok((IssuedAccess { token, reused: true }, contact));
                    }

                    let claims = TokenClaims::new(&booking_id, &email, now, ttl);
                    let token = signer.sign(&claims)?;
                    let credential = AccessCredential {
                        id: CredentialId::new(),
                        booking_id: booking_id.clone(),
                        email: email.clone(),
                        token: token.clone(),
                        expires_at: now + ttl,
                        used: false,
                        created_at: now,
                    };
                    store.insert_credential(conn, &credential).await?;

                    Ok((IssuedAccess { token, reused: false }, contact))
                }
                .boxed()
            })
            .await?;

        metrics::counter!(
            "bookstay_credentials_issued_total",
            "reused" => if grant.reused { "true" } else { "false" }
        )
        .increment(1);
        info!(
            booking_id = %booking_id,
            reused = grant.reused,
            "guest access credential issued"
        );

        // Side effect only after the transaction has committed.
        if let Err(err) = self.notifier.deliver(&contact, &grant.token, booking_id).await {
            warn!(
                booking_id = %booking_id,
                error = %err,
                "credential committed but delivery failed"
            );
            return Err(AccessError::DeliveryFailed {
                token: grant.token,
                reused: grant.reused,
            });
        }

        Ok(grant)
    }
}
