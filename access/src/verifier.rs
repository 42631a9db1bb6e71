//! Credential verification.
//!
//! Verification never mutates state and is freely repeatable. Call
//! sites that need single-use semantics consume the credential with an
//! explicit [`mark_used`](CredentialVerifier::mark_used) step.

use crate::providers::CredentialStore;
use crate::token::{TokenSigner, GUEST_BOOKING_ACCESS_PURPOSE};
use bookstay_core::{BookingId, ContactKind, Result};
use chrono::Utc;
use tracing::debug;

/// Why a presented token was rejected.
///
/// Callers surface all three as a generic access-denied response; the
/// distinction exists for logging and tests, not for the requester.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    /// Signature failure or purpose mismatch.
    InvalidToken,

    /// No persisted record for the token: fabricated, issued under a
    /// previous signing secret, revoked by deletion, or already
    /// consumed.
    NotFound,

    /// The persisted record's expiry has passed. Authoritative over the
    /// token's own embedded timestamp.
    Expired,
}

impl RejectReason {
    /// Stable string form for logs.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::InvalidToken => "invalid_token",
            Self::NotFound => "not_found",
            Self::Expired => "expired",
        }
    }
}

/// A successfully verified access grant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedAccess {
    /// Booking the token grants read access to.
    pub booking_id: BookingId,

    /// Email the credential was issued to.
    pub email: String,

    /// The booking's *current* contact classification, resolved at
    /// verification time; ownership may have changed since issuance.
    pub contact_kind: ContactKind,
}

/// Outcome of verifying a presented token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verification {
    /// Token is cryptographically valid and backed by a live record.
    Valid(VerifiedAccess),

    /// Token was rejected.
    Rejected(RejectReason),
}

impl Verification {
    /// Whether the token was accepted.
    #[must_use]
    pub const fn is_valid(&self) -> bool {
        matches!(self, Self::Valid(_))
    }
}

/// Verifies presented access tokens.
#[derive(Debug, Clone)]
pub struct CredentialVerifier<St: CredentialStore> {
    store: St,
    signer: TokenSigner,
}

impl<St: CredentialStore> CredentialVerifier<St> {
    /// Create a new verifier.
    #[must_use]
    pub const fn new(store: St, signer: TokenSigner) -> Self {
        Self { store, signer }
    }

    /// Verify a presented token.
    ///
    /// The persisted record is the single source of truth: a token whose
    /// signature still validates is rejected once its row has been
    /// deleted (revocation) or consumed, and the row's `expires_at`
    /// overrides the expiry embedded in the token itself.
    ///
    /// # Errors
    ///
    /// Returns an error only for infrastructure failures (the store
    /// lookup failing); rejection is a normal [`Verification`] outcome.
    pub async fn verify(&self, token: &str) -> Result<Verification> {
        let Some(claims) = self.signer.decode(token) else {
            debug!("token rejected: signature or structure invalid");
            return Ok(Verification::Rejected(RejectReason::InvalidToken));
        };

        if claims.purpose != GUEST_BOOKING_ACCESS_PURPOSE {
            debug!(purpose = %claims.purpose, "token rejected: purpose mismatch");
            return Ok(Verification::Rejected(RejectReason::InvalidToken));
        }

        let Some(record) = self.store.find_by_token(token).await? else {
            debug!("token rejected: no persisted record");
            return Ok(Verification::Rejected(RejectReason::NotFound));
        };

        if record.expires_at <= Utc::now() {
            debug!(booking_id = %record.booking_id, "token rejected: record expired");
            return Ok(Verification::Rejected(RejectReason::Expired));
        }

        if record.used {
            // A consumed credential behaves like a revoked one.
            debug!(booking_id = %record.booking_id, "token rejected: already consumed");
            return Ok(Verification::Rejected(RejectReason::NotFound));
        }

        let Some(contact_kind) = self.store.contact_kind(&record.booking_id).await? else {
            debug!(booking_id = %record.booking_id, "token rejected: booking gone");
            return Ok(Verification::Rejected(RejectReason::NotFound));
        };

        Ok(Verification::Valid(VerifiedAccess {
            booking_id: record.booking_id,
            email: record.email,
            contact_kind,
        }))
    }

    /// Consume the credential: set `used = true` on its record.
    ///
    /// No-op if the token has no record. Never invoked automatically by
    /// [`verify`](Self::verify).
    ///
    /// # Errors
    ///
    /// Returns an error if the update fails.
    pub async fn mark_used(&self, token: &str) -> Result<()> {
        self.store.mark_used(token).await
    }
}
