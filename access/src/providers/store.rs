//! Credential store trait.
//!
//! Pure data access, no policy. Operations that participate in the
//! issuance unit of work take the active transaction handle; lookups
//! used by the verifier and sweeper run against the pool directly.

use bookstay_core::{AccessCredential, BookingContact, BookingId, ContactKind, Result};
use chrono::{DateTime, Utc};
use std::future::Future;

/// Persistence operations for access-credential records.
///
/// `Conn` is the transaction handle type of the matching
/// [`TransactionSource`](crate::coordinator::TransactionSource); the two
/// implementations must agree on it so store calls can run inside the
/// coordinator's unit of work.
pub trait CredentialStore: Send + Sync {
    /// Transaction handle accepted by the transactional operations.
    type Conn: Send;

    /// Resolve the booking's authoritative contact and verify the
    /// supplied email matches it (case-sensitive equality on the stored
    /// value).
    ///
    /// Returns `None` if the booking does not exist or the email does
    /// not match.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    fn find_booking_contact(
        &self,
        conn: &mut Self::Conn,
        booking_id: &BookingId,
        email: &str,
    ) -> impl Future<Output = Result<Option<BookingContact>>> + Send;

    /// The most recently created credential token for the pair that is
    /// still valid at `now` (`expires_at > now`, `used = false`), if any.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    fn find_valid_credential(
        &self,
        conn: &mut Self::Conn,
        booking_id: &BookingId,
        email: &str,
        now: DateTime<Utc>,
    ) -> impl Future<Output = Result<Option<String>>> + Send;

    /// Persist a new credential row.
    ///
    /// # Errors
    ///
    /// A colliding `token` is a terminal [`Database`] failure; signing
    /// includes a random nonce, so collisions are astronomically
    /// unlikely.
    ///
    /// [`Database`]: bookstay_core::AccessError::Database
    fn insert_credential(
        &self,
        conn: &mut Self::Conn,
        credential: &AccessCredential,
    ) -> impl Future<Output = Result<()>> + Send;

    /// Look up a credential by exact token string.
    ///
    /// Non-transactional; used only by the verifier.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    fn find_by_token(
        &self,
        token: &str,
    ) -> impl Future<Output = Result<Option<AccessCredential>>> + Send;

    /// Resolve the booking's *current* contact classification, which may
    /// differ from what was true at issuance time.
    ///
    /// Returns `None` if the booking no longer exists.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    fn contact_kind(
        &self,
        booking_id: &BookingId,
    ) -> impl Future<Output = Result<Option<ContactKind>>> + Send;

    /// Set `used = true` for the matching row; no-op if not found.
    ///
    /// # Errors
    ///
    /// Returns an error if the update fails.
    fn mark_used(&self, token: &str) -> impl Future<Output = Result<()>> + Send;

    /// Delete all rows with `expires_at < now`, independent of `used`.
    ///
    /// Returns the number of rows deleted.
    ///
    /// # Errors
    ///
    /// Returns an error if the delete fails.
    fn delete_expired(&self, now: DateTime<Utc>) -> impl Future<Output = Result<u64>> + Send;
}
