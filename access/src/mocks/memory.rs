//! In-memory transaction source and credential store.

use crate::coordinator::TransactionSource;
use crate::providers::CredentialStore;
use bookstay_core::{AccessCredential, AccessError, BookingContact, BookingId, ContactKind, Result};
use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::task::yield_now;

#[derive(Debug, Default)]
struct MemoryState {
    bookings: HashMap<String, BookingContact>,
    credentials: Vec<AccessCredential>,
    commit_seq: u64,
    injected_conflicts: u32,
}

/// One open in-memory transaction.
///
/// Writes are staged locally and only reach the shared state at commit;
/// rollback simply drops them.
#[derive(Debug)]
pub struct MemoryTxn {
    snapshot_seq: u64,
    staged: Vec<AccessCredential>,
}

/// In-memory backend implementing both [`TransactionSource`] and
/// [`CredentialStore`].
///
/// Commit uses optimistic first-committer-wins detection: a transaction
/// that staged writes fails with [`AccessError::SerializationConflict`]
/// if any other write committed since it began, which reproduces the
/// abort-and-retry behavior of a serializable engine. Every operation
/// yields to the scheduler first, standing in for the database
/// round-trip suspension points that let concurrent requests interleave.
#[derive(Debug, Clone, Default)]
pub struct MemoryBackend {
    state: Arc<Mutex<MemoryState>>,
}

impl MemoryBackend {
    /// Create an empty backend.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a booking and its authoritative contact.
    pub fn insert_booking(&self, booking_id: BookingId, contact: BookingContact) {
        let mut state = self.state.lock().unwrap();
        state.bookings.insert(booking_id.0, contact);
    }

    /// Remove a booking, simulating deletion or transfer out of scope.
    pub fn remove_booking(&self, booking_id: &BookingId) {
        let mut state = self.state.lock().unwrap();
        state.bookings.remove(booking_id.as_str());
    }

    /// Snapshot of all committed credential rows (for assertions).
    #[must_use]
    pub fn credentials(&self) -> Vec<AccessCredential> {
        self.state.lock().unwrap().credentials.clone()
    }

    /// Number of committed rows valid right now for the pair.
    #[must_use]
    pub fn valid_credential_count(&self, booking_id: &BookingId, email: &str) -> usize {
        let now = Utc::now();
        let state = self.state.lock().unwrap();
        state
            .credentials
            .iter()
            .filter(|c| c.booking_id == *booking_id && c.email == email && c.is_valid(now))
            .count()
    }

    /// Force a credential's expiry into the past (for expiry tests).
    pub fn force_expire(&self, token: &str) {
        let mut state = self.state.lock().unwrap();
        if let Some(credential) = state.credentials.iter_mut().find(|c| c.token == token) {
            credential.expires_at = Utc::now() - Duration::seconds(1);
        }
    }

    /// Delete a credential row, simulating cleanup or revocation.
    pub fn remove_credential(&self, token: &str) {
        let mut state = self.state.lock().unwrap();
        state.credentials.retain(|c| c.token != token);
    }

    /// Fail the next `count` commits with a serialization conflict,
    /// regardless of what they staged.
    pub fn inject_commit_conflicts(&self, count: u32) {
        self.state.lock().unwrap().injected_conflicts = count;
    }
}

impl TransactionSource for MemoryBackend {
    type Conn = MemoryTxn;

    async fn begin(&self) -> Result<MemoryTxn> {
        yield_now().await;
        let state = self.state.lock().unwrap();
        Ok(MemoryTxn {
            snapshot_seq: state.commit_seq,
            staged: Vec::new(),
        })
    }

    async fn commit(&self, conn: MemoryTxn) -> Result<()> {
        yield_now().await;
        let mut state = self.state.lock().unwrap();

        if state.injected_conflicts > 0 {
            state.injected_conflicts -= 1;
            return Err(AccessError::SerializationConflict);
        }

        // Read-only transactions always commit.
        if conn.staged.is_empty() {
            return Ok(());
        }

        // First committer wins: any write committed since this
        // transaction began invalidates its reads.
        if state.commit_seq != conn.snapshot_seq {
            return Err(AccessError::SerializationConflict);
        }

        for credential in conn.staged {
            if state.credentials.iter().any(|c| c.token == credential.token) {
                return Err(AccessError::Database(
                    "duplicate credential token".to_string(),
                ));
            }
            state.credentials.push(credential);
        }
        state.commit_seq += 1;

        Ok(())
    }

    async fn rollback(&self, _conn: MemoryTxn) -> Result<()> {
        // Staged writes die with the handle.
        Ok(())
    }
}

impl CredentialStore for MemoryBackend {
    type Conn = MemoryTxn;

    async fn find_booking_contact(
        &self,
        _conn: &mut MemoryTxn,
        booking_id: &BookingId,
        email: &str,
    ) -> Result<Option<BookingContact>> {
        yield_now().await;
        let state = self.state.lock().unwrap();
        Ok(state
            .bookings
            .get(booking_id.as_str())
            .filter(|contact| contact.email() == email)
            .cloned())
    }

    async fn find_valid_credential(
        &self,
        conn: &mut MemoryTxn,
        booking_id: &BookingId,
        email: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<String>> {
        yield_now().await;

        let matches = |c: &AccessCredential| {
            c.booking_id == *booking_id && c.email == email && c.is_valid(now)
        };

        // Read-your-writes over staged rows, then latest committed.
        if let Some(credential) = conn.staged.iter().rev().find(|c| matches(c)) {
            return Ok(Some(credential.token.clone()));
        }

        let state = self.state.lock().unwrap();
        Ok(state
            .credentials
            .iter()
            .rev()
            .find(|c| matches(c))
            .map(|c| c.token.clone()))
    }

    async fn insert_credential(
        &self,
        conn: &mut MemoryTxn,
        credential: &AccessCredential,
    ) -> Result<()> {
        yield_now().await;
        let state = self.state.lock().unwrap();

        if state
            .credentials
            .iter()
            .chain(conn.staged.iter())
            .any(|c| c.token == credential.token)
        {
            return Err(AccessError::Database(
                "duplicate credential token".to_string(),
            ));
        }

        conn.staged.push(credential.clone());
        Ok(())
    }

    async fn find_by_token(&self, token: &str) -> Result<Option<AccessCredential>> {
        yield_now().await;
        let state = self.state.lock().unwrap();
        Ok(state.credentials.iter().find(|c| c.token == token).cloned())
    }

    async fn contact_kind(&self, booking_id: &BookingId) -> Result<Option<ContactKind>> {
        yield_now().await;
        let state = self.state.lock().unwrap();
        Ok(state
            .bookings
            .get(booking_id.as_str())
            .map(BookingContact::kind))
    }

    async fn mark_used(&self, token: &str) -> Result<()> {
        yield_now().await;
        let mut state = self.state.lock().unwrap();
        if let Some(credential) = state.credentials.iter_mut().find(|c| c.token == token) {
            credential.used = true;
        }
        Ok(())
    }

    async fn delete_expired(&self, now: DateTime<Utc>) -> Result<u64> {
        yield_now().await;
        let mut state = self.state.lock().unwrap();
        let before = state.credentials.len();
        state.credentials.retain(|c| c.expires_at >= now);
        Ok((before - state.credentials.len()) as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn guest_contact(email: &str) -> BookingContact {
        BookingContact::Guest {
            first_name: "Grace".to_string(),
            last_name: "Hopper".to_string(),
            email: email.to_string(),
            phone: None,
        }
    }

    fn credential(token: &str, expires_at: DateTime<Utc>) -> AccessCredential {
        AccessCredential {
            id: bookstay_core::CredentialId::new(),
            booking_id: BookingId::from("B1"),
            email: "a@x.com".to_string(),
            token: token.to_string(),
            expires_at,
            used: false,
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_staged_writes_are_invisible_until_commit() {
        let backend = MemoryBackend::new();

        let mut txn = backend.begin().await.unwrap();
        backend
            .insert_credential(&mut txn, &credential("t1", Utc::now() + Duration::hours(1)))
            .await
            .unwrap();

        assert!(backend.find_by_token("t1").await.unwrap().is_none());

        backend.commit(txn).await.unwrap();

        assert!(backend.find_by_token("t1").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_rollback_discards_staged_writes() {
        let backend = MemoryBackend::new();

        let mut txn = backend.begin().await.unwrap();
        backend
            .insert_credential(&mut txn, &credential("t1", Utc::now() + Duration::hours(1)))
            .await
            .unwrap();
        backend.rollback(txn).await.unwrap();

        assert!(backend.credentials().is_empty());
    }

    #[tokio::test]
    async fn test_first_committer_wins() {
        let backend = MemoryBackend::new();

        let mut first = backend.begin().await.unwrap();
        let mut second = backend.begin().await.unwrap();

        backend
            .insert_credential(
                &mut first,
                &credential("t1", Utc::now() + Duration::hours(1)),
            )
            .await
            .unwrap();
        backend
            .insert_credential(
                &mut second,
                &credential("t2", Utc::now() + Duration::hours(1)),
            )
            .await
            .unwrap();

        backend.commit(first).await.unwrap();
        let err = backend.commit(second).await.unwrap_err();

        assert_eq!(err, AccessError::SerializationConflict);
        assert_eq!(backend.credentials().len(), 1);
    }

    #[tokio::test]
    async fn test_read_only_commit_never_conflicts() {
        let backend = MemoryBackend::new();

        let reader = backend.begin().await.unwrap();

        let mut writer = backend.begin().await.unwrap();
        backend
            .insert_credential(
                &mut writer,
                &credential("t1", Utc::now() + Duration::hours(1)),
            )
            .await
            .unwrap();
        backend.commit(writer).await.unwrap();

        backend.commit(reader).await.unwrap();
    }

    #[tokio::test]
    async fn test_duplicate_token_is_terminal() {
        let backend = MemoryBackend::new();

        let mut txn = backend.begin().await.unwrap();
        backend
            .insert_credential(&mut txn, &credential("t1", Utc::now() + Duration::hours(1)))
            .await
            .unwrap();
        backend.commit(txn).await.unwrap();

        let mut other = backend.begin().await.unwrap();
        let err = backend
            .insert_credential(
                &mut other,
                &credential("t1", Utc::now() + Duration::hours(2)),
            )
            .await
            .unwrap_err();

        assert!(matches!(err, AccessError::Database(_)));
    }

    #[tokio::test]
    async fn test_booking_contact_requires_exact_email() {
        let backend = MemoryBackend::new();
        backend.insert_booking(BookingId::from("B1"), guest_contact("a@x.com"));

        let mut txn = backend.begin().await.unwrap();

        let found = backend
            .find_booking_contact(&mut txn, &BookingId::from("B1"), "a@x.com")
            .await
            .unwrap();
        assert!(found.is_some());

        // Case-sensitive equality on the stored value.
        let wrong_case = backend
            .find_booking_contact(&mut txn, &BookingId::from("B1"), "A@X.COM")
            .await
            .unwrap();
        assert!(wrong_case.is_none());
    }
}
