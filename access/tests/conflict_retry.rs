//! Coordinator conflict-retry behavior and concurrent issuance.

#![allow(clippy::unwrap_used)] // Test code uses unwrap for clear failure messages

use bookstay_access::mocks::{MemoryBackend, MockNotificationSender};
use bookstay_access::{
    AccessConfig, GuestAccessService, RetryPolicy, TransactionCoordinator,
};
use bookstay_core::{AccessError, BookingContact, BookingId};
use futures::FutureExt;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Surface coordinator retry logging when running with `RUST_LOG` set.
fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();
}

fn fast_policy(max_retries: u32) -> RetryPolicy {
    RetryPolicy::builder()
        .max_retries(max_retries)
        .initial_delay(Duration::from_millis(1))
        .build()
}

fn guest_contact(email: &str) -> BookingContact {
    BookingContact::Guest {
        first_name: "Grace".to_string(),
        last_name: "Hopper".to_string(),
        email: email.to_string(),
        phone: None,
    }
}

#[tokio::test]
async fn test_conflict_is_retried_until_success() {
    init_tracing();

    let backend = MemoryBackend::new();
    backend.inject_commit_conflicts(2);
    let coordinator = TransactionCoordinator::with_policy(backend.clone(), fast_policy(3));

    let calls = Arc::new(AtomicU32::new(0));
    let calls_clone = Arc::clone(&calls);

    let result = coordinator
        .run(move |_conn| {
            let calls = Arc::clone(&calls_clone);
            async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok::<_, AccessError>(42)
            }
            .boxed()
        })
        .await;

    assert_eq!(result, Ok(42));
    // Two conflicted attempts plus the one that committed.
    assert_eq!(calls.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn test_exhausted_retries_become_transaction_failed() {
    let backend = MemoryBackend::new();
    backend.inject_commit_conflicts(10);
    let coordinator = TransactionCoordinator::with_policy(backend.clone(), fast_policy(3));

    let calls = Arc::new(AtomicU32::new(0));
    let calls_clone = Arc::clone(&calls);

    let result = coordinator
        .run(move |_conn| {
            let calls = Arc::clone(&calls_clone);
            async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok::<_, AccessError>(())
            }
            .boxed()
        })
        .await;

    assert_eq!(result, Err(AccessError::TransactionFailed { attempts: 4 }));
    // Initial attempt + 3 retries, then surrender.
    assert_eq!(calls.load(Ordering::SeqCst), 4);
}

#[tokio::test]
async fn test_non_conflict_failure_is_not_retried() {
    let backend = MemoryBackend::new();
    let coordinator = TransactionCoordinator::with_policy(backend.clone(), fast_policy(3));

    let calls = Arc::new(AtomicU32::new(0));
    let calls_clone = Arc::clone(&calls);

    let result = coordinator
        .run(move |_conn| {
            let calls = Arc::clone(&calls_clone);
            async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Err::<(), _>(AccessError::NotFound)
            }
            .boxed()
        })
        .await;

    assert_eq!(result, Err(AccessError::NotFound));
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_conflicted_issue_restarts_from_scratch() {
    let backend = MemoryBackend::new();
    let notifier = MockNotificationSender::new();
    backend.insert_booking(BookingId::from("B1"), guest_contact("a@x.com"));
    backend.inject_commit_conflicts(1);

    let service = GuestAccessService::new(
        backend.clone(),
        backend.clone(),
        notifier.clone(),
        AccessConfig::new(b"test-signing-secret".to_vec()).with_retry(fast_policy(3)),
    );

    let grant = service.issue(&BookingId::from("B1"), "a@x.com").await.unwrap();

    // The conflicted attempt's staged insert was discarded; only the
    // second attempt's row exists, and delivery ran exactly once, after
    // the successful commit.
    assert!(!grant.reused);
    assert_eq!(backend.credentials().len(), 1);
    assert_eq!(backend.credentials()[0].token, grant.token);
    assert_eq!(notifier.deliveries().len(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_issues_converge_on_one_credential() {
    init_tracing();

    let backend = MemoryBackend::new();
    let notifier = MockNotificationSender::new();
    backend.insert_booking(BookingId::from("B1"), guest_contact("a@x.com"));

    let service = GuestAccessService::new(
        backend.clone(),
        backend.clone(),
        notifier.clone(),
        AccessConfig::new(b"test-signing-secret".to_vec()).with_retry(fast_policy(8)),
    );

    let mut handles = Vec::new();
    for _ in 0..6 {
        let service = service.clone();
        handles.push(tokio::spawn(async move {
            service.issue(&BookingId::from("B1"), "a@x.com").await
        }));
    }

    let mut tokens = Vec::new();
    let mut minted = 0;
    for handle in handles {
        let grant = handle.await.unwrap().unwrap();
        if !grant.reused {
            minted += 1;
        }
        tokens.push(grant.token);
    }

    // Every call returned the same token value.
    tokens.dedup();
    assert_eq!(tokens.len(), 1);

    // Exactly one transaction actually inserted.
    assert_eq!(minted, 1);
    assert_eq!(backend.valid_credential_count(&BookingId::from("B1"), "a@x.com"), 1);
    assert_eq!(backend.credentials().len(), 1);
}
