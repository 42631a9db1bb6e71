//! # Bookstay Guest Access
//!
//! The transactional-consistency coordinator and the time-limited
//! access-credential subsystem of the Bookstay booking backend.
//!
//! ## Architecture
//!
//! Credential issuance runs as a single unit of work inside a
//! SERIALIZABLE database transaction:
//!
//! ```text
//! issue(booking_id, email)
//!   └─ TransactionCoordinator::run
//!        ├─ resolve booking contact (customer or guest)
//!        ├─ reuse existing valid credential, or
//!        └─ mint signed token + insert row
//!   └─ deliver notification (outside the transaction)
//! ```
//!
//! The coordinator retries the whole unit of work from scratch when the
//! database reports a serialization conflict, which is what keeps the
//! "at most one valid credential per `(booking_id, email)` pair"
//! invariant intact under concurrent requests: the losing transaction
//! restarts, re-reads, finds the winner's row, and reuses it.
//!
//! Verification is read-only and repeatable; an explicit [`mark_used`]
//! step exists for call sites that need single-use semantics.
//!
//! [`mark_used`]: GuestAccessService::mark_used
//!
//! ## Example
//!
//! ```rust
//! use bookstay_access::mocks::{MemoryBackend, MockNotificationSender};
//! use bookstay_access::{AccessConfig, GuestAccessService};
//! use bookstay_core::{BookingContact, BookingId};
//!
//! # async fn example() -> bookstay_core::Result<()> {
//! let backend = MemoryBackend::new();
//! backend.insert_booking(
//!     BookingId::from("B1"),
//!     BookingContact::Guest {
//!         first_name: "Grace".to_string(),
//!         last_name: "Hopper".to_string(),
//!         email: "grace@example.com".to_string(),
//!         phone: None,
//!     },
//! );
//!
//! let service = GuestAccessService::new(
//!     backend.clone(),
//!     backend,
//!     MockNotificationSender::new(),
//!     AccessConfig::new(b"process-wide-secret".to_vec()),
//! );
//!
//! let grant = service.issue(&BookingId::from("B1"), "grace@example.com").await?;
//! assert!(!grant.reused);
//! # Ok(())
//! # }
//! ```

#![deny(missing_docs)]
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]
#![deny(clippy::todo)]
#![deny(clippy::unimplemented)]

pub mod config;
pub mod coordinator;
pub mod issuer;
pub mod providers;
pub mod service;
pub mod sweeper;
pub mod token;
pub mod utils;
pub mod verifier;

#[cfg(feature = "test-utils")]
pub mod mocks;

pub use config::AccessConfig;
pub use coordinator::{RetryPolicy, TransactionCoordinator, TransactionSource};
pub use issuer::{CredentialIssuer, IssuedAccess};
pub use providers::{CredentialStore, NotificationSender};
pub use service::GuestAccessService;
pub use sweeper::CleanupSweeper;
pub use token::{TokenClaims, TokenSigner, GUEST_BOOKING_ACCESS_PURPOSE};
pub use verifier::{CredentialVerifier, RejectReason, VerifiedAccess, Verification};
