//! Provider traits for external dependencies.
//!
//! These traits are **interfaces**, not implementations: the issuer,
//! verifier, and sweeper depend on them, and the runtime wires in
//! concrete implementations (`bookstay-postgres` in production, the
//! in-memory mocks in tests).

pub mod notify;
pub mod store;

pub use notify::{ConsoleNotificationSender, NotificationSender};
pub use store::CredentialStore;
