//! # Bookstay Core
//!
//! Domain types shared by the Bookstay guest-access subsystem: access
//! credentials, booking contact resolution, and the error taxonomy.
//!
//! This crate is deliberately free of I/O dependencies. Persistence and
//! delivery live behind provider traits in `bookstay-access`, with
//! concrete stores in `bookstay-postgres`.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod contact;
pub mod credential;
pub mod error;

pub use contact::{BookingContact, ContactKind};
pub use credential::{AccessCredential, BookingId, CredentialId};
pub use error::{AccessError, Result};
