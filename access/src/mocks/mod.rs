//! Mock providers for testing.
//!
//! These run the full issuance/verification logic at memory speed, with
//! a transaction simulator that detects write conflicts the way a
//! serializable database engine would (first committer wins).

mod memory;
mod notify;

pub use memory::{MemoryBackend, MemoryTxn};
pub use notify::{DeliveryRecord, MockNotificationSender};
