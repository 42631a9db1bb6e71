//! Error types for guest-access operations.

use thiserror::Error;

/// Result type alias for guest-access operations.
pub type Result<T> = std::result::Result<T, AccessError>;

/// Error taxonomy for credential issuance, verification, and the
/// transactional coordinator.
///
/// `SerializationConflict` is recovered internally by the coordinator's
/// retry loop and is not expected to reach callers; every other variant is
/// a typed outcome request handlers can map to a response deterministically.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AccessError {
    /// Malformed input, rejected before any transaction starts.
    #[error("Invalid request: {reason}")]
    Validation {
        /// What was wrong with the input.
        reason: String,
    },

    /// Booking absent, or the supplied email does not match its contact.
    ///
    /// Deliberately indistinguishable to callers which of the two failed.
    #[error("Booking not found")]
    NotFound,

    /// The database aborted the transaction because a concurrent
    /// transaction made the outcome non-serializable.
    #[error("Transaction serialization conflict")]
    SerializationConflict,

    /// Conflict retries exhausted; the caller may retry later.
    #[error("Transaction failed after {attempts} attempts")]
    TransactionFailed {
        /// Number of attempts made, including the first.
        attempts: u32,
    },

    /// Database operation failed for a non-conflict reason.
    #[error("Database error: {0}")]
    Database(String),

    /// The credential was committed but the notification collaborator
    /// failed afterwards. The credential remains valid; a retried `issue`
    /// for the same pair will reuse it rather than mint a duplicate.
    #[error("Credential issued but delivery failed")]
    DeliveryFailed {
        /// The committed token.
        token: String,
        /// Whether the committed credential was a reused one.
        reused: bool,
    },

    /// Internal failure that should not occur in normal operation
    /// (should not be exposed to users).
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AccessError {
    /// Shorthand for a validation failure.
    pub fn validation(reason: impl Into<String>) -> Self {
        Self::Validation {
            reason: reason.into(),
        }
    }

    /// Returns `true` for the conflict signal the coordinator retries on.
    #[must_use]
    pub const fn is_serialization_conflict(&self) -> bool {
        matches!(self, Self::SerializationConflict)
    }

    /// Returns `true` if the condition is transient and a later retry of
    /// the whole operation may succeed.
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::SerializationConflict | Self::TransactionFailed { .. } | Self::Database(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_conflict_classification() {
        assert!(AccessError::SerializationConflict.is_serialization_conflict());
        assert!(!AccessError::NotFound.is_serialization_conflict());
        assert!(!AccessError::Database("boom".to_string()).is_serialization_conflict());
    }

    #[test]
    fn test_transient_classification() {
        assert!(AccessError::SerializationConflict.is_transient());
        assert!(AccessError::TransactionFailed { attempts: 4 }.is_transient());
        assert!(!AccessError::NotFound.is_transient());
        assert!(
            !AccessError::DeliveryFailed {
                token: "t".to_string(),
                reused: false,
            }
            .is_transient()
        );
    }
}
