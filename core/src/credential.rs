//! Access credential records and identifiers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Booking identifier.
///
/// Bookings are owned by the surrounding reservation system; this core
/// only references them, so the identifier is carried as an opaque string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BookingId(pub String);

impl BookingId {
    /// Create a booking id from any string-like value.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The raw identifier.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BookingId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for BookingId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

/// Credential identifier, generated at issuance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CredentialId(pub Uuid);

impl CredentialId {
    /// Generate a fresh credential id.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for CredentialId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for CredentialId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One issued grant of temporary read access to a booking.
///
/// Many credentials may exist over a booking's life; historical rows for a
/// `(booking_id, email)` pair are retained once expired or used, so the
/// pair carries no uniqueness constraint. The `token` string is unique
/// across all credentials ever issued.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccessCredential {
    /// Credential id.
    pub id: CredentialId,

    /// Booking this credential grants access to.
    pub booking_id: BookingId,

    /// Contact address the credential was issued to. Together with
    /// `booking_id` this forms the matching key for reuse lookups.
    pub email: String,

    /// Opaque signed token string.
    pub token: String,

    /// Absolute expiry instant (issuance time + configured TTL).
    pub expires_at: DateTime<Utc>,

    /// Consumed flag. Set only by an explicit consume action, never by
    /// verification.
    pub used: bool,

    /// Issuance timestamp.
    pub created_at: DateTime<Utc>,
}

impl AccessCredential {
    /// Whether this credential is valid at `now`: not expired and not
    /// consumed.
    #[must_use]
    pub fn is_valid(&self, now: DateTime<Utc>) -> bool {
        self.expires_at > now && !self.used
    }
}
