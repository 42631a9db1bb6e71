//! Booking contact resolution types.
//!
//! A booking has exactly one authoritative contact at any time: either the
//! linked account holder, or a guest contact record keyed by booking id.
//! The two sources are modeled as an explicit sum type so callers can
//! never observe a half-populated contact.

use serde::{Deserialize, Serialize};

/// Classification of a booking's authoritative contact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContactKind {
    /// Contact comes from the linked customer account.
    Customer,

    /// Contact comes from a guest record attached to the booking.
    Guest,
}

impl ContactKind {
    /// Stable string form, used in logs and API payloads.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Customer => "customer",
            Self::Guest => "guest",
        }
    }
}

/// The authoritative contact for a booking.
///
/// Exactly one variant applies to a booking at any instant, depending on
/// whether the booking carries an account reference.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BookingContact {
    /// The linked account holder.
    Customer {
        /// Account holder's first name.
        first_name: String,
        /// Account holder's last name.
        last_name: String,
        /// Account email; the matching key for credential issuance.
        email: String,
        /// Account phone number, if on file.
        phone: Option<String>,
        /// Account username, if the account has one.
        username: Option<String>,
    },

    /// A guest contact record keyed by booking id.
    Guest {
        /// Guest's first name.
        first_name: String,
        /// Guest's last name.
        last_name: String,
        /// Guest email; the matching key for credential issuance.
        email: String,
        /// Guest phone number, if provided.
        phone: Option<String>,
    },
}

impl BookingContact {
    /// The contact classification.
    #[must_use]
    pub const fn kind(&self) -> ContactKind {
        match self {
            Self::Customer { .. } => ContactKind::Customer,
            Self::Guest { .. } => ContactKind::Guest,
        }
    }

    /// The contact email address.
    #[must_use]
    pub fn email(&self) -> &str {
        match self {
            Self::Customer { email, .. } | Self::Guest { email, .. } => email,
        }
    }

    /// The contact's full display name.
    #[must_use]
    pub fn display_name(&self) -> String {
        match self {
            Self::Customer {
                first_name,
                last_name,
                ..
            }
            | Self::Guest {
                first_name,
                last_name,
                ..
            } => format!("{first_name} {last_name}"),
        }
    }
}
