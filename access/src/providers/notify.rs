//! Notification provider trait.

use bookstay_core::{BookingContact, BookingId, Result};
use std::future::Future;
use tracing::info;

/// Notification collaborator.
///
/// This trait abstracts over the channel that delivers an issued
/// credential to the booking's contact (email or otherwise). Delivery
/// runs *after* the issuance transaction has committed; a failure here
/// never rolls the credential back.
pub trait NotificationSender: Send + Sync {
    /// Deliver the token to the resolved contact.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying channel rejects or fails the
    /// delivery.
    fn deliver(
        &self,
        contact: &BookingContact,
        token: &str,
        booking_id: &BookingId,
    ) -> impl Future<Output = Result<()>> + Send;
}

/// Console notification sender.
///
/// Logs the delivery instead of sending it. Useful for development
/// environments where no real channel is configured.
#[derive(Clone, Debug, Default)]
pub struct ConsoleNotificationSender;

impl ConsoleNotificationSender {
    /// Create a new console notification sender.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl NotificationSender for ConsoleNotificationSender {
    async fn deliver(
        &self,
        contact: &BookingContact,
        token: &str,
        booking_id: &BookingId,
    ) -> Result<()> {
        info!(
            to = %contact.email(),
            name = %contact.display_name(),
            kind = contact.kind().as_str(),
            booking_id = %booking_id,
            token = %token,
            "📧 Guest access notification (development mode)"
        );
        Ok(())
    }
}
