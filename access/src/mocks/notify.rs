//! Mock notification sender for testing.

use crate::providers::NotificationSender;
use bookstay_core::{AccessError, BookingContact, BookingId, Result};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

/// One recorded delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryRecord {
    /// Recipient email.
    pub email: String,
    /// Delivered token.
    pub token: String,
    /// Booking the token grants access to.
    pub booking_id: BookingId,
}

/// Mock notification sender.
///
/// Records deliveries instead of sending them, with a switch to
/// simulate collaborator failure.
#[derive(Debug, Clone, Default)]
pub struct MockNotificationSender {
    deliveries: Arc<Mutex<Vec<DeliveryRecord>>>,
    failing: Arc<AtomicBool>,
}

impl MockNotificationSender {
    /// Create a mock sender that succeeds.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Make subsequent deliveries fail (or succeed again).
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// All recorded deliveries, in order.
    #[must_use]
    pub fn deliveries(&self) -> Vec<DeliveryRecord> {
        self.deliveries.lock().unwrap().clone()
    }
}

impl NotificationSender for MockNotificationSender {
    async fn deliver(
        &self,
        contact: &BookingContact,
        token: &str,
        booking_id: &BookingId,
    ) -> Result<()> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(AccessError::Internal(
                "notification channel unavailable".to_string(),
            ));
        }

        self.deliveries.lock().unwrap().push(DeliveryRecord {
            email: contact.email().to_string(),
            token: token.to_string(),
            booking_id: booking_id.clone(),
        });
        Ok(())
    }
}
