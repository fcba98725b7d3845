use async_trait::async_trait;

use crate::dispatcher::{DeliveryError, Notifier};
use crate::message::Notification;

/// Writes notifications to the log instead of sending them.
pub struct LogDelivery;

#[async_trait]
impl Notifier for LogDelivery {
    fn channel(&self) -> &'static str {
        "log"
    }

    async fn deliver(&self, message: &Notification) -> Result<(), DeliveryError> {
        tracing::info!(
            kind = message.kind,
            to = %message.to,
            subject = %message.subject,
            body = %message.body,
            "Notification (not sent, SMTP disabled)"
        );
        Ok(())
    }
}
