//! Delivery channels for outbound notifications.

pub mod email;
pub mod log;

use std::sync::Arc;

use crate::dispatcher::Notifier;

/// SMTP when configured, otherwise log-only.
pub fn notifier_from_config(config: Option<email::EmailConfig>) -> Arc<dyn Notifier> {
    match config {
        Some(config) => {
            tracing::info!(smtp_host = %config.smtp_host, "Email delivery enabled");
            Arc::new(email::EmailDelivery::new(config))
        }
        None => {
            tracing::info!("SMTP_HOST not set, notifications will only be logged");
            Arc::new(log::LogDelivery)
        }
    }
}
