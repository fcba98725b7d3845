//! Fire-and-forget notification dispatch.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::task::JoinHandle;

use crate::delivery::email::EmailError;
use crate::message::Notification;

#[derive(Debug, thiserror::Error)]
pub enum DeliveryError {
    #[error(transparent)]
    Email(#[from] EmailError),

    #[error("Delivery failed: {0}")]
    Other(String),
}

/// A channel that can deliver a [`Notification`].
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Channel name used in logs.
    fn channel(&self) -> &'static str;

    async fn deliver(&self, message: &Notification) -> Result<(), DeliveryError>;
}

/// Sends notifications on a background task so callers never wait on, or
/// fail because of, the delivery channel.
#[derive(Clone)]
pub struct NotificationDispatcher {
    notifier: Arc<dyn Notifier>,
}

impl NotificationDispatcher {
    pub fn new(notifier: Arc<dyn Notifier>) -> Self {
        Self { notifier }
    }

    /// Queue a message for delivery. The returned handle may be ignored.
    pub fn dispatch(&self, message: Notification) -> JoinHandle<()> {
        let notifier = Arc::clone(&self.notifier);
        tokio::spawn(async move {
            match notifier.deliver(&message).await {
                Ok(()) => {
                    tracing::debug!(
                        channel = notifier.channel(),
                        kind = message.kind,
                        to = %message.to,
                        "Notification delivered"
                    );
                }
                Err(e) => {
                    tracing::warn!(
                        channel = notifier.channel(),
                        kind = message.kind,
                        to = %message.to,
                        error = %e,
                        "Notification delivery failed"
                    );
                }
            }
        })
    }
}
