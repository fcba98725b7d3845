//! Outbound notifications.
//!
//! - [`Notification`]: a rendered message and its recipient, with builders
//!   for link invitations, link requests and reservation receipts.
//! - [`Notifier`]: delivery channel abstraction.
//! - [`delivery`]: SMTP delivery ([`EmailDelivery`]) and a log-only
//!   fallback ([`LogDelivery`]) used when SMTP is not configured.
//! - [`NotificationDispatcher`]: fire-and-forget sending. Failures are
//!   logged and never reach the request that triggered them.

pub mod delivery;
pub mod dispatcher;
pub mod message;

pub use delivery::email::{EmailConfig, EmailDelivery, EmailError};
pub use delivery::log::LogDelivery;
pub use delivery::notifier_from_config;
pub use dispatcher::{DeliveryError, NotificationDispatcher, Notifier};
pub use message::Notification;
