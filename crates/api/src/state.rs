use std::sync::Arc;

use tourdesk_events::NotificationDispatcher;

use crate::config::ServerConfig;
use crate::scanner::VirusScanner;
use crate::storage::DocumentStore;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// This is cheaply cloneable (inner data is behind `Arc` or is already `Clone`).
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub pool: tourdesk_db::DbPool,
    /// Server configuration.
    pub config: Arc<ServerConfig>,
    /// Fire-and-forget outbound messages (invitations, receipts).
    pub notifier: NotificationDispatcher,
    /// Where validated, scanned uploads are kept.
    pub documents: Arc<dyn DocumentStore>,
    pub scanner: Arc<dyn VirusScanner>,
}
