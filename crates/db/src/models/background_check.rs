use serde::Serialize;
use sqlx::FromRow;
use tourdesk_core::error::CoreError;
use tourdesk_core::prerequisites::{background_check_counts, BackgroundCheckStatus};
use tourdesk_core::types::{DbId, Timestamp};

/// A row from the `background_check_records` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct BackgroundCheckRecord {
    pub id: DbId,
    pub user_id: DbId,
    #[serde(skip_serializing)]
    pub document_ref: String,
    pub status: String,
    pub reviewed_by: Option<DbId>,
    pub submitted_at: Timestamp,
    pub completed_at: Option<Timestamp>,
}

impl BackgroundCheckRecord {
    pub fn status(&self) -> Result<BackgroundCheckStatus, CoreError> {
        BackgroundCheckStatus::from_str_value(&self.status)
    }

    /// Whether this check satisfies a recency window of `days` at `now`.
    pub fn counts_at(&self, now: Timestamp, days: i64) -> Result<bool, CoreError> {
        Ok(background_check_counts(self.status()?, self.completed_at, now, days))
    }
}
