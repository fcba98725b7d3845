use serde::Serialize;
use sqlx::FromRow;
use tourdesk_core::types::{DbId, Timestamp};

/// An upload that was rejected by, or could not be checked by, the virus
/// scanner and is waiting for staff to look at it.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct FlaggedUpload {
    pub id: DbId,
    pub user_id: DbId,
    pub kind: String,
    pub filename: String,
    pub reason: String,
    pub resolved: bool,
    pub created_at: Timestamp,
}

#[derive(Debug, Clone)]
pub struct CreateFlaggedUpload {
    pub user_id: DbId,
    pub kind: String,
    pub filename: String,
    pub reason: String,
}
