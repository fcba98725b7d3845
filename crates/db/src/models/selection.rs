use serde::Serialize;
use sqlx::FromRow;
use tourdesk_core::checklist::Attendance;
use tourdesk_core::error::CoreError;
use tourdesk_core::types::{DbId, Timestamp};

pub const SELECTION_PENDING: &str = "pending";
pub const SELECTION_RESERVED: &str = "reserved";

/// A guardian's in-progress student selection for one tour.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct TemporarySelection {
    pub id: DbId,
    pub parent_id: DbId,
    pub tour_id: DbId,
    /// Ordered; seats are assigned in this order.
    pub student_ids: Vec<DbId>,
    pub attendance: Option<String>,
    pub waitlist_acknowledged: bool,
    pub status: String,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl TemporarySelection {
    pub fn attendance(&self) -> Result<Option<Attendance>, CoreError> {
        self.attendance
            .as_deref()
            .map(Attendance::from_str_value)
            .transpose()
    }
}
