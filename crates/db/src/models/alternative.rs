//! Alternative tour preferences for waitlisted reservations.

use serde::Serialize;
use sqlx::FromRow;
use tourdesk_core::types::{DbId, Timestamp};

/// A row from the `alternative_choices` table. One per reservation; choosing
/// again replaces the earlier preference.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct AlternativeChoice {
    pub id: DbId,
    pub reservation_id: DbId,
    pub user_id: DbId,
    pub original_tour_id: DbId,
    pub alternative_tour_id: DbId,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

#[derive(Debug, Clone)]
pub struct CreateAlternativeChoice {
    pub reservation_id: DbId,
    pub user_id: DbId,
    pub original_tour_id: DbId,
    pub alternative_tour_id: DbId,
}
