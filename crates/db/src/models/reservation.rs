//! Reservation ledger model.

use serde::Serialize;
use sqlx::FromRow;
use tourdesk_core::allocation::SeatStatus;
use tourdesk_core::cart::ReservationStatus;
use tourdesk_core::error::CoreError;
use tourdesk_core::types::{DbId, Timestamp};

/// A row from the `reservations` table. Pending rows are the cart.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Reservation {
    pub id: DbId,
    pub user_id: DbId,
    pub parent_id: Option<DbId>,
    pub student_id: DbId,
    pub tour_id: DbId,
    pub status: String,
    pub seat_status: String,
    pub price_cents: i64,
    pub pricing_snapshot: serde_json::Value,
    pub added_at: Timestamp,
    pub confirmed_at: Option<Timestamp>,
}

impl Reservation {
    pub fn status(&self) -> Result<ReservationStatus, CoreError> {
        ReservationStatus::from_str_value(&self.status)
    }

    pub fn seat_status(&self) -> Result<SeatStatus, CoreError> {
        SeatStatus::from_str_value(&self.seat_status)
    }
}

/// Input for one seat request within a batch.
#[derive(Debug, Clone)]
pub struct SeatRequest {
    pub user_id: DbId,
    pub parent_id: Option<DbId>,
    pub student_id: DbId,
    pub tour_id: DbId,
    pub price_cents: i64,
    pub pricing_snapshot: serde_json::Value,
}

/// Outcome for a single student in a reservation batch.
#[derive(Debug, Clone, Serialize)]
pub struct SeatAssignment {
    pub student_id: DbId,
    pub seat_status: SeatStatus,
    /// The student already held a reservation for this tour; nothing new
    /// was written for them.
    pub already_reserved: bool,
    pub reservation: Reservation,
}

/// Result of [`crate::repositories::ReservationRepo::reserve_seats`].
#[derive(Debug, Clone, Serialize)]
pub struct ReservationBatch {
    pub tour_id: DbId,
    pub assignments: Vec<SeatAssignment>,
    /// Seats newly claimed by this batch.
    pub confirmed_added: i32,
}

impl ReservationBatch {
    pub fn count(&self, status: SeatStatus) -> usize {
        self.assignments
            .iter()
            .filter(|a| a.seat_status == status)
            .count()
    }
}
