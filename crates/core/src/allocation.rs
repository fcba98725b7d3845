//! Seat arithmetic for tour instances.
//!
//! The database claims seats one at a time with a conditional increment, so
//! the planner here is what a batch *would* look like against a snapshot of
//! the counter. Both agree as long as nobody else books in between.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::types::{DbId, Timestamp};

/// Capacity of a tour instance when none is configured.
pub const DEFAULT_TOUR_CAPACITY: i32 = 13;

pub const SEAT_CONFIRMED: &str = "confirmed";
pub const SEAT_WAITLISTED: &str = "waitlisted";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SeatStatus {
    Confirmed,
    Waitlisted,
}

impl SeatStatus {
    pub fn from_str_value(s: &str) -> Result<Self, CoreError> {
        match s {
            SEAT_CONFIRMED => Ok(Self::Confirmed),
            SEAT_WAITLISTED => Ok(Self::Waitlisted),
            _ => Err(CoreError::Internal(format!("Unknown seat status '{s}'"))),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Confirmed => SEAT_CONFIRMED,
            Self::Waitlisted => SEAT_WAITLISTED,
        }
    }

    /// Status for a seat whose conditional claim did or did not succeed.
    pub fn from_claim(claimed: bool) -> Self {
        if claimed {
            Self::Confirmed
        } else {
            Self::Waitlisted
        }
    }
}

/// Free seats, never negative even if the counter was pushed past capacity
/// by imported data.
pub fn available_seats(capacity: i32, registered_count: i32) -> i32 {
    (capacity - registered_count).max(0)
}

/// Assign seat statuses in submission order: the first `available` students
/// are confirmed, the rest waitlisted.
pub fn plan_batch(student_ids: &[DbId], available: i32) -> Vec<(DbId, SeatStatus)> {
    let available = usize::try_from(available).unwrap_or(0);
    student_ids
        .iter()
        .enumerate()
        .map(|(i, &id)| (id, SeatStatus::from_claim(i < available)))
        .collect()
}

/// Reject empty or duplicated batches before touching the database.
pub fn validate_batch(student_ids: &[DbId]) -> Result<(), CoreError> {
    if student_ids.is_empty() {
        return Err(CoreError::Validation("No students selected".into()));
    }
    let mut seen = std::collections::HashSet::with_capacity(student_ids.len());
    for id in student_ids {
        if !seen.insert(id) {
            return Err(CoreError::Validation(format!(
                "Student {id} appears more than once in the selection"
            )));
        }
    }
    Ok(())
}

/// Price and availability of a tour instance, resolved in a single read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TourPricing {
    pub tour_id: DbId,
    pub title: String,
    pub price_cents: i64,
    pub capacity: i32,
    pub registered_count: i32,
}

impl TourPricing {
    pub fn available(&self) -> i32 {
        available_seats(self.capacity, self.registered_count)
    }

    /// The snapshot stored with each reservation so later price changes do
    /// not rewrite history.
    pub fn snapshot(&self, priced_at: Timestamp) -> PricingSnapshot {
        PricingSnapshot {
            tour_title: self.title.clone(),
            price_cents: self.price_cents,
            capacity: self.capacity,
            registered_count: self.registered_count,
            priced_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PricingSnapshot {
    pub tour_title: String,
    pub price_cents: i64,
    pub capacity: i32,
    pub registered_count: i32,
    pub priced_at: Timestamp,
}
