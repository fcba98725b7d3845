//! Reservation lifecycle in the cart.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::allocation::SeatStatus;
use crate::error::CoreError;
use crate::types::DbId;

pub const RESERVATION_PENDING: &str = "pending";
pub const RESERVATION_CONFIRMED: &str = "confirmed";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReservationStatus {
    /// Sitting in the cart, not yet checked out.
    Pending,
    /// Checked out.
    Confirmed,
}

impl ReservationStatus {
    pub fn from_str_value(s: &str) -> Result<Self, CoreError> {
        match s {
            RESERVATION_PENDING => Ok(Self::Pending),
            RESERVATION_CONFIRMED => Ok(Self::Confirmed),
            _ => Err(CoreError::Internal(format!(
                "Unknown reservation status '{s}'"
            ))),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => RESERVATION_PENDING,
            Self::Confirmed => RESERVATION_CONFIRMED,
        }
    }

    /// Checked-out reservations cannot be pulled back out of the cart.
    pub fn ensure_removable(&self) -> Result<(), CoreError> {
        match self {
            Self::Pending => Ok(()),
            Self::Confirmed => Err(CoreError::Conflict(
                "Reservation has already been checked out".into(),
            )),
        }
    }
}

/// Checkout needs at least one pending item.
pub fn ensure_checkout_possible(pending_items: usize) -> Result<(), CoreError> {
    if pending_items == 0 {
        return Err(CoreError::Validation("Your cart is empty".into()));
    }
    Ok(())
}

/// A waitlisted reservation may name another upcoming tour it would take
/// instead.
pub fn ensure_alternative_allowed(
    seat_status: SeatStatus,
    original_tour_id: DbId,
    alternative_tour_id: DbId,
    alternative_date: NaiveDate,
    today: NaiveDate,
) -> Result<(), CoreError> {
    if seat_status != SeatStatus::Waitlisted {
        return Err(CoreError::Conflict(
            "Only waitlisted reservations can choose an alternative tour".into(),
        ));
    }
    if alternative_tour_id == original_tour_id {
        return Err(CoreError::Validation(
            "Choose a different tour from the one you are waitlisted on".into(),
        ));
    }
    if alternative_date < today {
        return Err(CoreError::Validation(
            "The alternative tour has already taken place".into(),
        ));
    }
    Ok(())
}
