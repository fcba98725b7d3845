//! Tour catalogue models.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use tourdesk_core::allocation::{available_seats, TourPricing};
use tourdesk_core::error::CoreError;
use tourdesk_core::types::{DbId, Timestamp};

/// A tour instance joined with its template and price tier.
///
/// `price_cents` is `None` when the template has no price tier.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct TourListing {
    pub id: DbId,
    pub template_id: DbId,
    pub title: String,
    pub description: Option<String>,
    pub tour_date: NaiveDate,
    pub capacity: i32,
    pub registered_count: i32,
    pub price_cents: Option<i64>,
}

impl TourListing {
    pub fn available_seats(&self) -> i32 {
        available_seats(self.capacity, self.registered_count)
    }

    /// Resolve into [`TourPricing`], failing if no price is configured.
    pub fn pricing(&self) -> Result<TourPricing, CoreError> {
        let price_cents = self.price_cents.ok_or_else(|| CoreError::TourDataUnavailable {
            tour_id: self.id,
            reason: "no price tier is configured for this tour".into(),
        })?;
        Ok(TourPricing {
            tour_id: self.id,
            title: self.title.clone(),
            price_cents,
            capacity: self.capacity,
            registered_count: self.registered_count,
        })
    }
}

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct PriceTier {
    pub id: DbId,
    pub name: String,
    pub price_cents: i64,
    pub created_at: Timestamp,
}

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct TourTemplate {
    pub id: DbId,
    pub title: String,
    pub description: Option<String>,
    pub price_tier_id: Option<DbId>,
    pub created_at: Timestamp,
}

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct TourInstance {
    pub id: DbId,
    pub template_id: DbId,
    pub tour_date: NaiveDate,
    pub capacity: i32,
    pub registered_count: i32,
    pub created_at: Timestamp,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateTourTemplate {
    pub title: String,
    pub description: Option<String>,
    pub price_tier_id: Option<DbId>,
}

/// DTO for scheduling a tour. `capacity` defaults to 13.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateTourInstance {
    pub template_id: DbId,
    pub tour_date: NaiveDate,
    pub capacity: Option<i32>,
}
