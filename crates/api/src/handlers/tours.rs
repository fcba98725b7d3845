//! Tour catalogue handlers.

use axum::extract::{Path, State};
use axum::Json;
use chrono::{NaiveDate, Utc};
use serde::Serialize;
use tourdesk_core::error::CoreError;
use tourdesk_core::types::DbId;
use tourdesk_db::models::tour::TourListing;
use tourdesk_db::repositories::TourRepo;

use crate::error::AppResult;
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

/// A tour with its availability worked out.
#[derive(Debug, Serialize)]
pub struct TourSummary {
    pub id: DbId,
    pub title: String,
    pub description: Option<String>,
    pub tour_date: NaiveDate,
    pub capacity: i32,
    pub registered_count: i32,
    pub available_seats: i32,
    pub price_cents: Option<i64>,
}

impl From<TourListing> for TourSummary {
    fn from(t: TourListing) -> Self {
        Self {
            available_seats: t.available_seats(),
            id: t.id,
            title: t.title,
            description: t.description,
            tour_date: t.tour_date,
            capacity: t.capacity,
            registered_count: t.registered_count,
            price_cents: t.price_cents,
        }
    }
}

/// GET /api/v1/tours
///
/// Tours from today onwards.
pub async fn list_tours(
    _auth: AuthUser,
    State(state): State<AppState>,
) -> AppResult<Json<DataResponse<Vec<TourSummary>>>> {
    let tours = TourRepo::list_upcoming(&state.pool, Utc::now().date_naive()).await?;
    Ok(Json(DataResponse {
        data: tours.into_iter().map(TourSummary::from).collect(),
    }))
}

/// GET /api/v1/tours/{id}
///
/// A tour must resolve to a price to be shown here; an unpriced tour is
/// reported as temporarily unavailable.
pub async fn get_tour(
    _auth: AuthUser,
    State(state): State<AppState>,
    Path(tour_id): Path<DbId>,
) -> AppResult<Json<DataResponse<TourSummary>>> {
    let listing = TourRepo::find_listing(&state.pool, tour_id)
        .await?
        .ok_or(CoreError::NotFound {
            entity: "TourInstance",
            id: tour_id,
        })?;
    listing.pricing()?;
    Ok(Json(DataResponse {
        data: TourSummary::from(listing),
    }))
}

/// GET /api/v1/tours/{id}/alternatives
///
/// Upcoming tours other than this one, soonest first, for a waitlisted
/// booker to pick from.
pub async fn list_alternatives(
    _auth: AuthUser,
    State(state): State<AppState>,
    Path(tour_id): Path<DbId>,
) -> AppResult<Json<DataResponse<Vec<TourSummary>>>> {
    TourRepo::find_instance(&state.pool, tour_id)
        .await?
        .ok_or(CoreError::NotFound {
            entity: "TourInstance",
            id: tour_id,
        })?;
    let tours = TourRepo::list_upcoming(&state.pool, Utc::now().date_naive()).await?;
    Ok(Json(DataResponse {
        data: tours
            .into_iter()
            .filter(|t| t.id != tour_id)
            .map(TourSummary::from)
            .collect(),
    }))
}
