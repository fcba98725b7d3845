//! Cart and reservation history.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::Utc;
use serde::Deserialize;
use tourdesk_core::cart::{ensure_alternative_allowed, ensure_checkout_possible};
use tourdesk_core::error::CoreError;
use tourdesk_core::types::DbId;
use tourdesk_db::models::alternative::{AlternativeChoice, CreateAlternativeChoice};
use tourdesk_db::models::reservation::Reservation;
use tourdesk_db::repositories::{AlternativeChoiceRepo, ReservationRepo, TourRepo};

use crate::error::{AppError, AppResult};
use crate::middleware::rbac::RequireMember;
use crate::response::DataResponse;
use crate::state::AppState;

const CART_PAGE: &str = "/cart";
const RESERVATIONS_PAGE: &str = "/reservations";

#[derive(Debug, Deserialize)]
pub struct AlternativeRequest {
    pub tour_id: DbId,
}

/// GET /api/v1/cart
pub async fn get_cart(
    RequireMember(auth): RequireMember,
    State(state): State<AppState>,
) -> AppResult<Json<DataResponse<Vec<Reservation>>>> {
    let items = ReservationRepo::list_cart(&state.pool, auth.user_id).await?;
    Ok(Json(DataResponse { data: items }))
}

/// DELETE /api/v1/cart/{id}
///
/// Removing a pending item gives its seat back to the tour when it held one.
pub async fn remove_item(
    RequireMember(auth): RequireMember,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<StatusCode> {
    let not_found = || CoreError::NotFound {
        entity: "Reservation",
        id,
    };

    let item = ReservationRepo::find_by_id(&state.pool, id)
        .await?
        .filter(|r| r.user_id == auth.user_id)
        .ok_or_else(not_found)?;
    item.status()?
        .ensure_removable()
        .map_err(|e| AppError::from(e).redirect_to(CART_PAGE))?;

    let removed = ReservationRepo::remove_pending(&state.pool, id, auth.user_id)
        .await?
        .ok_or_else(|| CoreError::Conflict("Reservation has already been checked out".into()))?;

    tracing::info!(
        user_id = auth.user_id,
        reservation_id = id,
        tour_id = removed.tour_id,
        seat_status = %removed.seat_status,
        "Cart item removed"
    );
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/v1/cart/checkout
pub async fn checkout(
    RequireMember(auth): RequireMember,
    State(state): State<AppState>,
) -> AppResult<Json<DataResponse<Vec<Reservation>>>> {
    let pending = ReservationRepo::list_cart(&state.pool, auth.user_id).await?;
    ensure_checkout_possible(pending.len())?;

    let confirmed = ReservationRepo::checkout(&state.pool, auth.user_id).await?;

    tracing::info!(
        user_id = auth.user_id,
        items = confirmed.len(),
        "Cart checked out"
    );
    Ok(Json(DataResponse { data: confirmed }))
}

/// GET /api/v1/reservations
pub async fn list_reservations(
    RequireMember(auth): RequireMember,
    State(state): State<AppState>,
) -> AppResult<Json<DataResponse<Vec<Reservation>>>> {
    let reservations = ReservationRepo::list_for_user(&state.pool, auth.user_id).await?;
    Ok(Json(DataResponse { data: reservations }))
}

/// POST /api/v1/reservations/{id}/alternative
///
/// Record which other tour a waitlisted reservation would take instead.
/// Choosing again replaces the earlier choice.
pub async fn choose_alternative(
    RequireMember(auth): RequireMember,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<AlternativeRequest>,
) -> AppResult<(StatusCode, Json<DataResponse<AlternativeChoice>>)> {
    let reservation = ReservationRepo::find_by_id(&state.pool, id)
        .await?
        .filter(|r| r.user_id == auth.user_id)
        .ok_or(CoreError::NotFound {
            entity: "Reservation",
            id,
        })?;
    let alternative = TourRepo::find_listing(&state.pool, input.tour_id)
        .await?
        .ok_or(CoreError::NotFound {
            entity: "TourInstance",
            id: input.tour_id,
        })?;

    ensure_alternative_allowed(
        reservation.seat_status()?,
        reservation.tour_id,
        alternative.id,
        alternative.tour_date,
        Utc::now().date_naive(),
    )
    .map_err(|e| AppError::from(e).redirect_to(RESERVATIONS_PAGE))?;

    let choice = AlternativeChoiceRepo::upsert(
        &state.pool,
        &CreateAlternativeChoice {
            reservation_id: reservation.id,
            user_id: auth.user_id,
            original_tour_id: reservation.tour_id,
            alternative_tour_id: alternative.id,
        },
    )
    .await?;

    tracing::info!(
        user_id = auth.user_id,
        reservation_id = id,
        original_tour_id = reservation.tour_id,
        alternative_tour_id = alternative.id,
        "Alternative tour chosen"
    );
    Ok((StatusCode::CREATED, Json(DataResponse { data: choice })))
}
