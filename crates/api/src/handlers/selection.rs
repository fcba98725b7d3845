//! Guardian student-selection handlers.

use axum::extract::{Path, State};
use axum::Json;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tourdesk_core::age::{band_on, AgeBand, MAX_STUDENT_AGE};
use tourdesk_core::allocation::{plan_batch, validate_batch, SeatStatus};
use tourdesk_core::checklist::Attendance;
use tourdesk_core::error::CoreError;
use tourdesk_core::roles::Role;
use tourdesk_core::types::DbId;
use tourdesk_db::models::selection::TemporarySelection;
use tourdesk_db::repositories::{AccountRepo, LinkRepo, SelectionRepo, TourRepo};

use crate::error::AppResult;
use crate::middleware::rbac::RequireGuardian;
use crate::response::DataResponse;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct SelectStudentsRequest {
    /// Ordered: earlier students are first in line for seats.
    pub student_ids: Vec<DbId>,
}

#[derive(Debug, Serialize)]
pub struct SelectionResponse {
    pub selection: TemporarySelection,
    pub available_seats: i32,
    /// How many of the selected students would be waitlisted if seats were
    /// requested now.
    pub projected_waitlisted: usize,
}

#[derive(Debug, Deserialize)]
pub struct AttendanceRequest {
    pub attendance: Attendance,
}

fn selection_not_found(tour_id: DbId) -> CoreError {
    CoreError::NotFound {
        entity: "TemporarySelection",
        id: tour_id,
    }
}

/// POST /api/v1/tours/{id}/selection
///
/// Store which linked students the guardian is booking for. Replacing a
/// selection clears any earlier waitlist acknowledgement. Students known to
/// be past student age are refused here; students without a birthdate are
/// accepted and caught by the checklist.
pub async fn select_students(
    RequireGuardian(auth): RequireGuardian,
    State(state): State<AppState>,
    Path(tour_id): Path<DbId>,
    Json(input): Json<SelectStudentsRequest>,
) -> AppResult<Json<DataResponse<SelectionResponse>>> {
    validate_batch(&input.student_ids)?;

    let tour = TourRepo::find_listing(&state.pool, tour_id)
        .await?
        .ok_or(CoreError::NotFound {
            entity: "TourInstance",
            id: tour_id,
        })?;

    let linked =
        LinkRepo::linked_account_ids(&state.pool, Role::Guardian, auth.user_id, true).await?;
    if let Some(unlinked) = input.student_ids.iter().find(|id| !linked.contains(id)) {
        return Err(CoreError::Validation(format!(
            "Student {unlinked} is not linked to your account"
        ))
        .into());
    }

    let today = Utc::now().date_naive();
    let students = AccountRepo::find_many(&state.pool, &input.student_ids).await?;
    if let Some(student) = students
        .iter()
        .find(|s| band_on(s.birthdate, today) == Some(AgeBand::OverAge))
    {
        return Err(CoreError::Validation(format!(
            "{} is older than {MAX_STUDENT_AGE} and cannot join a student tour",
            student.name
        ))
        .into());
    }

    let selection =
        SelectionRepo::upsert_students(&state.pool, auth.user_id, tour_id, &input.student_ids)
            .await?;

    let available_seats = tour.available_seats();
    let projected_waitlisted = plan_batch(&selection.student_ids, available_seats)
        .iter()
        .filter(|(_, status)| *status == SeatStatus::Waitlisted)
        .count();

    tracing::info!(
        user_id = auth.user_id,
        tour_id,
        selected = selection.student_ids.len(),
        projected_waitlisted,
        "Student selection stored"
    );

    Ok(Json(DataResponse {
        data: SelectionResponse {
            selection,
            available_seats,
            projected_waitlisted,
        },
    }))
}

/// POST /api/v1/tours/{id}/selection/acknowledge-waitlist
pub async fn acknowledge_waitlist(
    RequireGuardian(auth): RequireGuardian,
    State(state): State<AppState>,
    Path(tour_id): Path<DbId>,
) -> AppResult<Json<DataResponse<TemporarySelection>>> {
    let selection = SelectionRepo::acknowledge_waitlist(&state.pool, auth.user_id, tour_id)
        .await?
        .ok_or_else(|| selection_not_found(tour_id))?;
    Ok(Json(DataResponse { data: selection }))
}

/// POST /api/v1/tours/{id}/attendance
///
/// Declare whether the guardian will attend the tour themself.
pub async fn declare_attendance(
    RequireGuardian(auth): RequireGuardian,
    State(state): State<AppState>,
    Path(tour_id): Path<DbId>,
    Json(input): Json<AttendanceRequest>,
) -> AppResult<Json<DataResponse<TemporarySelection>>> {
    let selection =
        SelectionRepo::set_attendance(&state.pool, auth.user_id, tour_id, input.attendance)
            .await?
            .ok_or_else(|| selection_not_found(tour_id))?;

    tracing::info!(
        user_id = auth.user_id,
        tour_id,
        attendance = input.attendance.as_str(),
        "Attendance declared"
    );
    Ok(Json(DataResponse { data: selection }))
}
