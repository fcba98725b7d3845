//! Reservation checklist handlers.

use axum::extract::{Path, State};
use axum::Json;
use tourdesk_core::types::DbId;

use crate::engine::checklist::{self, ChecklistView, SubmitOutcome};
use crate::error::AppResult;
use crate::middleware::rbac::RequireMember;
use crate::response::DataResponse;
use crate::state::AppState;

/// GET /api/v1/tours/{id}/checklist
///
/// Where the caller stands for this tour. Evaluating twice without any
/// change in between gives the same answer.
pub async fn get_checklist(
    RequireMember(auth): RequireMember,
    State(state): State<AppState>,
    Path(tour_id): Path<DbId>,
) -> AppResult<Json<DataResponse<ChecklistView>>> {
    let view = checklist::evaluate(&state, auth.user_id, tour_id).await?;
    Ok(Json(DataResponse { data: view }))
}

/// POST /api/v1/tours/{id}/checklist/submit
///
/// Re-evaluate and, if every gate passes, reserve seats. A blocked checklist
/// is not an error: the response says where to go next.
pub async fn submit_checklist(
    RequireMember(auth): RequireMember,
    State(state): State<AppState>,
    Path(tour_id): Path<DbId>,
) -> AppResult<Json<DataResponse<SubmitOutcome>>> {
    let outcome = checklist::submit(&state, auth.user_id, tour_id)
        .await
        .map_err(|e| e.redirect_to(format!("/tours/{tour_id}")))?;
    Ok(Json(DataResponse { data: outcome }))
}
