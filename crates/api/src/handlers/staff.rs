//! Staff review queues: background checks and flagged uploads.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use tourdesk_core::error::CoreError;
use tourdesk_core::prerequisites::BackgroundCheckStatus;
use tourdesk_core::types::DbId;
use tourdesk_db::models::background_check::BackgroundCheckRecord;
use tourdesk_db::models::flagged_upload::FlaggedUpload;
use tourdesk_db::repositories::{BackgroundCheckRepo, FlaggedUploadRepo};

use crate::error::AppResult;
use crate::middleware::rbac::RequireStaff;
use crate::response::DataResponse;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct DecisionRequest {
    pub decision: BackgroundCheckStatus,
}

/// GET /api/v1/staff/background-checks
pub async fn list_pending_background_checks(
    RequireStaff(_staff): RequireStaff,
    State(state): State<AppState>,
) -> AppResult<Json<DataResponse<Vec<BackgroundCheckRecord>>>> {
    let records = BackgroundCheckRepo::list_pending(&state.pool).await?;
    Ok(Json(DataResponse { data: records }))
}

/// POST /api/v1/staff/background-checks/{id}/decision
///
/// Approve or reject a pending check. An approval starts the recency window
/// from now.
pub async fn decide_background_check(
    RequireStaff(staff): RequireStaff,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<DecisionRequest>,
) -> AppResult<Json<DataResponse<BackgroundCheckRecord>>> {
    let record = BackgroundCheckRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or(CoreError::NotFound {
            entity: "BackgroundCheck",
            id,
        })?;
    record.status()?.validate_decision(input.decision)?;

    // Another reviewer may have decided it since the read above.
    let decided = BackgroundCheckRepo::decide(&state.pool, id, input.decision, staff.user_id)
        .await?
        .ok_or_else(|| CoreError::Conflict("Background check was already decided".into()))?;

    tracing::info!(
        background_check_id = id,
        user_id = decided.user_id,
        reviewer_id = staff.user_id,
        decision = input.decision.as_str(),
        "Background check decided"
    );

    Ok(Json(DataResponse { data: decided }))
}

/// GET /api/v1/staff/flagged-uploads
pub async fn list_flagged_uploads(
    RequireStaff(_staff): RequireStaff,
    State(state): State<AppState>,
) -> AppResult<Json<DataResponse<Vec<FlaggedUpload>>>> {
    let uploads = FlaggedUploadRepo::list_open(&state.pool).await?;
    Ok(Json(DataResponse { data: uploads }))
}

/// POST /api/v1/staff/flagged-uploads/{id}/resolve
pub async fn resolve_flagged_upload(
    RequireStaff(staff): RequireStaff,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<StatusCode> {
    if !FlaggedUploadRepo::resolve(&state.pool, id).await? {
        return Err(CoreError::NotFound {
            entity: "FlaggedUpload",
            id,
        }
        .into());
    }
    tracing::info!(flagged_upload_id = id, reviewer_id = staff.user_id, "Flagged upload resolved");
    Ok(StatusCode::NO_CONTENT)
}
