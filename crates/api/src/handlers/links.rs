//! Guardian/minor link handlers.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use tourdesk_core::error::CoreError;
use tourdesk_core::roles::Role;
use tourdesk_core::types::DbId;
use tourdesk_db::models::account::{AccountResponse, StudentProfile};
use tourdesk_db::models::link::{AccountLink, LinkedCounterpart};
use tourdesk_db::repositories::{AccountRepo, LinkRepo};

use crate::engine::linking::{self, LinkRequestResult};
use crate::error::{AppError, AppResult};
use crate::handlers::accounts::validate_birthdate;
use crate::handlers::load_account;
use crate::middleware::rbac::{RequireGuardian, RequireMember};
use crate::response::DataResponse;
use crate::state::AppState;

/// Either a single `email` or a list of `emails` (or both).
#[derive(Debug, Deserialize)]
pub struct LinkRequest {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub emails: Vec<String>,
}

impl LinkRequest {
    fn into_emails(self) -> Vec<String> {
        self.email.into_iter().chain(self.emails).collect()
    }
}

#[derive(Debug, Deserialize)]
pub struct ListLinksParams {
    #[serde(default)]
    pub include_pending: bool,
}

/// POST /api/v1/links
///
/// Link with the accounts registered under the given addresses, or invite
/// them. One result per distinct address, in request order.
pub async fn request_link(
    RequireMember(auth): RequireMember,
    State(state): State<AppState>,
    Json(input): Json<LinkRequest>,
) -> AppResult<(StatusCode, Json<DataResponse<Vec<LinkRequestResult>>>)> {
    let initiator = load_account(&state.pool, auth.user_id).await?;
    let results = linking::request_links(&state, &initiator, &input.into_emails())
        .await
        .map_err(|e| e.redirect_to("/links"))?;
    Ok((StatusCode::CREATED, Json(DataResponse { data: results })))
}

/// GET /api/v1/links?include_pending=bool
pub async fn list_links(
    RequireMember(auth): RequireMember,
    State(state): State<AppState>,
    Query(params): Query<ListLinksParams>,
) -> AppResult<Json<DataResponse<Vec<LinkedCounterpart>>>> {
    let linked =
        LinkRepo::list_counterparts(&state.pool, auth.role, auth.user_id, params.include_pending)
            .await?;
    Ok(Json(DataResponse { data: linked }))
}

/// POST /api/v1/links/{id}/approve
pub async fn approve_link(
    RequireMember(auth): RequireMember,
    State(state): State<AppState>,
    Path(link_id): Path<DbId>,
) -> AppResult<Json<DataResponse<AccountLink>>> {
    let link = linking::approve_link(&state, link_id, auth.user_id).await?;
    Ok(Json(DataResponse { data: link }))
}

/// PUT /api/v1/links/{id}/profile
///
/// A guardian fills in the profile of a linked student. Pending links count,
/// so a guardian can prepare a student who has not approved yet.
pub async fn complete_student_profile(
    RequireGuardian(auth): RequireGuardian,
    State(state): State<AppState>,
    Path(student_id): Path<DbId>,
    Json(input): Json<StudentProfile>,
) -> AppResult<Json<DataResponse<AccountResponse>>> {
    let redirect = format!("/links/{student_id}/profile");

    let linked =
        LinkRepo::linked_account_ids(&state.pool, Role::Guardian, auth.user_id, true).await?;
    if !linked.contains(&student_id) {
        return Err(CoreError::NotFound {
            entity: "Student",
            id: student_id,
        }
        .into());
    }

    let required = [
        ("Name", input.name.as_str()),
        ("School", input.school.as_str()),
        ("Grade", input.grade.as_str()),
    ];
    if let Some((field, _)) = required.iter().find(|(_, v)| v.trim().is_empty()) {
        return Err(AppError::from(CoreError::Validation(format!("{field} is required")))
            .redirect_to(redirect));
    }
    validate_birthdate(Some(input.birthdate))
        .map_err(|e| AppError::from(e).redirect_to(redirect.as_str()))?;

    let profile = StudentProfile {
        name: input.name.trim().to_string(),
        school: input.school.trim().to_string(),
        grade: input.grade.trim().to_string(),
        birthdate: input.birthdate,
    };
    let student =
        AccountRepo::complete_student_profile(&state.pool, student_id, auth.user_id, &profile)
            .await?
            .ok_or(CoreError::NotFound {
                entity: "Student",
                id: student_id,
            })?;

    tracing::info!(
        guardian_id = auth.user_id,
        student_id,
        "Student profile completed by guardian"
    );

    Ok(Json(DataResponse {
        data: AccountResponse::from(&student),
    }))
}
