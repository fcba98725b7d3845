//! Consent form and code-of-conduct signing.

use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use serde::Deserialize;
use tourdesk_core::error::CoreError;
use tourdesk_core::roles::Role;
use tourdesk_core::signature::verify_signature;
use tourdesk_core::types::DbId;
use tourdesk_db::models::attestation::{
    CodeOfConductRecord, ConsentForm, CreateCodeOfConductRecord, CreateConsentForm,
};
use tourdesk_db::repositories::{CodeOfConductRepo, ConsentRepo, LinkRepo, TourRepo};

use crate::error::{AppError, AppResult};
use crate::handlers::{client_ip, load_account};
use crate::middleware::rbac::{RequireGuardian, RequireMember};
use crate::response::DataResponse;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ConsentRequest {
    /// Typed full name of the signing guardian.
    pub signature: String,
}

#[derive(Debug, Deserialize)]
pub struct CodeOfConductRequest {
    pub signature: String,
    #[serde(default)]
    pub agree: bool,
}

/// POST /api/v1/tours/{id}/consent/{student_id}
///
/// A guardian consents to a linked student joining a tour.
pub async fn sign_consent(
    RequireGuardian(auth): RequireGuardian,
    State(state): State<AppState>,
    Path((tour_id, student_id)): Path<(DbId, DbId)>,
    headers: HeaderMap,
    Json(input): Json<ConsentRequest>,
) -> AppResult<(StatusCode, Json<DataResponse<ConsentForm>>)> {
    let redirect = format!("/tours/{tour_id}/consent/{student_id}");
    let guardian = load_account(&state.pool, auth.user_id).await?;

    TourRepo::find_instance(&state.pool, tour_id)
        .await?
        .ok_or(CoreError::NotFound {
            entity: "TourInstance",
            id: tour_id,
        })?;

    let linked =
        LinkRepo::linked_account_ids(&state.pool, Role::Guardian, guardian.id, true).await?;
    if !linked.contains(&student_id) {
        return Err(CoreError::Forbidden(
            "You can only sign consent for students linked to your account".into(),
        )
        .into());
    }

    verify_signature(&input.signature, &guardian.name)
        .map_err(|e| AppError::from(e).redirect_to(redirect))?;

    let form = ConsentRepo::create(
        &state.pool,
        &CreateConsentForm {
            student_id,
            tour_id,
            signer_id: guardian.id,
            signature_text: input.signature.trim().to_string(),
            source_ip: client_ip(&headers),
        },
    )
    .await?;

    tracing::info!(signer_id = guardian.id, student_id, tour_id, "Consent form signed");

    Ok((StatusCode::CREATED, Json(DataResponse { data: form })))
}

/// POST /api/v1/code-of-conduct
pub async fn sign_code_of_conduct(
    RequireMember(auth): RequireMember,
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(input): Json<CodeOfConductRequest>,
) -> AppResult<(StatusCode, Json<DataResponse<CodeOfConductRecord>>)> {
    let account = load_account(&state.pool, auth.user_id).await?;

    if !input.agree {
        return Err(AppError::from(CoreError::Validation(
            "You must agree to the code of conduct".into(),
        ))
        .redirect_to("/code-of-conduct"));
    }
    verify_signature(&input.signature, &account.name)
        .map_err(|e| AppError::from(e).redirect_to("/code-of-conduct"))?;

    let record = CodeOfConductRepo::create(
        &state.pool,
        &CreateCodeOfConductRecord {
            user_id: account.id,
            signature_text: input.signature.trim().to_string(),
            source_ip: client_ip(&headers),
        },
    )
    .await?;

    tracing::info!(user_id = account.id, "Code of conduct signed");

    Ok((StatusCode::CREATED, Json(DataResponse { data: record })))
}
