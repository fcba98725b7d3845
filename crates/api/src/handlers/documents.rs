//! Photo ID and background-check uploads.
//!
//! Every file is validated (extension and size), virus-scanned and only then
//! stored. A scan that finds a virus or cannot complete rejects the upload
//! and leaves a flagged-upload record for staff.

use axum::extract::{Multipart, State};
use axum::http::StatusCode;
use axum::Json;
use tourdesk_core::documents::{validate_upload, DocumentKind};
use tourdesk_core::error::CoreError;
use tourdesk_core::types::DbId;
use tourdesk_db::models::account::AccountResponse;
use tourdesk_db::models::background_check::BackgroundCheckRecord;
use tourdesk_db::models::flagged_upload::CreateFlaggedUpload;
use tourdesk_db::repositories::{AccountRepo, BackgroundCheckRepo, FlaggedUploadRepo};

use crate::error::{AppError, AppResult};
use crate::middleware::rbac::{RequireGuardian, RequireMember};
use crate::response::DataResponse;
use crate::state::AppState;

const PHOTO_ID_PAGE: &str = "/documents/photo-id";
const BACKGROUND_CHECK_PAGE: &str = "/documents/background-check";

/// A file pulled out of a multipart body.
struct Upload {
    filename: String,
    bytes: Vec<u8>,
}

/// Read the named file fields of a multipart body. Other fields are ignored.
async fn read_files(
    mut multipart: Multipart,
    names: &[&str],
) -> AppResult<Vec<(String, Upload)>> {
    let mut files = Vec::new();
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(e.to_string()))?
    {
        let Some(name) = field.name().map(str::to_string) else {
            continue;
        };
        if !names.contains(&name.as_str()) {
            continue;
        }
        let filename = field.file_name().unwrap_or_default().to_string();
        let bytes = field
            .bytes()
            .await
            .map_err(|e| AppError::BadRequest(e.to_string()))?;
        files.push((
            name,
            Upload {
                filename,
                bytes: bytes.to_vec(),
            },
        ));
    }
    Ok(files)
}

fn take_file(files: &mut Vec<(String, Upload)>, name: &str, kind: DocumentKind) -> AppResult<Upload> {
    let index = files.iter().position(|(n, _)| n == name).ok_or_else(|| {
        AppError::Core(CoreError::Validation(format!(
            "No file selected for the {}",
            kind.label()
        )))
    })?;
    Ok(files.swap_remove(index).1)
}

/// Validate and scan one upload, returning its extension.
///
/// A rejected scan is recorded for staff before the error is returned.
async fn screen(
    state: &AppState,
    user_id: DbId,
    kind: DocumentKind,
    upload: &Upload,
) -> AppResult<String> {
    let ext = validate_upload(
        kind,
        &upload.filename,
        upload.bytes.len(),
        state.config.documents.max_upload_bytes,
    )?;

    let verdict = state.scanner.scan(&upload.bytes).await;
    if verdict.needs_manual_review() {
        let flagged = FlaggedUploadRepo::create(
            &state.pool,
            &CreateFlaggedUpload {
                user_id,
                kind: kind.as_str().to_string(),
                filename: upload.filename.clone(),
                reason: format!("{verdict:?}"),
            },
        )
        .await?;
        tracing::warn!(
            user_id,
            kind = kind.as_str(),
            flagged_upload_id = flagged.id,
            verdict = ?verdict,
            "Upload rejected by virus scan"
        );
    }
    verdict.into_result(kind)?;
    Ok(ext)
}

async fn store(
    state: &AppState,
    user_id: DbId,
    kind: DocumentKind,
    ext: &str,
    upload: &Upload,
) -> AppResult<String> {
    state
        .documents
        .put(user_id, kind, ext, &upload.bytes)
        .await
        .map_err(|e| AppError::InternalError(format!("Failed to store {}: {e}", kind.label())))
}

/// Best-effort removal of files that are no longer referenced.
async fn discard(state: &AppState, references: impl IntoIterator<Item = String>) {
    for reference in references {
        if let Err(e) = state.documents.delete(&reference).await {
            tracing::warn!(%reference, error = %e, "Failed to delete stored document");
        }
    }
}

/// POST /api/v1/documents/photo-id
///
/// Multipart body with `front` and `back` files. Both sides are screened
/// before either is stored; a previous ID on file is replaced.
pub async fn upload_photo_id(
    RequireMember(auth): RequireMember,
    State(state): State<AppState>,
    multipart: Multipart,
) -> AppResult<(StatusCode, Json<DataResponse<AccountResponse>>)> {
    async {
        let mut files = read_files(multipart, &["front", "back"]).await?;
        let front = take_file(&mut files, "front", DocumentKind::IdFront)?;
        let back = take_file(&mut files, "back", DocumentKind::IdBack)?;

        let front_ext = screen(&state, auth.user_id, DocumentKind::IdFront, &front).await?;
        let back_ext = screen(&state, auth.user_id, DocumentKind::IdBack, &back).await?;

        let front_ref = store(&state, auth.user_id, DocumentKind::IdFront, &front_ext, &front).await?;
        let back_ref =
            match store(&state, auth.user_id, DocumentKind::IdBack, &back_ext, &back).await {
                Ok(reference) => reference,
                Err(e) => {
                    discard(&state, [front_ref]).await;
                    return Err(e);
                }
            };

        let previous = AccountRepo::find_by_id(&state.pool, auth.user_id).await?;
        let account =
            match AccountRepo::set_photo_id(&state.pool, auth.user_id, &front_ref, &back_ref).await
            {
                Ok(Some(account)) => account,
                result => {
                    // Nothing references the new files.
                    discard(&state, [front_ref, back_ref]).await;
                    return Err(match result {
                        Err(e) => e.into(),
                        _ => CoreError::NotFound {
                            entity: "Account",
                            id: auth.user_id,
                        }
                        .into(),
                    });
                }
            };

        if let Some(previous) = previous {
            discard(
                &state,
                previous.id_front_ref.into_iter().chain(previous.id_back_ref),
            )
            .await;
        }

        tracing::info!(user_id = auth.user_id, "Photo ID uploaded");

        Ok::<_, AppError>((
            StatusCode::CREATED,
            Json(DataResponse {
                data: AccountResponse::from(&account),
            }),
        ))
    }
    .await
    .map_err(|e| e.redirect_to(PHOTO_ID_PAGE))
}

/// DELETE /api/v1/documents/photo-id
pub async fn clear_photo_id(
    RequireMember(auth): RequireMember,
    State(state): State<AppState>,
) -> AppResult<StatusCode> {
    let previous = AccountRepo::clear_photo_id(&state.pool, auth.user_id)
        .await?
        .ok_or(CoreError::NotFound {
            entity: "Account",
            id: auth.user_id,
        })?;

    let (front, back) = previous;
    discard(&state, front.into_iter().chain(back)).await;

    tracing::info!(user_id = auth.user_id, "Photo ID cleared");
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/v1/documents/background-check
///
/// Multipart body with a `file`. Creates a pending check for staff review.
pub async fn submit_background_check(
    RequireGuardian(auth): RequireGuardian,
    State(state): State<AppState>,
    multipart: Multipart,
) -> AppResult<(StatusCode, Json<DataResponse<BackgroundCheckRecord>>)> {
    async {
        let mut files = read_files(multipart, &["file"]).await?;
        let file = take_file(&mut files, "file", DocumentKind::BackgroundCheck)?;

        let ext = screen(&state, auth.user_id, DocumentKind::BackgroundCheck, &file).await?;
        let reference = store(&state, auth.user_id, DocumentKind::BackgroundCheck, &ext, &file).await?;

        let record = BackgroundCheckRepo::create(&state.pool, auth.user_id, &reference).await?;

        tracing::info!(
            user_id = auth.user_id,
            background_check_id = record.id,
            "Background check submitted"
        );

        Ok::<_, AppError>((StatusCode::CREATED, Json(DataResponse { data: record })))
    }
    .await
    .map_err(|e| e.redirect_to(BACKGROUND_CHECK_PAGE))
}
