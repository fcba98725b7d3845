//! Account registration and profile handlers.

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tourdesk_core::error::CoreError;
use tourdesk_core::link::normalize_email;
use tourdesk_core::roles::Role;
use tourdesk_db::models::account::{AccountResponse, CreateAccount, UpdateProfile};
use tourdesk_db::models::link::AccountLink;
use tourdesk_db::repositories::AccountRepo;

use crate::auth::jwt::{generate_access_token, validate_invitation_token};
use crate::engine::linking::register_account;
use crate::error::{AppError, AppResult};
use crate::handlers::load_account;
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub role: String,
    pub birthdate: Option<NaiveDate>,
    /// Token from an invitation link, if the account is signing up through one.
    pub invite_token: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    pub account: AccountResponse,
    pub access_token: String,
    /// Links that were waiting on this email and are now attached.
    pub links: Vec<AccountLink>,
}

pub(crate) fn validate_birthdate(birthdate: Option<NaiveDate>) -> Result<(), CoreError> {
    match birthdate {
        Some(date) if date > Utc::now().date_naive() => Err(CoreError::Validation(
            "Birthdate cannot be in the future".into(),
        )),
        _ => Ok(()),
    }
}

/// POST /api/v1/accounts
///
/// Register a guardian or minor account. Staff accounts are provisioned
/// separately and cannot self-register.
pub async fn register(
    State(state): State<AppState>,
    Json(input): Json<RegisterRequest>,
) -> AppResult<(StatusCode, Json<DataResponse<RegisterResponse>>)> {
    let role = Role::from_str_value(&input.role)?;
    if !role.is_self_registrable() {
        return Err(CoreError::Forbidden(format!("{role} accounts cannot self-register")).into());
    }

    let name = input.name.trim();
    if name.is_empty() {
        return Err(CoreError::Validation("Name is required".into()).into());
    }
    let email = normalize_email(&input.email)?;
    validate_birthdate(input.birthdate)?;

    let invitation = match input.invite_token.as_deref() {
        Some(token) => {
            let claims = validate_invitation_token(token, &state.config.jwt).map_err(|_| {
                AppError::Core(CoreError::Validation(
                    "This invitation link is invalid or has expired".into(),
                ))
            })?;
            if claims.email != email {
                return Err(CoreError::Validation(
                    "This invitation was sent to a different email address".into(),
                )
                .into());
            }
            if claims.inviter_role.counterpart() != Some(role) {
                return Err(CoreError::Validation(format!(
                    "This invitation is for a {} account",
                    claims.inviter_role.counterpart().unwrap_or(role)
                ))
                .into());
            }
            Some(claims)
        }
        None => None,
    };

    let (account, links) = register_account(
        &state,
        &CreateAccount {
            role,
            name: name.to_string(),
            email,
            birthdate: input.birthdate,
        },
        invitation.as_ref(),
    )
    .await?;

    let access_token = generate_access_token(account.id, role, &state.config.jwt)
        .map_err(|e| AppError::InternalError(format!("Failed to sign access token: {e}")))?;

    tracing::info!(account_id = account.id, role = %role, invited = invitation.is_some(), "Account registered");

    Ok((
        StatusCode::CREATED,
        Json(DataResponse {
            data: RegisterResponse {
                account: AccountResponse::from(&account),
                access_token,
                links,
            },
        }),
    ))
}

/// GET /api/v1/accounts/me
pub async fn me(
    auth: AuthUser,
    State(state): State<AppState>,
) -> AppResult<Json<DataResponse<AccountResponse>>> {
    let account = load_account(&state.pool, auth.user_id).await?;
    Ok(Json(DataResponse {
        data: AccountResponse::from(&account),
    }))
}

/// PUT /api/v1/accounts/me/profile
pub async fn update_profile(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(input): Json<UpdateProfile>,
) -> AppResult<Json<DataResponse<AccountResponse>>> {
    if input.name.as_deref().is_some_and(|n| n.trim().is_empty()) {
        return Err(CoreError::Validation("Name cannot be empty".into()).into());
    }
    validate_birthdate(input.birthdate)?;

    let account = AccountRepo::update_profile(&state.pool, auth.user_id, &input)
        .await?
        .ok_or(CoreError::NotFound {
            entity: "Account",
            id: auth.user_id,
        })?;

    tracing::info!(
        account_id = account.id,
        profile_complete = account.profile_complete(),
        "Profile updated"
    );

    Ok(Json(DataResponse {
        data: AccountResponse::from(&account),
    }))
}
