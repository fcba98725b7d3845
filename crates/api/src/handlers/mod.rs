//! Request handlers.
//!
//! Each submodule provides the async handler functions for one area of the
//! API. Handlers delegate to repositories in `tourdesk_db` or to the
//! workflow services in [`crate::engine`], and map errors via [`AppError`].

pub mod accounts;
pub mod attestations;
pub mod cart;
pub mod checklist;
pub mod documents;
pub mod links;
pub mod selection;
pub mod staff;
pub mod tours;

use axum::http::HeaderMap;
use sqlx::PgPool;
use tourdesk_core::error::CoreError;
use tourdesk_core::types::DbId;
use tourdesk_db::models::account::Account;
use tourdesk_db::repositories::AccountRepo;

use crate::error::{AppError, AppResult};

/// Load the caller's account. A token for a deleted account is treated as
/// unauthenticated.
pub async fn load_account(pool: &PgPool, user_id: DbId) -> AppResult<Account> {
    AccountRepo::find_by_id(pool, user_id).await?.ok_or_else(|| {
        AppError::Core(CoreError::Unauthorized(
            "The account for this session no longer exists".into(),
        ))
    })
}

/// Client address as reported by the reverse proxy, if any.
pub fn client_ip(headers: &HeaderMap) -> Option<String> {
    headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .or_else(|| headers.get("x-real-ip").and_then(|v| v.to_str().ok()))
        .map(|ip| ip.trim().to_string())
        .filter(|ip| !ip.is_empty())
}
