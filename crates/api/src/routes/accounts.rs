use axum::routing::{get, post, put};
use axum::Router;

use crate::handlers::accounts;
use crate::state::AppState;

/// Account routes mounted at `/accounts`.
///
/// ```text
/// POST /             -> register (public)
/// GET  /me           -> me
/// PUT  /me/profile   -> update_profile
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(accounts::register))
        .route("/me", get(accounts::me))
        .route("/me/profile", put(accounts::update_profile))
}
