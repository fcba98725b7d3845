use axum::routing::{get, post};
use axum::Router;

use crate::handlers::staff;
use crate::state::AppState;

/// Staff review routes mounted at `/staff`.
///
/// ```text
/// GET  /background-checks                 -> list_pending_background_checks
/// POST /background-checks/{id}/decision   -> decide_background_check
/// GET  /flagged-uploads                   -> list_flagged_uploads
/// POST /flagged-uploads/{id}/resolve      -> resolve_flagged_upload
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/background-checks",
            get(staff::list_pending_background_checks),
        )
        .route(
            "/background-checks/{id}/decision",
            post(staff::decide_background_check),
        )
        .route("/flagged-uploads", get(staff::list_flagged_uploads))
        .route(
            "/flagged-uploads/{id}/resolve",
            post(staff::resolve_flagged_upload),
        )
}
