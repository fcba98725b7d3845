use axum::routing::{get, post, put};
use axum::Router;

use crate::handlers::links;
use crate::state::AppState;

/// Guardian/minor link routes mounted at `/links`.
///
/// ```text
/// GET  /               -> list_links
/// POST /               -> request_link
/// POST /{id}/approve   -> approve_link
/// PUT  /{id}/profile   -> complete_student_profile (guardian, id = student)
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(links::list_links).post(links::request_link))
        .route("/{id}/approve", post(links::approve_link))
        .route("/{id}/profile", put(links::complete_student_profile))
}
