use axum::routing::post;
use axum::Router;

use crate::handlers::documents;
use crate::state::AppState;

/// Document upload routes mounted at `/documents`.
///
/// ```text
/// POST   /photo-id            -> upload_photo_id
/// DELETE /photo-id            -> clear_photo_id
/// POST   /background-check    -> submit_background_check
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/photo-id",
            post(documents::upload_photo_id).delete(documents::clear_photo_id),
        )
        .route("/background-check", post(documents::submit_background_check))
}
