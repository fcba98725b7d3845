use axum::routing::post;
use axum::Router;

use crate::handlers::attestations;
use crate::state::AppState;

/// Mounted at `/code-of-conduct`. Consent forms hang off the tour routes.
pub fn router() -> Router<AppState> {
    Router::new().route("/", post(attestations::sign_code_of_conduct))
}
