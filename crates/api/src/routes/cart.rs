use axum::routing::{delete, get, post};
use axum::Router;

use crate::handlers::cart;
use crate::state::AppState;

/// Cart routes mounted at `/cart`.
///
/// ```text
/// GET    /           -> get_cart
/// POST   /checkout   -> checkout
/// DELETE /{id}       -> remove_item
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(cart::get_cart))
        .route("/checkout", post(cart::checkout))
        .route("/{id}", delete(cart::remove_item))
}
