pub mod accounts;
pub mod attestations;
pub mod cart;
pub mod documents;
pub mod health;
pub mod links;
pub mod staff;
pub mod tours;

use axum::routing::{get, post};
use axum::Router;

use crate::handlers;
use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /accounts                                         register (public)
/// /accounts/me                                      current account
/// /accounts/me/profile                              update profile (PUT)
///
/// /links                                            list, request (GET, POST)
/// /links/{id}/approve                               approve a pending link (POST)
/// /links/{id}/profile                               fill a linked student's profile (guardian, PUT)
///
/// /tours                                            upcoming tours
/// /tours/{id}                                       tour detail
/// /tours/{id}/alternatives                          other upcoming tours
/// /tours/{id}/checklist                             evaluate checklist (GET)
/// /tours/{id}/checklist/submit                      evaluate and reserve (POST)
/// /tours/{id}/selection                             select students (guardian, POST)
/// /tours/{id}/selection/acknowledge-waitlist        accept waitlist warning (POST)
/// /tours/{id}/attendance                            declare attendance (POST)
/// /tours/{id}/consent/{student_id}                  sign consent form (POST)
///
/// /code-of-conduct                                  sign code of conduct (POST)
///
/// /documents/photo-id                               upload, clear (POST, DELETE)
/// /documents/background-check                       submit for review (POST)
///
/// /cart                                             pending items
/// /cart/{id}                                        remove item (DELETE)
/// /cart/checkout                                    confirm all pending (POST)
/// /reservations                                     reservation history
/// /reservations/{id}/alternative                    choose alternative tour (waitlisted, POST)
///
/// /staff/background-checks                          pending review queue
/// /staff/background-checks/{id}/decision            approve or reject (POST)
/// /staff/flagged-uploads                            open flagged uploads
/// /staff/flagged-uploads/{id}/resolve               mark resolved (POST)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/accounts", accounts::router())
        .nest("/links", links::router())
        .nest("/tours", tours::router())
        .nest("/code-of-conduct", attestations::router())
        .nest("/documents", documents::router())
        .nest("/cart", cart::router())
        .route("/reservations", get(handlers::cart::list_reservations))
        .route(
            "/reservations/{id}/alternative",
            post(handlers::cart::choose_alternative),
        )
        // Staff review queues.
        .nest("/staff", staff::router())
}
