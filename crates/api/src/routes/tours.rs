use axum::routing::{get, post};
use axum::Router;

use crate::handlers::{attestations, checklist, selection, tours};
use crate::state::AppState;

/// Tour routes mounted at `/tours`.
///
/// ```text
/// GET  /                                     -> list_tours
/// GET  /{id}                                 -> get_tour
/// GET  /{id}/alternatives                    -> list_alternatives
/// GET  /{id}/checklist                       -> get_checklist
/// POST /{id}/checklist/submit                -> submit_checklist
/// POST /{id}/selection                       -> select_students
/// POST /{id}/selection/acknowledge-waitlist  -> acknowledge_waitlist
/// POST /{id}/attendance                      -> declare_attendance
/// POST /{id}/consent/{student_id}            -> sign_consent
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(tours::list_tours))
        .route("/{id}", get(tours::get_tour))
        .route("/{id}/alternatives", get(tours::list_alternatives))
        .route("/{id}/checklist", get(checklist::get_checklist))
        .route("/{id}/checklist/submit", post(checklist::submit_checklist))
        .route("/{id}/selection", post(selection::select_students))
        .route(
            "/{id}/selection/acknowledge-waitlist",
            post(selection::acknowledge_waitlist),
        )
        .route("/{id}/attendance", post(selection::declare_attendance))
        .route(
            "/{id}/consent/{student_id}",
            post(attestations::sign_consent),
        )
}
