//! Cart, checkout and reservation history over HTTP.

mod common;

use axum::body::Body;
use axum::http::{Response, StatusCode};
use common::{
    body_json, build_test_app, create_guardian, create_minor, create_tour, delete_auth, get_auth,
    post_auth, post_json_auth, TestApp,
};
use serde_json::json;
use sqlx::PgPool;
use tourdesk_core::roles::Role;
use tourdesk_core::types::DbId;
use tourdesk_db::models::reservation::SeatRequest;
use tourdesk_db::repositories::{AlternativeChoiceRepo, ReservationRepo, TourRepo};

async fn reserve(pool: &PgPool, guardian_id: DbId, tour_id: DbId, students: &[DbId]) -> Vec<DbId> {
    let requests: Vec<SeatRequest> = students
        .iter()
        .map(|&student_id| SeatRequest {
            user_id: guardian_id,
            parent_id: Some(guardian_id),
            student_id,
            tour_id,
            price_cents: 2500,
            pricing_snapshot: serde_json::json!({ "price_cents": 2500 }),
        })
        .collect();
    ReservationRepo::reserve_seats(pool, tour_id, &requests)
        .await
        .unwrap()
        .assignments
        .into_iter()
        .map(|a| a.reservation.id)
        .collect()
}

async fn choose(
    app: &TestApp,
    token: &str,
    reservation_id: DbId,
    tour_id: DbId,
) -> Response<Body> {
    post_json_auth(
        app,
        &format!("/api/v1/reservations/{reservation_id}/alternative"),
        token,
        json!({ "tour_id": tour_id }),
    )
    .await
}

async fn registered_count(pool: &PgPool, tour_id: DbId) -> i32 {
    TourRepo::find_instance(pool, tour_id)
        .await
        .unwrap()
        .unwrap()
        .registered_count
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn removing_a_pending_item_releases_its_seat(pool: PgPool) {
    let guardian = create_guardian(&pool, "Pat Parent").await;
    let kid = create_minor(&pool, "Kim Kid", 15).await;
    let tour = create_tour(&pool, 5, Some(2500)).await;
    let ids = reserve(&pool, guardian.id, tour, &[kid.id]).await;
    assert_eq!(registered_count(&pool, tour).await, 1);

    let app = build_test_app(pool.clone());
    let token = app.token_for(guardian.id, Role::Guardian);

    let json = body_json(get_auth(&app, "/api/v1/cart", &token).await).await;
    assert_eq!(json["data"].as_array().unwrap().len(), 1);

    let response = delete_auth(&app, &format!("/api/v1/cart/{}", ids[0]), &token).await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    assert_eq!(registered_count(&pool, tour).await, 0);

    let json = body_json(get_auth(&app, "/api/v1/cart", &token).await).await;
    assert!(json["data"].as_array().unwrap().is_empty());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn checkout_confirms_pending_items_and_locks_them(pool: PgPool) {
    let guardian = create_guardian(&pool, "Pat Parent").await;
    let first = create_minor(&pool, "Kim Kid", 15).await;
    let second = create_minor(&pool, "Lee Kid", 13).await;
    let tour = create_tour(&pool, 5, Some(2500)).await;
    let ids = reserve(&pool, guardian.id, tour, &[first.id, second.id]).await;

    let app = build_test_app(pool);
    let token = app.token_for(guardian.id, Role::Guardian);

    let response = post_auth(&app, "/api/v1/cart/checkout", &token).await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    let confirmed = json["data"].as_array().unwrap();
    assert_eq!(confirmed.len(), 2);
    assert!(confirmed.iter().all(|r| r["status"] == "confirmed"));

    let response = delete_auth(&app, &format!("/api/v1/cart/{}", ids[0]), &token).await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
    assert_eq!(body_json(response).await["redirect"], "/cart");

    // Nothing left to check out.
    let response = post_auth(&app, "/api/v1/cart/checkout", &token).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let json = body_json(get_auth(&app, "/api/v1/reservations", &token).await).await;
    assert_eq!(json["data"].as_array().unwrap().len(), 2);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn another_accounts_item_is_not_found(pool: PgPool) {
    let guardian = create_guardian(&pool, "Pat Parent").await;
    let other = create_guardian(&pool, "Alex Parent").await;
    let kid = create_minor(&pool, "Kim Kid", 15).await;
    let tour = create_tour(&pool, 5, Some(2500)).await;
    let ids = reserve(&pool, guardian.id, tour, &[kid.id]).await;

    let app = build_test_app(pool.clone());
    let token = app.token_for(other.id, Role::Guardian);

    let response = delete_auth(&app, &format!("/api/v1/cart/{}", ids[0]), &token).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(registered_count(&pool, tour).await, 1);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn waitlisted_booker_chooses_an_alternative_tour(pool: PgPool) {
    let guardian = create_guardian(&pool, "Pat Parent").await;
    let first = create_minor(&pool, "Kim Kid", 15).await;
    let second = create_minor(&pool, "Lee Kid", 13).await;
    let full = create_tour(&pool, 1, Some(2500)).await;
    let other = create_tour(&pool, 5, Some(2500)).await;
    let another = create_tour(&pool, 5, Some(2500)).await;
    let ids = reserve(&pool, guardian.id, full, &[first.id, second.id]).await;
    let (seated, waitlisted) = (ids[0], ids[1]);

    let app = build_test_app(pool.clone());
    let token = app.token_for(guardian.id, Role::Guardian);

    let json = body_json(
        get_auth(&app, &format!("/api/v1/tours/{full}/alternatives"), &token).await,
    )
    .await;
    let offered: Vec<i64> = json["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|t| t["id"].as_i64().unwrap())
        .collect();
    assert!(offered.contains(&other));
    assert!(offered.contains(&another));
    assert!(!offered.contains(&full));

    let response = choose(&app, &token, seated, other).await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
    assert_eq!(body_json(response).await["redirect"], "/reservations");

    let response = choose(&app, &token, waitlisted, full).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = choose(&app, &token, waitlisted, other).await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let json = body_json(response).await;
    assert_eq!(json["data"]["original_tour_id"], full);
    assert_eq!(json["data"]["alternative_tour_id"], other);

    // A second choice replaces the first.
    let response = choose(&app, &token, waitlisted, another).await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let stored = AlternativeChoiceRepo::find_for_reservation(&pool, waitlisted)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.alternative_tour_id, another);
    assert!(AlternativeChoiceRepo::list_for_alternative(&pool, other)
        .await
        .unwrap()
        .is_empty());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn only_the_booker_chooses_an_alternative(pool: PgPool) {
    let guardian = create_guardian(&pool, "Pat Parent").await;
    let stranger = create_guardian(&pool, "Alex Parent").await;
    let first = create_minor(&pool, "Kim Kid", 15).await;
    let second = create_minor(&pool, "Lee Kid", 13).await;
    let full = create_tour(&pool, 1, Some(2500)).await;
    let other = create_tour(&pool, 5, Some(2500)).await;
    let ids = reserve(&pool, guardian.id, full, &[first.id, second.id]).await;

    let app = build_test_app(pool);
    let token = app.token_for(stranger.id, Role::Guardian);

    let response = choose(&app, &token, ids[1], other).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
