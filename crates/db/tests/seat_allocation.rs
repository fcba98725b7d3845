//! Integration tests for seat allocation and the reservation ledger.
//!
//! Exercises the repository layer against a real database:
//! - Confirmed vs waitlisted assignment against capacity
//! - Submission order within a batch
//! - Concurrent batches racing for the last seat
//! - Idempotent re-reservation
//! - Cart removal releasing seats, checkout

use chrono::NaiveDate;
use sqlx::PgPool;
use tourdesk_core::allocation::SeatStatus;
use tourdesk_core::roles::Role;
use tourdesk_core::types::DbId;
use tourdesk_db::models::account::CreateAccount;
use tourdesk_db::models::reservation::SeatRequest;
use tourdesk_db::models::tour::{CreateTourInstance, CreateTourTemplate};
use tourdesk_db::repositories::{AccountRepo, ReservationRepo, TourRepo};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

async fn create_account(pool: &PgPool, role: Role, name: &str) -> DbId {
    let input = CreateAccount {
        role,
        name: name.to_string(),
        email: format!("{}@test.org", name.to_lowercase()),
        birthdate: None,
    };
    AccountRepo::create(pool, &input).await.unwrap().id
}

/// Create a priced tour with the given capacity and a pre-set counter.
async fn create_tour(pool: &PgPool, capacity: i32, registered: i32) -> DbId {
    let tier = TourRepo::create_price_tier(pool, &format!("tier-{capacity}-{registered}"), 2500)
        .await
        .unwrap();
    let template = TourRepo::create_template(
        pool,
        &CreateTourTemplate {
            title: "Engineering campus tour".into(),
            description: None,
            price_tier_id: Some(tier.id),
        },
    )
    .await
    .unwrap();
    let tour = TourRepo::create_instance(
        pool,
        &CreateTourInstance {
            template_id: template.id,
            tour_date: NaiveDate::from_ymd_opt(2026, 11, 20).unwrap(),
            capacity: Some(capacity),
        },
    )
    .await
    .unwrap();
    sqlx::query("UPDATE tour_instances SET registered_count = $2 WHERE id = $1")
        .bind(tour.id)
        .bind(registered)
        .execute(pool)
        .await
        .unwrap();
    tour.id
}

fn requests(parent_id: DbId, tour_id: DbId, students: &[DbId]) -> Vec<SeatRequest> {
    students
        .iter()
        .map(|&student_id| SeatRequest {
            user_id: parent_id,
            parent_id: Some(parent_id),
            student_id,
            tour_id,
            price_cents: 2500,
            pricing_snapshot: serde_json::json!({ "price_cents": 2500 }),
        })
        .collect()
}

async fn registered_count(pool: &PgPool, tour_id: DbId) -> i32 {
    TourRepo::find_instance(pool, tour_id)
        .await
        .unwrap()
        .unwrap()
        .registered_count
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn full_tour_waitlists_and_leaves_counter_alone(pool: PgPool) {
    let parent = create_account(&pool, Role::Guardian, "Parent").await;
    let kid = create_account(&pool, Role::Minor, "Kid").await;
    let tour = create_tour(&pool, 13, 13).await;

    let batch = ReservationRepo::reserve_seats(&pool, tour, &requests(parent, tour, &[kid]))
        .await
        .unwrap();

    assert_eq!(batch.assignments.len(), 1);
    assert_eq!(batch.assignments[0].seat_status, SeatStatus::Waitlisted);
    assert_eq!(batch.confirmed_added, 0);
    assert_eq!(registered_count(&pool, tour).await, 13);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn partial_batch_confirms_first_students_in_order(pool: PgPool) {
    let parent = create_account(&pool, Role::Guardian, "Parent").await;
    let a = create_account(&pool, Role::Minor, "Ava").await;
    let b = create_account(&pool, Role::Minor, "Ben").await;
    let c = create_account(&pool, Role::Minor, "Cal").await;
    let tour = create_tour(&pool, 13, 11).await;

    // Submit out of id order to make sure order comes from the request.
    let batch = ReservationRepo::reserve_seats(&pool, tour, &requests(parent, tour, &[c, a, b]))
        .await
        .unwrap();

    let statuses: Vec<_> = batch
        .assignments
        .iter()
        .map(|s| (s.student_id, s.seat_status))
        .collect();
    assert_eq!(
        statuses,
        vec![
            (c, SeatStatus::Confirmed),
            (a, SeatStatus::Confirmed),
            (b, SeatStatus::Waitlisted),
        ]
    );
    assert_eq!(batch.confirmed_added, 2);
    assert_eq!(registered_count(&pool, tour).await, 13);
    assert!(batch
        .assignments
        .iter()
        .all(|s| s.reservation.status == "pending"));
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn concurrent_batches_for_last_seat_confirm_exactly_one(pool: PgPool) {
    let p1 = create_account(&pool, Role::Guardian, "First").await;
    let p2 = create_account(&pool, Role::Guardian, "Second").await;
    let k1 = create_account(&pool, Role::Minor, "KidOne").await;
    let k2 = create_account(&pool, Role::Minor, "KidTwo").await;
    let tour = create_tour(&pool, 1, 0).await;

    let r1 = requests(p1, tour, &[k1]);
    let r2 = requests(p2, tour, &[k2]);
    let (b1, b2) = tokio::join!(
        ReservationRepo::reserve_seats(&pool, tour, &r1),
        ReservationRepo::reserve_seats(&pool, tour, &r2),
    );
    let (b1, b2) = (b1.unwrap(), b2.unwrap());

    let confirmed = b1.count(SeatStatus::Confirmed) + b2.count(SeatStatus::Confirmed);
    let waitlisted = b1.count(SeatStatus::Waitlisted) + b2.count(SeatStatus::Waitlisted);
    assert_eq!(confirmed, 1);
    assert_eq!(waitlisted, 1);
    assert_eq!(registered_count(&pool, tour).await, 1);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn counter_matches_confirmed_rows(pool: PgPool) {
    let parent = create_account(&pool, Role::Guardian, "Parent").await;
    let mut kids = Vec::new();
    for name in ["K1", "K2", "K3", "K4", "K5"] {
        kids.push(create_account(&pool, Role::Minor, name).await);
    }
    let tour = create_tour(&pool, 3, 0).await;

    ReservationRepo::reserve_seats(&pool, tour, &requests(parent, tour, &kids[..2]))
        .await
        .unwrap();
    ReservationRepo::reserve_seats(&pool, tour, &requests(parent, tour, &kids[2..]))
        .await
        .unwrap();

    let confirmed_rows = ReservationRepo::count_confirmed_seats(&pool, tour)
        .await
        .unwrap();
    assert_eq!(confirmed_rows, 3);
    assert_eq!(i64::from(registered_count(&pool, tour).await), confirmed_rows);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn re_reserving_a_student_is_idempotent(pool: PgPool) {
    let parent = create_account(&pool, Role::Guardian, "Parent").await;
    let kid = create_account(&pool, Role::Minor, "Kid").await;
    let tour = create_tour(&pool, 13, 0).await;

    let first = ReservationRepo::reserve_seats(&pool, tour, &requests(parent, tour, &[kid]))
        .await
        .unwrap();
    let second = ReservationRepo::reserve_seats(&pool, tour, &requests(parent, tour, &[kid]))
        .await
        .unwrap();

    assert!(!first.assignments[0].already_reserved);
    assert!(second.assignments[0].already_reserved);
    assert_eq!(second.assignments[0].reservation.id, first.assignments[0].reservation.id);
    assert_eq!(second.confirmed_added, 0);
    assert_eq!(registered_count(&pool, tour).await, 1);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn removing_a_confirmed_cart_item_releases_the_seat(pool: PgPool) {
    let parent = create_account(&pool, Role::Guardian, "Parent").await;
    let kid = create_account(&pool, Role::Minor, "Kid").await;
    let tour = create_tour(&pool, 13, 0).await;

    let batch = ReservationRepo::reserve_seats(&pool, tour, &requests(parent, tour, &[kid]))
        .await
        .unwrap();
    let id = batch.assignments[0].reservation.id;

    // Someone else's id does not match.
    let other = create_account(&pool, Role::Guardian, "Other").await;
    assert!(ReservationRepo::remove_pending(&pool, id, other)
        .await
        .unwrap()
        .is_none());

    let removed = ReservationRepo::remove_pending(&pool, id, parent)
        .await
        .unwrap();
    assert!(removed.is_some());
    assert_eq!(registered_count(&pool, tour).await, 0);
    assert!(ReservationRepo::find_by_id(&pool, id).await.unwrap().is_none());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn checkout_confirms_pending_items(pool: PgPool) {
    let parent = create_account(&pool, Role::Guardian, "Parent").await;
    let kid = create_account(&pool, Role::Minor, "Kid").await;
    let tour = create_tour(&pool, 13, 0).await;

    ReservationRepo::reserve_seats(&pool, tour, &requests(parent, tour, &[kid]))
        .await
        .unwrap();
    assert_eq!(ReservationRepo::list_cart(&pool, parent).await.unwrap().len(), 1);

    let confirmed = ReservationRepo::checkout(&pool, parent).await.unwrap();
    assert_eq!(confirmed.len(), 1);
    assert_eq!(confirmed[0].status, "confirmed");
    assert!(confirmed[0].confirmed_at.is_some());
    assert!(ReservationRepo::list_cart(&pool, parent).await.unwrap().is_empty());

    // Checked-out items are no longer removable through the cart.
    let id = confirmed[0].id;
    assert!(ReservationRepo::remove_pending(&pool, id, parent)
        .await
        .unwrap()
        .is_none());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn listing_without_price_tier_cannot_be_priced(pool: PgPool) {
    let template = TourRepo::create_template(
        &pool,
        &CreateTourTemplate {
            title: "Unpriced".into(),
            description: None,
            price_tier_id: None,
        },
    )
    .await
    .unwrap();
    let tour = TourRepo::create_instance(
        &pool,
        &CreateTourInstance {
            template_id: template.id,
            tour_date: NaiveDate::from_ymd_opt(2026, 12, 1).unwrap(),
            capacity: None,
        },
    )
    .await
    .unwrap();
    assert_eq!(tour.capacity, 13);

    let listing = TourRepo::find_listing(&pool, tour.id).await.unwrap().unwrap();
    assert!(listing.pricing().is_err());
}
