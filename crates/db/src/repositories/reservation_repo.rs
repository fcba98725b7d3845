//! Repository for the `reservations` table.
//!
//! [`ReservationRepo::reserve_seats`] is the only place that turns seat
//! requests into rows. It claims seats one student at a time with
//! [`TourRepo::try_claim_seat`] inside a single transaction, so a batch
//! either lands completely or not at all, and the tour's `registered_count`
//! always equals its number of confirmed-seat rows.

use sqlx::{PgConnection, PgPool};
use tourdesk_core::allocation::SeatStatus;
use tourdesk_core::cart::{RESERVATION_CONFIRMED, RESERVATION_PENDING};
use tourdesk_core::types::DbId;

use crate::models::reservation::{Reservation, ReservationBatch, SeatAssignment, SeatRequest};
use crate::repositories::TourRepo;

const COLUMNS: &str = "id, user_id, parent_id, student_id, tour_id, status, seat_status, \
                       price_cents, pricing_snapshot, added_at, confirmed_at";

pub struct ReservationRepo;

impl ReservationRepo {
    /// Reserve seats on `tour_id` for each request, in order.
    ///
    /// Students who already hold a reservation for the tour keep it and are
    /// reported with `already_reserved = true`; no seat is claimed for them.
    pub async fn reserve_seats(
        pool: &PgPool,
        tour_id: DbId,
        requests: &[SeatRequest],
    ) -> Result<ReservationBatch, sqlx::Error> {
        let mut tx = pool.begin().await?;
        let mut assignments = Vec::with_capacity(requests.len());
        let mut confirmed_added = 0;

        for req in requests {
            if let Some(existing) = Self::find_for_student(&mut tx, req.student_id, tour_id).await? {
                let seat_status = existing
                    .seat_status()
                    .unwrap_or(SeatStatus::Waitlisted);
                assignments.push(SeatAssignment {
                    student_id: req.student_id,
                    seat_status,
                    already_reserved: true,
                    reservation: existing,
                });
                continue;
            }

            let claimed = TourRepo::try_claim_seat(&mut tx, tour_id).await?.is_some();
            let seat_status = SeatStatus::from_claim(claimed);
            if claimed {
                confirmed_added += 1;
            }

            let query = format!(
                "INSERT INTO reservations
                    (user_id, parent_id, student_id, tour_id, status, seat_status,
                     price_cents, pricing_snapshot)
                 VALUES ($1, $2, $3, $4, '{RESERVATION_PENDING}', $5, $6, $7)
                 RETURNING {COLUMNS}"
            );
            let reservation = sqlx::query_as::<_, Reservation>(&query)
                .bind(req.user_id)
                .bind(req.parent_id)
                .bind(req.student_id)
                .bind(tour_id)
                .bind(seat_status.as_str())
                .bind(req.price_cents)
                .bind(&req.pricing_snapshot)
                .fetch_one(&mut *tx)
                .await?;

            assignments.push(SeatAssignment {
                student_id: req.student_id,
                seat_status,
                already_reserved: false,
                reservation,
            });
        }

        tx.commit().await?;

        tracing::debug!(tour_id, confirmed_added, batch = requests.len(), "Seat batch committed");

        Ok(ReservationBatch {
            tour_id,
            assignments,
            confirmed_added,
        })
    }

    async fn find_for_student(
        conn: &mut PgConnection,
        student_id: DbId,
        tour_id: DbId,
    ) -> Result<Option<Reservation>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM reservations WHERE student_id = $1 AND tour_id = $2"
        );
        sqlx::query_as::<_, Reservation>(&query)
            .bind(student_id)
            .bind(tour_id)
            .fetch_optional(conn)
            .await
    }

    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Reservation>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM reservations WHERE id = $1");
        sqlx::query_as::<_, Reservation>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Pending reservations owned by `user_id`, in the order they were added.
    pub async fn list_cart(pool: &PgPool, user_id: DbId) -> Result<Vec<Reservation>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM reservations
             WHERE user_id = $1 AND status = '{RESERVATION_PENDING}'
             ORDER BY added_at, id"
        );
        sqlx::query_as::<_, Reservation>(&query)
            .bind(user_id)
            .fetch_all(pool)
            .await
    }

    /// Every reservation owned by `user_id`, newest first.
    pub async fn list_for_user(
        pool: &PgPool,
        user_id: DbId,
    ) -> Result<Vec<Reservation>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM reservations WHERE user_id = $1 ORDER BY added_at DESC, id DESC"
        );
        sqlx::query_as::<_, Reservation>(&query)
            .bind(user_id)
            .fetch_all(pool)
            .await
    }

    /// Move every pending reservation owned by `user_id` to confirmed.
    pub async fn checkout(pool: &PgPool, user_id: DbId) -> Result<Vec<Reservation>, sqlx::Error> {
        let query = format!(
            "UPDATE reservations
             SET status = '{RESERVATION_CONFIRMED}', confirmed_at = NOW()
             WHERE user_id = $1 AND status = '{RESERVATION_PENDING}'
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Reservation>(&query)
            .bind(user_id)
            .fetch_all(pool)
            .await
    }

    /// Delete a pending reservation, releasing its seat if it held one.
    ///
    /// Returns `None` if no pending reservation with that id belongs to the
    /// user.
    pub async fn remove_pending(
        pool: &PgPool,
        id: DbId,
        user_id: DbId,
    ) -> Result<Option<Reservation>, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let query = format!(
            "DELETE FROM reservations
             WHERE id = $1 AND user_id = $2 AND status = '{RESERVATION_PENDING}'
             RETURNING {COLUMNS}"
        );
        let removed = sqlx::query_as::<_, Reservation>(&query)
            .bind(id)
            .bind(user_id)
            .fetch_optional(&mut *tx)
            .await?;

        if let Some(reservation) = &removed {
            if reservation.seat_status == SeatStatus::Confirmed.as_str() {
                TourRepo::release_seat(&mut tx, reservation.tour_id).await?;
            }
        }

        tx.commit().await?;
        Ok(removed)
    }

    /// Number of confirmed-seat rows for a tour.
    pub async fn count_confirmed_seats(pool: &PgPool, tour_id: DbId) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM reservations WHERE tour_id = $1 AND seat_status = 'confirmed'",
        )
        .bind(tour_id)
        .fetch_one(pool)
        .await
    }
}
