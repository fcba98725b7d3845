//! Repository for the `temporary_selections` table.
//!
//! One row per (guardian, tour). Re-selecting replaces the student list and
//! clears the waitlist acknowledgement, since the shortfall may have changed.

use sqlx::PgPool;
use tourdesk_core::checklist::Attendance;
use tourdesk_core::types::DbId;

use crate::models::selection::{TemporarySelection, SELECTION_RESERVED};

const COLUMNS: &str = "id, parent_id, tour_id, student_ids, attendance, waitlist_acknowledged, \
                       status, created_at, updated_at";

pub struct SelectionRepo;

impl SelectionRepo {
    pub async fn find(
        pool: &PgPool,
        parent_id: DbId,
        tour_id: DbId,
    ) -> Result<Option<TemporarySelection>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM temporary_selections WHERE parent_id = $1 AND tour_id = $2"
        );
        sqlx::query_as::<_, TemporarySelection>(&query)
            .bind(parent_id)
            .bind(tour_id)
            .fetch_optional(pool)
            .await
    }

    /// Store the ordered student list for a guardian and tour.
    pub async fn upsert_students(
        pool: &PgPool,
        parent_id: DbId,
        tour_id: DbId,
        student_ids: &[DbId],
    ) -> Result<TemporarySelection, sqlx::Error> {
        let query = format!(
            "INSERT INTO temporary_selections (parent_id, tour_id, student_ids)
             VALUES ($1, $2, $3)
             ON CONFLICT ON CONSTRAINT uq_temporary_selections_parent_tour DO UPDATE SET
                student_ids = EXCLUDED.student_ids,
                waitlist_acknowledged = FALSE,
                status = 'pending'
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, TemporarySelection>(&query)
            .bind(parent_id)
            .bind(tour_id)
            .bind(student_ids)
            .fetch_one(pool)
            .await
    }

    /// Returns `None` if the guardian has no selection for the tour.
    pub async fn set_attendance(
        pool: &PgPool,
        parent_id: DbId,
        tour_id: DbId,
        attendance: Attendance,
    ) -> Result<Option<TemporarySelection>, sqlx::Error> {
        let query = format!(
            "UPDATE temporary_selections SET attendance = $3
             WHERE parent_id = $1 AND tour_id = $2
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, TemporarySelection>(&query)
            .bind(parent_id)
            .bind(tour_id)
            .bind(attendance.as_str())
            .fetch_optional(pool)
            .await
    }

    pub async fn acknowledge_waitlist(
        pool: &PgPool,
        parent_id: DbId,
        tour_id: DbId,
    ) -> Result<Option<TemporarySelection>, sqlx::Error> {
        let query = format!(
            "UPDATE temporary_selections SET waitlist_acknowledged = TRUE
             WHERE parent_id = $1 AND tour_id = $2
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, TemporarySelection>(&query)
            .bind(parent_id)
            .bind(tour_id)
            .fetch_optional(pool)
            .await
    }

    /// Mark the selection as turned into reservations.
    pub async fn mark_reserved(
        pool: &PgPool,
        parent_id: DbId,
        tour_id: DbId,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(&format!(
            "UPDATE temporary_selections SET status = '{SELECTION_RESERVED}'
             WHERE parent_id = $1 AND tour_id = $2"
        ))
        .bind(parent_id)
        .bind(tour_id)
        .execute(pool)
        .await?;
        Ok(())
    }
}
