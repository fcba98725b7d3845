//! Repository for the `background_check_records` table.

use sqlx::PgPool;
use tourdesk_core::prerequisites::{BackgroundCheckStatus, BACKGROUND_CHECK_PENDING};
use tourdesk_core::types::DbId;

use crate::models::background_check::BackgroundCheckRecord;

const COLUMNS: &str =
    "id, user_id, document_ref, status, reviewed_by, submitted_at, completed_at";

pub struct BackgroundCheckRepo;

impl BackgroundCheckRepo {
    /// Record a submitted background check awaiting staff review.
    pub async fn create(
        pool: &PgPool,
        user_id: DbId,
        document_ref: &str,
    ) -> Result<BackgroundCheckRecord, sqlx::Error> {
        let query = format!(
            "INSERT INTO background_check_records (user_id, document_ref)
             VALUES ($1, $2)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, BackgroundCheckRecord>(&query)
            .bind(user_id)
            .bind(document_ref)
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_id(
        pool: &PgPool,
        id: DbId,
    ) -> Result<Option<BackgroundCheckRecord>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM background_check_records WHERE id = $1");
        sqlx::query_as::<_, BackgroundCheckRecord>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Pending checks, oldest submission first.
    pub async fn list_pending(pool: &PgPool) -> Result<Vec<BackgroundCheckRecord>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM background_check_records
             WHERE status = '{BACKGROUND_CHECK_PENDING}'
             ORDER BY submitted_at, id"
        );
        sqlx::query_as::<_, BackgroundCheckRecord>(&query)
            .fetch_all(pool)
            .await
    }

    /// Apply a staff decision to a pending check, stamping `completed_at`.
    ///
    /// Returns `None` if the check does not exist or was already decided.
    pub async fn decide(
        pool: &PgPool,
        id: DbId,
        decision: BackgroundCheckStatus,
        reviewer_id: DbId,
    ) -> Result<Option<BackgroundCheckRecord>, sqlx::Error> {
        let query = format!(
            "UPDATE background_check_records
             SET status = $2, reviewed_by = $3, completed_at = NOW()
             WHERE id = $1 AND status = '{BACKGROUND_CHECK_PENDING}'
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, BackgroundCheckRecord>(&query)
            .bind(id)
            .bind(decision.as_str())
            .bind(reviewer_id)
            .fetch_optional(pool)
            .await
    }

    /// The user's most recently decided check, approved or rejected.
    ///
    /// A newer rejection supersedes an older approval.
    pub async fn latest_decided(
        pool: &PgPool,
        user_id: DbId,
    ) -> Result<Option<BackgroundCheckRecord>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM background_check_records
             WHERE user_id = $1 AND status <> '{BACKGROUND_CHECK_PENDING}'
             ORDER BY completed_at DESC NULLS LAST, id DESC
             LIMIT 1"
        );
        sqlx::query_as::<_, BackgroundCheckRecord>(&query)
            .bind(user_id)
            .fetch_optional(pool)
            .await
    }
}
