//! Repository for the `flagged_uploads` table.

use sqlx::PgPool;
use tourdesk_core::types::DbId;

use crate::models::flagged_upload::{CreateFlaggedUpload, FlaggedUpload};

const COLUMNS: &str = "id, user_id, kind, filename, reason, resolved, created_at";

pub struct FlaggedUploadRepo;

impl FlaggedUploadRepo {
    pub async fn create(
        pool: &PgPool,
        input: &CreateFlaggedUpload,
    ) -> Result<FlaggedUpload, sqlx::Error> {
        let query = format!(
            "INSERT INTO flagged_uploads (user_id, kind, filename, reason)
             VALUES ($1, $2, $3, $4)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, FlaggedUpload>(&query)
            .bind(input.user_id)
            .bind(&input.kind)
            .bind(&input.filename)
            .bind(&input.reason)
            .fetch_one(pool)
            .await
    }

    /// Unresolved flags, newest first.
    pub async fn list_open(pool: &PgPool) -> Result<Vec<FlaggedUpload>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM flagged_uploads WHERE NOT resolved ORDER BY created_at DESC"
        );
        sqlx::query_as::<_, FlaggedUpload>(&query).fetch_all(pool).await
    }

    /// Returns `true` if the flag was open and is now resolved.
    pub async fn resolve(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result =
            sqlx::query("UPDATE flagged_uploads SET resolved = true WHERE id = $1 AND NOT resolved")
                .bind(id)
                .execute(pool)
                .await?;
        Ok(result.rows_affected() > 0)
    }
}
