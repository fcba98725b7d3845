//! Repository for the `alternative_choices` table.

use sqlx::PgPool;
use tourdesk_core::types::DbId;

use crate::models::alternative::{AlternativeChoice, CreateAlternativeChoice};

const COLUMNS: &str =
    "id, reservation_id, user_id, original_tour_id, alternative_tour_id, created_at, updated_at";

pub struct AlternativeChoiceRepo;

impl AlternativeChoiceRepo {
    /// Record the preferred alternative for a reservation, replacing any
    /// earlier choice.
    pub async fn upsert(
        pool: &PgPool,
        input: &CreateAlternativeChoice,
    ) -> Result<AlternativeChoice, sqlx::Error> {
        let query = format!(
            "INSERT INTO alternative_choices
                (reservation_id, user_id, original_tour_id, alternative_tour_id)
             VALUES ($1, $2, $3, $4)
             ON CONFLICT (reservation_id) DO UPDATE
                SET alternative_tour_id = EXCLUDED.alternative_tour_id
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, AlternativeChoice>(&query)
            .bind(input.reservation_id)
            .bind(input.user_id)
            .bind(input.original_tour_id)
            .bind(input.alternative_tour_id)
            .fetch_one(pool)
            .await
    }

    pub async fn find_for_reservation(
        pool: &PgPool,
        reservation_id: DbId,
    ) -> Result<Option<AlternativeChoice>, sqlx::Error> {
        let query =
            format!("SELECT {COLUMNS} FROM alternative_choices WHERE reservation_id = $1");
        sqlx::query_as::<_, AlternativeChoice>(&query)
            .bind(reservation_id)
            .fetch_optional(pool)
            .await
    }

    /// Everyone hoping to move onto `tour_id`, earliest choice first.
    pub async fn list_for_alternative(
        pool: &PgPool,
        tour_id: DbId,
    ) -> Result<Vec<AlternativeChoice>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM alternative_choices
             WHERE alternative_tour_id = $1
             ORDER BY created_at, id"
        );
        sqlx::query_as::<_, AlternativeChoice>(&query)
            .bind(tour_id)
            .fetch_all(pool)
            .await
    }
}
