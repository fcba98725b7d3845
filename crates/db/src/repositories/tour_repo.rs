//! Repository for the tour catalogue (`price_tiers`, `tour_templates`,
//! `tour_instances`) and the registered-seat counter.

use chrono::NaiveDate;
use sqlx::{PgConnection, PgPool};
use tourdesk_core::allocation::DEFAULT_TOUR_CAPACITY;
use tourdesk_core::types::DbId;

use crate::models::tour::{
    CreateTourInstance, CreateTourTemplate, PriceTier, TourInstance, TourListing, TourTemplate,
};

const INSTANCE_COLUMNS: &str =
    "id, template_id, tour_date, capacity, registered_count, created_at";

/// Instance joined with template and price tier. Used by every read that
/// needs price and availability together.
const LISTING_SELECT: &str = "SELECT i.id, i.template_id, t.title, t.description, i.tour_date,
            i.capacity, i.registered_count, p.price_cents
     FROM tour_instances i
     JOIN tour_templates t ON t.id = i.template_id
     LEFT JOIN price_tiers p ON p.id = t.price_tier_id";

pub struct TourRepo;

impl TourRepo {
    pub async fn create_price_tier(
        pool: &PgPool,
        name: &str,
        price_cents: i64,
    ) -> Result<PriceTier, sqlx::Error> {
        sqlx::query_as::<_, PriceTier>(
            "INSERT INTO price_tiers (name, price_cents) VALUES ($1, $2)
             RETURNING id, name, price_cents, created_at",
        )
        .bind(name)
        .bind(price_cents)
        .fetch_one(pool)
        .await
    }

    pub async fn create_template(
        pool: &PgPool,
        input: &CreateTourTemplate,
    ) -> Result<TourTemplate, sqlx::Error> {
        sqlx::query_as::<_, TourTemplate>(
            "INSERT INTO tour_templates (title, description, price_tier_id) VALUES ($1, $2, $3)
             RETURNING id, title, description, price_tier_id, created_at",
        )
        .bind(&input.title)
        .bind(&input.description)
        .bind(input.price_tier_id)
        .fetch_one(pool)
        .await
    }

    pub async fn create_instance(
        pool: &PgPool,
        input: &CreateTourInstance,
    ) -> Result<TourInstance, sqlx::Error> {
        let query = format!(
            "INSERT INTO tour_instances (template_id, tour_date, capacity)
             VALUES ($1, $2, $3)
             RETURNING {INSTANCE_COLUMNS}"
        );
        sqlx::query_as::<_, TourInstance>(&query)
            .bind(input.template_id)
            .bind(input.tour_date)
            .bind(input.capacity.unwrap_or(DEFAULT_TOUR_CAPACITY))
            .fetch_one(pool)
            .await
    }

    pub async fn find_instance(
        pool: &PgPool,
        id: DbId,
    ) -> Result<Option<TourInstance>, sqlx::Error> {
        let query = format!("SELECT {INSTANCE_COLUMNS} FROM tour_instances WHERE id = $1");
        sqlx::query_as::<_, TourInstance>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Title, price, capacity and registered count for one tour, in a
    /// single read.
    pub async fn find_listing(pool: &PgPool, id: DbId) -> Result<Option<TourListing>, sqlx::Error> {
        let query = format!("{LISTING_SELECT} WHERE i.id = $1");
        sqlx::query_as::<_, TourListing>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Tours on or after `from`, soonest first.
    pub async fn list_upcoming(
        pool: &PgPool,
        from: NaiveDate,
    ) -> Result<Vec<TourListing>, sqlx::Error> {
        let query = format!("{LISTING_SELECT} WHERE i.tour_date >= $1 ORDER BY i.tour_date, i.id");
        sqlx::query_as::<_, TourListing>(&query)
            .bind(from)
            .fetch_all(pool)
            .await
    }

    /// Claim one seat if any is free.
    ///
    /// The check and the increment happen in one statement, so concurrent
    /// callers can never push `registered_count` past `capacity`. Returns the
    /// new count, or `None` if the tour was full (or does not exist).
    pub async fn try_claim_seat(
        conn: &mut PgConnection,
        tour_id: DbId,
    ) -> Result<Option<i32>, sqlx::Error> {
        sqlx::query_scalar::<_, i32>(
            "UPDATE tour_instances
             SET registered_count = registered_count + 1
             WHERE id = $1 AND registered_count < capacity
             RETURNING registered_count",
        )
        .bind(tour_id)
        .fetch_optional(conn)
        .await
    }

    /// Give back a previously claimed seat.
    pub async fn release_seat(conn: &mut PgConnection, tour_id: DbId) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE tour_instances
             SET registered_count = registered_count - 1
             WHERE id = $1 AND registered_count > 0",
        )
        .bind(tour_id)
        .execute(conn)
        .await?;
        Ok(())
    }
}
