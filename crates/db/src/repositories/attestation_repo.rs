//! Repositories for `consent_forms` and `code_of_conduct_records`.
//!
//! Both tables are append-only. Recency is decided by the caller from the
//! latest `signed_at`.

use sqlx::PgPool;
use tourdesk_core::types::{DbId, Timestamp};

use crate::models::attestation::{
    CodeOfConductRecord, ConsentForm, CreateCodeOfConductRecord, CreateConsentForm,
};

const CONSENT_COLUMNS: &str =
    "id, student_id, tour_id, signer_id, signature_text, source_ip, signed_at";

const COC_COLUMNS: &str = "id, user_id, signature_text, source_ip, signed_at";

pub struct ConsentRepo;

impl ConsentRepo {
    pub async fn create(
        pool: &PgPool,
        input: &CreateConsentForm,
    ) -> Result<ConsentForm, sqlx::Error> {
        let query = format!(
            "INSERT INTO consent_forms (student_id, tour_id, signer_id, signature_text, source_ip)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING {CONSENT_COLUMNS}"
        );
        sqlx::query_as::<_, ConsentForm>(&query)
            .bind(input.student_id)
            .bind(input.tour_id)
            .bind(input.signer_id)
            .bind(&input.signature_text)
            .bind(&input.source_ip)
            .fetch_one(pool)
            .await
    }

    /// Most recent consent for a (student, tour) pair.
    pub async fn latest_signed_at(
        pool: &PgPool,
        student_id: DbId,
        tour_id: DbId,
    ) -> Result<Option<Timestamp>, sqlx::Error> {
        sqlx::query_scalar::<_, Option<Timestamp>>(
            "SELECT MAX(signed_at) FROM consent_forms WHERE student_id = $1 AND tour_id = $2",
        )
        .bind(student_id)
        .bind(tour_id)
        .fetch_one(pool)
        .await
    }
}

pub struct CodeOfConductRepo;

impl CodeOfConductRepo {
    pub async fn create(
        pool: &PgPool,
        input: &CreateCodeOfConductRecord,
    ) -> Result<CodeOfConductRecord, sqlx::Error> {
        let query = format!(
            "INSERT INTO code_of_conduct_records (user_id, signature_text, source_ip)
             VALUES ($1, $2, $3)
             RETURNING {COC_COLUMNS}"
        );
        sqlx::query_as::<_, CodeOfConductRecord>(&query)
            .bind(input.user_id)
            .bind(&input.signature_text)
            .bind(&input.source_ip)
            .fetch_one(pool)
            .await
    }

    pub async fn latest_signed_at(
        pool: &PgPool,
        user_id: DbId,
    ) -> Result<Option<Timestamp>, sqlx::Error> {
        sqlx::query_scalar::<_, Option<Timestamp>>(
            "SELECT MAX(signed_at) FROM code_of_conduct_records WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_one(pool)
        .await
    }
}
