//! Repository for the `accounts` table.

use sqlx::{PgConnection, PgPool};
use tourdesk_core::roles::Role;
use tourdesk_core::types::DbId;

use crate::models::account::{Account, CreateAccount, StudentProfile, UpdateProfile};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, role, name, email, birthdate, phone, school, grade, \
                       id_front_ref, id_back_ref, profile_completed_by, profile_completed_at, \
                       created_at, updated_at";

pub struct AccountRepo;

impl AccountRepo {
    /// Insert a new account, returning the created row.
    pub async fn create(pool: &PgPool, input: &CreateAccount) -> Result<Account, sqlx::Error> {
        let mut conn = pool.acquire().await?;
        Self::insert(&mut conn, input).await
    }

    /// Insert on an existing connection, so registration can share a
    /// transaction with link resolution.
    pub async fn insert(
        conn: &mut PgConnection,
        input: &CreateAccount,
    ) -> Result<Account, sqlx::Error> {
        let query = format!(
            "INSERT INTO accounts (role, name, email, birthdate)
             VALUES ($1, $2, $3, $4)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Account>(&query)
            .bind(input.role.as_str())
            .bind(&input.name)
            .bind(&input.email)
            .bind(input.birthdate)
            .fetch_one(conn)
            .await
    }

    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Account>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM accounts WHERE id = $1");
        sqlx::query_as::<_, Account>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Accounts with the given ids, in no particular order. Unknown ids are
    /// skipped.
    pub async fn find_many(pool: &PgPool, ids: &[DbId]) -> Result<Vec<Account>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM accounts WHERE id = ANY($1)");
        sqlx::query_as::<_, Account>(&query)
            .bind(ids)
            .fetch_all(pool)
            .await
    }

    /// Find an account by normalized email.
    pub async fn find_by_email(pool: &PgPool, email: &str) -> Result<Option<Account>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM accounts WHERE email = $1");
        sqlx::query_as::<_, Account>(&query)
            .bind(email)
            .fetch_optional(pool)
            .await
    }

    /// Update profile fields. Only non-`None` fields are applied.
    pub async fn update_profile(
        pool: &PgPool,
        id: DbId,
        input: &UpdateProfile,
    ) -> Result<Option<Account>, sqlx::Error> {
        let query = format!(
            "UPDATE accounts SET
                name = COALESCE($2, name),
                birthdate = COALESCE($3, birthdate),
                phone = COALESCE($4, phone),
                school = COALESCE($5, school),
                grade = COALESCE($6, grade)
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Account>(&query)
            .bind(id)
            .bind(&input.name)
            .bind(input.birthdate)
            .bind(&input.phone)
            .bind(&input.school)
            .bind(&input.grade)
            .fetch_optional(pool)
            .await
    }

    /// Fill in a student's profile on behalf of `completed_by`.
    ///
    /// Returns `None` unless `student_id` is a minor account.
    pub async fn complete_student_profile(
        pool: &PgPool,
        student_id: DbId,
        completed_by: DbId,
        input: &StudentProfile,
    ) -> Result<Option<Account>, sqlx::Error> {
        let query = format!(
            "UPDATE accounts SET
                name = $3, birthdate = $4, school = $5, grade = $6,
                profile_completed_by = $2, profile_completed_at = NOW()
             WHERE id = $1 AND role = $7
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Account>(&query)
            .bind(student_id)
            .bind(completed_by)
            .bind(&input.name)
            .bind(input.birthdate)
            .bind(&input.school)
            .bind(&input.grade)
            .bind(Role::Minor.as_str())
            .fetch_optional(pool)
            .await
    }

    /// Store both photo ID references at once.
    pub async fn set_photo_id(
        pool: &PgPool,
        id: DbId,
        front_ref: &str,
        back_ref: &str,
    ) -> Result<Option<Account>, sqlx::Error> {
        let query = format!(
            "UPDATE accounts SET id_front_ref = $2, id_back_ref = $3
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Account>(&query)
            .bind(id)
            .bind(front_ref)
            .bind(back_ref)
            .fetch_optional(pool)
            .await
    }

    /// Remove both photo ID references. Returns the previous references so
    /// the caller can delete the stored files.
    pub async fn clear_photo_id(
        pool: &PgPool,
        id: DbId,
    ) -> Result<Option<(Option<String>, Option<String>)>, sqlx::Error> {
        sqlx::query_as::<_, (Option<String>, Option<String>)>(
            "UPDATE accounts a SET id_front_ref = NULL, id_back_ref = NULL
             FROM (SELECT id, id_front_ref, id_back_ref FROM accounts WHERE id = $1 FOR UPDATE) old
             WHERE a.id = old.id
             RETURNING old.id_front_ref, old.id_back_ref",
        )
        .bind(id)
        .fetch_optional(pool)
        .await
    }
}
