//! Repository for the `account_links` table.
//!
//! Queries are written once and parameterized by which side of the link the
//! caller stands on, via [`side_columns`].

use sqlx::{PgConnection, PgPool};
use tourdesk_core::link::{LinkRecord, LINK_STATUS_APPROVED, LINK_STATUS_PENDING};
use tourdesk_core::roles::Role;
use tourdesk_core::types::DbId;

use crate::models::link::{AccountLink, CreateLink, LinkedCounterpart};

const COLUMNS: &str = "id, minor_id, guardian_id, minor_email, guardian_email, status, \
                       initiated_by, created_at, updated_at";

/// `(id_column, email_column)` for the side of a link held by `role`.
///
/// Staff never appear on links, so callers get an empty result for them.
fn side_columns(role: Role) -> Option<(&'static str, &'static str)> {
    match role {
        Role::Minor => Some(("minor_id", "minor_email")),
        Role::Guardian => Some(("guardian_id", "guardian_email")),
        Role::Staff => None,
    }
}

pub struct LinkRepo;

impl LinkRepo {
    pub async fn create(pool: &PgPool, input: &CreateLink) -> Result<AccountLink, sqlx::Error> {
        let query = format!(
            "INSERT INTO account_links
                (minor_id, guardian_id, minor_email, guardian_email, status, initiated_by)
             VALUES ($1, $2, $3, $4, $5, $6)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, AccountLink>(&query)
            .bind(input.minor_id)
            .bind(input.guardian_id)
            .bind(&input.minor_email)
            .bind(&input.guardian_email)
            .bind(input.status.as_str())
            .bind(input.initiated_by)
            .fetch_one(pool)
            .await
    }

    /// Insert a link unless it would duplicate a linked pair or an open
    /// invitation. Returns `None` when an equivalent row already exists.
    pub async fn create_if_absent(
        pool: &PgPool,
        input: &CreateLink,
    ) -> Result<Option<AccountLink>, sqlx::Error> {
        let query = format!(
            "INSERT INTO account_links
                (minor_id, guardian_id, minor_email, guardian_email, status, initiated_by)
             VALUES ($1, $2, $3, $4, $5, $6)
             ON CONFLICT DO NOTHING
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, AccountLink>(&query)
            .bind(input.minor_id)
            .bind(input.guardian_id)
            .bind(&input.minor_email)
            .bind(&input.guardian_email)
            .bind(input.status.as_str())
            .bind(input.initiated_by)
            .fetch_optional(pool)
            .await
    }

    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<AccountLink>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM account_links WHERE id = $1");
        sqlx::query_as::<_, AccountLink>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Find the link between two registered accounts, whatever its status.
    pub async fn find_pair(
        pool: &PgPool,
        minor_id: DbId,
        guardian_id: DbId,
    ) -> Result<Option<AccountLink>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM account_links WHERE minor_id = $1 AND guardian_id = $2"
        );
        sqlx::query_as::<_, AccountLink>(&query)
            .bind(minor_id)
            .bind(guardian_id)
            .fetch_optional(pool)
            .await
    }

    /// Find an outstanding invitation from `initiator` to `email`.
    pub async fn find_open_invitation(
        pool: &PgPool,
        initiator_role: Role,
        initiator_id: DbId,
        email: &str,
    ) -> Result<Option<AccountLink>, sqlx::Error> {
        let (Some((own_id, _)), Some((other_id, other_email))) = (
            side_columns(initiator_role),
            initiator_role.counterpart().and_then(side_columns),
        ) else {
            return Ok(None);
        };
        let query = format!(
            "SELECT {COLUMNS} FROM account_links
             WHERE {own_id} = $1 AND {other_id} IS NULL AND {other_email} = $2"
        );
        sqlx::query_as::<_, AccountLink>(&query)
            .bind(initiator_id)
            .bind(email)
            .fetch_optional(pool)
            .await
    }

    /// Links whose `role` side is still waiting on `email`, locked for the
    /// rest of the caller's transaction.
    pub async fn lock_awaiting(
        conn: &mut PgConnection,
        role: Role,
        email: &str,
    ) -> Result<Vec<AccountLink>, sqlx::Error> {
        let Some((id_col, email_col)) = side_columns(role) else {
            return Ok(Vec::new());
        };
        let query = format!(
            "SELECT {COLUMNS} FROM account_links
             WHERE {id_col} IS NULL AND {email_col} = $1
             ORDER BY id
             FOR UPDATE"
        );
        sqlx::query_as::<_, AccountLink>(&query)
            .bind(email)
            .fetch_all(conn)
            .await
    }

    /// Write back the account ids and status of a link record.
    pub async fn store_record(
        conn: &mut PgConnection,
        record: &LinkRecord,
    ) -> Result<AccountLink, sqlx::Error> {
        let query = format!(
            "UPDATE account_links SET minor_id = $2, guardian_id = $3, status = $4
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, AccountLink>(&query)
            .bind(record.id)
            .bind(record.minor.account_id())
            .bind(record.guardian.account_id())
            .bind(record.status.as_str())
            .fetch_one(conn)
            .await
    }

    /// Approve a pending link. Only the party that did not initiate the link
    /// may approve it.
    pub async fn approve(
        pool: &PgPool,
        id: DbId,
        approver_id: DbId,
    ) -> Result<Option<AccountLink>, sqlx::Error> {
        let query = format!(
            "UPDATE account_links SET status = '{LINK_STATUS_APPROVED}'
             WHERE id = $1
               AND status = '{LINK_STATUS_PENDING}'
               AND initiated_by <> $2
               AND (minor_id = $2 OR guardian_id = $2)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, AccountLink>(&query)
            .bind(id)
            .bind(approver_id)
            .fetch_optional(pool)
            .await
    }

    /// Counterparts linked to `account_id`, oldest link first.
    ///
    /// Unregistered counterparts appear with only their invited email.
    pub async fn list_counterparts(
        pool: &PgPool,
        role: Role,
        account_id: DbId,
        include_pending: bool,
    ) -> Result<Vec<LinkedCounterpart>, sqlx::Error> {
        let (Some((own_id, _)), Some((other_id, other_email))) =
            (side_columns(role), role.counterpart().and_then(side_columns))
        else {
            return Ok(Vec::new());
        };
        let query = format!(
            "SELECT l.id AS link_id, l.status, l.{other_id} AS account_id, a.name,
                    COALESCE(a.email, l.{other_email}) AS email, l.initiated_by
             FROM account_links l
             LEFT JOIN accounts a ON a.id = l.{other_id}
             WHERE l.{own_id} = $1
               AND ($2 OR l.status = '{LINK_STATUS_APPROVED}')
             ORDER BY l.created_at, l.id"
        );
        sqlx::query_as::<_, LinkedCounterpart>(&query)
            .bind(account_id)
            .bind(include_pending)
            .fetch_all(pool)
            .await
    }

    /// Ids of registered counterparts linked to `account_id`.
    pub async fn linked_account_ids(
        pool: &PgPool,
        role: Role,
        account_id: DbId,
        include_pending: bool,
    ) -> Result<Vec<DbId>, sqlx::Error> {
        let counterparts = Self::list_counterparts(pool, role, account_id, include_pending).await?;
        Ok(counterparts.into_iter().filter_map(|c| c.account_id).collect())
    }
}
