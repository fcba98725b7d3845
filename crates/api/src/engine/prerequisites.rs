//! Prerequisite checks over stored records.
//!
//! Each check is a read; the recency rules themselves live in
//! `tourdesk_core::prerequisites`.

use chrono::Utc;
use sqlx::PgPool;
use tourdesk_core::prerequisites::has_recent_signature;
use tourdesk_core::types::{DbId, Timestamp};
use tourdesk_db::repositories::{
    AccountRepo, BackgroundCheckRepo, CodeOfConductRepo, ConsentRepo,
};

use crate::error::AppResult;

/// Evaluates prerequisites as of a fixed instant, so one checklist run sees
/// a consistent "now" across every check.
pub struct PrerequisiteChecker<'a> {
    pool: &'a PgPool,
    now: Timestamp,
}

impl<'a> PrerequisiteChecker<'a> {
    pub fn new(pool: &'a PgPool) -> Self {
        Self::at(pool, Utc::now())
    }

    pub fn at(pool: &'a PgPool, now: Timestamp) -> Self {
        Self { pool, now }
    }

    pub async fn has_signed_code_of_conduct(
        &self,
        user_id: DbId,
        within_days: i64,
    ) -> Result<bool, sqlx::Error> {
        let latest = CodeOfConductRepo::latest_signed_at(self.pool, user_id).await?;
        Ok(has_recent_signature(latest, self.now, within_days))
    }

    /// Consent is tracked per (student, tour).
    pub async fn has_signed_consent(
        &self,
        student_id: DbId,
        tour_id: DbId,
        within_days: i64,
    ) -> Result<bool, sqlx::Error> {
        let latest = ConsentRepo::latest_signed_at(self.pool, student_id, tour_id).await?;
        Ok(has_recent_signature(latest, self.now, within_days))
    }

    /// Both the front and back of the ID are on file. Unknown accounts have
    /// no ID.
    pub async fn has_valid_photo_id(&self, user_id: DbId) -> Result<bool, sqlx::Error> {
        Ok(AccountRepo::find_by_id(self.pool, user_id)
            .await?
            .is_some_and(|account| account.has_photo_id()))
    }

    /// The latest decided check is an approval completed within the window.
    pub async fn has_recent_background_check(
        &self,
        user_id: DbId,
        within_days: i64,
    ) -> AppResult<bool> {
        match BackgroundCheckRepo::latest_decided(self.pool, user_id).await? {
            Some(check) => Ok(check.counts_at(self.now, within_days)?),
            None => Ok(false),
        }
    }
}
