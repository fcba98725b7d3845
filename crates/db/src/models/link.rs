//! Guardian/minor link model.

use serde::Serialize;
use sqlx::FromRow;
use tourdesk_core::error::CoreError;
use tourdesk_core::link::{LinkParty, LinkRecord, LinkStatus};
use tourdesk_core::types::{DbId, Timestamp};

/// A row from the `account_links` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct AccountLink {
    pub id: DbId,
    pub minor_id: Option<DbId>,
    pub guardian_id: Option<DbId>,
    pub minor_email: Option<String>,
    pub guardian_email: Option<String>,
    pub status: String,
    pub initiated_by: DbId,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl AccountLink {
    /// Lift the nullable column pairs into a [`LinkRecord`].
    pub fn to_record(&self) -> Result<LinkRecord, CoreError> {
        Ok(LinkRecord {
            id: self.id,
            minor: LinkParty::from_columns(self.minor_id, self.minor_email.as_deref())?,
            guardian: LinkParty::from_columns(self.guardian_id, self.guardian_email.as_deref())?,
            status: LinkStatus::from_str_value(&self.status)?,
        })
    }
}

/// DTO for inserting a link. Each side needs an id, an email, or both.
#[derive(Debug, Clone)]
pub struct CreateLink {
    pub minor_id: Option<DbId>,
    pub guardian_id: Option<DbId>,
    pub minor_email: Option<String>,
    pub guardian_email: Option<String>,
    pub status: LinkStatus,
    pub initiated_by: DbId,
}

/// The counterpart on a link, seen from one account.
///
/// `account_id` and `name` are `None` while the counterpart has not signed
/// up yet; only the invited email is known.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct LinkedCounterpart {
    pub link_id: DbId,
    pub status: String,
    pub account_id: Option<DbId>,
    pub name: Option<String>,
    pub email: String,
    pub initiated_by: DbId,
}
