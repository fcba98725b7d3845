//! Guardian/minor link records and the link request protocol.
//!
//! A link row always has the same shape (`minor_id`, `guardian_id`,
//! `minor_email`, `guardian_email`, `status`). Either side may still be
//! waiting for its account to be created, in which case only the email is
//! known. [`LinkParty`] makes that distinction explicit and [`LinkRecord`]
//! exposes both sides through role-keyed accessors so callers never branch on
//! which column to read.

use serde::{Deserialize, Serialize};
use validator::ValidateEmail;

use crate::error::CoreError;
use crate::roles::Role;
use crate::types::DbId;

/// Lifetime of an emailed link invitation.
pub const INVITATION_TTL_HOURS: i64 = 24;

pub const LINK_STATUS_PENDING: &str = "pending";
pub const LINK_STATUS_APPROVED: &str = "approved";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LinkStatus {
    Pending,
    Approved,
}

impl LinkStatus {
    pub fn from_str_value(s: &str) -> Result<Self, CoreError> {
        match s {
            LINK_STATUS_PENDING => Ok(Self::Pending),
            LINK_STATUS_APPROVED => Ok(Self::Approved),
            _ => Err(CoreError::Internal(format!("Unknown link status '{s}'"))),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => LINK_STATUS_PENDING,
            Self::Approved => LINK_STATUS_APPROVED,
        }
    }
}

/// One side of a link.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum LinkParty {
    /// The account exists.
    Resolved { account_id: DbId },
    /// Invited but not yet signed up; matched by email at signup.
    Unresolved { email: String },
}

impl LinkParty {
    /// Build a party from the nullable id/email column pair of a link row.
    pub fn from_columns(id: Option<DbId>, email: Option<&str>) -> Result<Self, CoreError> {
        match (id, email) {
            (Some(account_id), _) => Ok(Self::Resolved { account_id }),
            (None, Some(email)) => Ok(Self::Unresolved {
                email: email.to_string(),
            }),
            (None, None) => Err(CoreError::Internal(
                "Link side has neither an account id nor an email".into(),
            )),
        }
    }

    pub fn account_id(&self) -> Option<DbId> {
        match self {
            Self::Resolved { account_id } => Some(*account_id),
            Self::Unresolved { .. } => None,
        }
    }
}

/// A link row lifted into the sum-typed representation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LinkRecord {
    pub id: DbId,
    pub minor: LinkParty,
    pub guardian: LinkParty,
    pub status: LinkStatus,
}

impl LinkRecord {
    /// The side of the link held by `role`. `None` for staff.
    pub fn party(&self, role: Role) -> Option<&LinkParty> {
        match role {
            Role::Minor => Some(&self.minor),
            Role::Guardian => Some(&self.guardian),
            Role::Staff => None,
        }
    }

    /// The side opposite to `role`.
    pub fn counterpart_of(&self, role: Role) -> Option<&LinkParty> {
        role.counterpart().and_then(|other| self.party(other))
    }

    /// Fill the unresolved side for `role` if its email matches.
    ///
    /// Returns `true` when the record changed.
    pub fn resolve(&mut self, role: Role, email: &str, account_id: DbId) -> bool {
        let side = match role {
            Role::Minor => &mut self.minor,
            Role::Guardian => &mut self.guardian,
            Role::Staff => return false,
        };
        match side {
            LinkParty::Unresolved { email: stored } if stored == email => {
                *side = LinkParty::Resolved { account_id };
                true
            }
            _ => false,
        }
    }
}

/// Trim, lowercase and validate an email address.
pub fn normalize_email(raw: &str) -> Result<String, CoreError> {
    let email = raw.trim().to_lowercase();
    if !email.as_str().validate_email() {
        return Err(CoreError::Validation(format!(
            "'{}' is not a valid email address",
            raw.trim()
        )));
    }
    Ok(email)
}

/// What a link request should do, decided before anything is written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkPlan {
    /// The counterpart already has an account: store a pending link to it.
    LinkExisting { counterpart_id: DbId },
    /// No account yet: issue an invitation and store an unresolved link.
    Invite,
}

/// Reported back to the initiator of a link request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LinkRequestOutcome {
    Linked,
    Invited,
    AlreadyLinked,
}

/// Decide how to handle a link request.
///
/// `counterpart` is the account currently registered under the requested
/// email, if any. Requests against an account of the same role (or a staff
/// account) are rejected with [`CoreError::RoleMismatch`].
pub fn plan_link_request(
    initiator_id: DbId,
    initiator_role: Role,
    counterpart_email: &str,
    counterpart: Option<(DbId, Role)>,
) -> Result<LinkPlan, CoreError> {
    let expected = initiator_role.counterpart().ok_or_else(|| {
        CoreError::Forbidden("Staff accounts cannot create guardian links".into())
    })?;

    match counterpart {
        Some((id, _)) if id == initiator_id => Err(CoreError::Validation(
            "You cannot link an account to itself".into(),
        )),
        Some((_, role)) if role != expected => Err(CoreError::RoleMismatch {
            email: counterpart_email.to_string(),
            role,
        }),
        Some((counterpart_id, _)) => Ok(LinkPlan::LinkExisting { counterpart_id }),
        None => Ok(LinkPlan::Invite),
    }
}
