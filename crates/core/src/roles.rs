//! Account roles.
//!
//! The role is fixed when an account is created. These strings must match the
//! `CHECK` constraint on `accounts.role`.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

pub const ROLE_GUARDIAN: &str = "guardian";
pub const ROLE_MINOR: &str = "minor";
pub const ROLE_STAFF: &str = "staff";

/// All valid role strings.
pub const VALID_ROLES: &[&str] = &[ROLE_GUARDIAN, ROLE_MINOR, ROLE_STAFF];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Guardian,
    Minor,
    Staff,
}

impl Role {
    /// Convert from a database string value.
    pub fn from_str_value(s: &str) -> Result<Self, CoreError> {
        match s {
            ROLE_GUARDIAN => Ok(Self::Guardian),
            ROLE_MINOR => Ok(Self::Minor),
            ROLE_STAFF => Ok(Self::Staff),
            _ => Err(CoreError::Validation(format!(
                "Invalid role '{s}'. Must be one of: {}",
                VALID_ROLES.join(", ")
            ))),
        }
    }

    /// Convert to the database string value.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Guardian => ROLE_GUARDIAN,
            Self::Minor => ROLE_MINOR,
            Self::Staff => ROLE_STAFF,
        }
    }

    /// The role on the other side of a guardian/minor link.
    ///
    /// Staff accounts never take part in links.
    pub fn counterpart(&self) -> Option<Role> {
        match self {
            Self::Guardian => Some(Self::Minor),
            Self::Minor => Some(Self::Guardian),
            Self::Staff => None,
        }
    }

    /// Whether an account with this role may be created through public signup.
    pub fn is_self_registrable(&self) -> bool {
        !matches!(self, Self::Staff)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
