//! Account entity model and DTOs.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use tourdesk_core::checklist::is_profile_complete;
use tourdesk_core::error::CoreError;
use tourdesk_core::prerequisites::has_valid_photo_id;
use tourdesk_core::roles::Role;
use tourdesk_core::types::{DbId, Timestamp};

/// Full account row from the `accounts` table.
///
/// Holds storage references for identity documents. Use [`AccountResponse`]
/// for external-facing output.
#[derive(Debug, Clone, FromRow)]
pub struct Account {
    pub id: DbId,
    pub role: String,
    pub name: String,
    pub email: String,
    pub birthdate: Option<NaiveDate>,
    pub phone: Option<String>,
    pub school: Option<String>,
    pub grade: Option<String>,
    pub id_front_ref: Option<String>,
    pub id_back_ref: Option<String>,
    pub profile_completed_by: Option<DbId>,
    pub profile_completed_at: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Account {
    pub fn role(&self) -> Result<Role, CoreError> {
        Role::from_str_value(&self.role)
    }

    pub fn has_photo_id(&self) -> bool {
        has_valid_photo_id(self.id_front_ref.as_deref(), self.id_back_ref.as_deref())
    }

    pub fn profile_complete(&self) -> bool {
        self.role()
            .map(|role| is_profile_complete(role, self.birthdate, self.phone.as_deref()))
            .unwrap_or(false)
    }
}

/// Account representation for API responses (no storage references).
#[derive(Debug, Clone, Serialize)]
pub struct AccountResponse {
    pub id: DbId,
    pub role: String,
    pub name: String,
    pub email: String,
    pub birthdate: Option<NaiveDate>,
    pub phone: Option<String>,
    pub school: Option<String>,
    pub grade: Option<String>,
    pub profile_complete: bool,
    pub photo_id_on_file: bool,
    /// The guardian who filled in this profile, if it was not the account
    /// holder.
    pub profile_completed_by: Option<DbId>,
    pub created_at: Timestamp,
}

impl From<&Account> for AccountResponse {
    fn from(a: &Account) -> Self {
        Self {
            id: a.id,
            role: a.role.clone(),
            name: a.name.clone(),
            email: a.email.clone(),
            birthdate: a.birthdate,
            phone: a.phone.clone(),
            school: a.school.clone(),
            grade: a.grade.clone(),
            profile_complete: a.profile_complete(),
            photo_id_on_file: a.has_photo_id(),
            profile_completed_by: a.profile_completed_by,
            created_at: a.created_at,
        }
    }
}

/// DTO for creating a new account. `email` must already be normalized.
#[derive(Debug, Clone)]
pub struct CreateAccount {
    pub role: Role,
    pub name: String,
    pub email: String,
    pub birthdate: Option<NaiveDate>,
}

/// A guardian's submission of a linked student's profile. Every field is
/// required.
#[derive(Debug, Deserialize)]
pub struct StudentProfile {
    pub name: String,
    pub birthdate: NaiveDate,
    pub school: String,
    pub grade: String,
}

/// DTO for updating profile fields. All fields are optional.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateProfile {
    pub name: Option<String>,
    pub birthdate: Option<NaiveDate>,
    pub phone: Option<String>,
    pub school: Option<String>,
    pub grade: Option<String>,
}
