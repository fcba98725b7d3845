//! Consent forms and code-of-conduct signatures.

use serde::Serialize;
use sqlx::FromRow;
use tourdesk_core::types::{DbId, Timestamp};

/// A row from the `consent_forms` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ConsentForm {
    pub id: DbId,
    pub student_id: DbId,
    pub tour_id: DbId,
    pub signer_id: DbId,
    pub signature_text: String,
    pub source_ip: Option<String>,
    pub signed_at: Timestamp,
}

#[derive(Debug, Clone)]
pub struct CreateConsentForm {
    pub student_id: DbId,
    pub tour_id: DbId,
    pub signer_id: DbId,
    pub signature_text: String,
    pub source_ip: Option<String>,
}

/// A row from the `code_of_conduct_records` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct CodeOfConductRecord {
    pub id: DbId,
    pub user_id: DbId,
    pub signature_text: String,
    pub source_ip: Option<String>,
    pub signed_at: Timestamp,
}

#[derive(Debug, Clone)]
pub struct CreateCodeOfConductRecord {
    pub user_id: DbId,
    pub signature_text: String,
    pub source_ip: Option<String>,
}
