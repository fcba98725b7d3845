//! Prerequisite predicates.
//!
//! Each predicate answers one question about records already loaded by the
//! caller. Recency windows are inclusive: a record signed exactly `days` ago
//! still counts.

use chrono::Duration;
use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::types::Timestamp;

pub const DEFAULT_CONSENT_WINDOW_DAYS: i64 = 60;
pub const DEFAULT_CODE_OF_CONDUCT_WINDOW_DAYS: i64 = 180;
pub const DEFAULT_BACKGROUND_CHECK_WINDOW_DAYS: i64 = 180;

pub const BACKGROUND_CHECK_PENDING: &str = "pending";
pub const BACKGROUND_CHECK_APPROVED: &str = "approved";
pub const BACKGROUND_CHECK_REJECTED: &str = "rejected";

/// Lookback windows, in days, for each time-boxed attestation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecencyPolicy {
    pub consent_days: i64,
    pub code_of_conduct_days: i64,
    pub background_check_days: i64,
}

impl Default for RecencyPolicy {
    fn default() -> Self {
        Self {
            consent_days: DEFAULT_CONSENT_WINDOW_DAYS,
            code_of_conduct_days: DEFAULT_CODE_OF_CONDUCT_WINDOW_DAYS,
            background_check_days: DEFAULT_BACKGROUND_CHECK_WINDOW_DAYS,
        }
    }
}

/// Earliest timestamp that still falls inside a window of `days`.
pub fn window_start(now: Timestamp, days: i64) -> Timestamp {
    now - Duration::days(days)
}

pub fn is_within_window(signed_at: Timestamp, now: Timestamp, days: i64) -> bool {
    signed_at >= window_start(now, days)
}

/// True when the most recent signature (if any) is inside the window.
pub fn has_recent_signature(latest: Option<Timestamp>, now: Timestamp, days: i64) -> bool {
    latest.is_some_and(|at| is_within_window(at, now, days))
}

/// Both sides of the photo ID must be on file.
pub fn has_valid_photo_id(front_ref: Option<&str>, back_ref: Option<&str>) -> bool {
    let present = |r: Option<&str>| r.is_some_and(|s| !s.trim().is_empty());
    present(front_ref) && present(back_ref)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackgroundCheckStatus {
    Pending,
    Approved,
    Rejected,
}

impl BackgroundCheckStatus {
    pub fn from_str_value(s: &str) -> Result<Self, CoreError> {
        match s {
            BACKGROUND_CHECK_PENDING => Ok(Self::Pending),
            BACKGROUND_CHECK_APPROVED => Ok(Self::Approved),
            BACKGROUND_CHECK_REJECTED => Ok(Self::Rejected),
            _ => Err(CoreError::Validation(format!(
                "Invalid background check status '{s}'"
            ))),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => BACKGROUND_CHECK_PENDING,
            Self::Approved => BACKGROUND_CHECK_APPROVED,
            Self::Rejected => BACKGROUND_CHECK_REJECTED,
        }
    }

    /// Only pending checks can be decided by staff.
    pub fn validate_decision(&self, decision: BackgroundCheckStatus) -> Result<(), CoreError> {
        if *self != Self::Pending {
            return Err(CoreError::Conflict(format!(
                "Background check already {}",
                self.as_str()
            )));
        }
        if decision == Self::Pending {
            return Err(CoreError::Validation(
                "A decision must be 'approved' or 'rejected'".into(),
            ));
        }
        Ok(())
    }
}

/// An approved check counts only while its completion date is in the window.
pub fn background_check_counts(
    status: BackgroundCheckStatus,
    completed_at: Option<Timestamp>,
    now: Timestamp,
    days: i64,
) -> bool {
    status == BackgroundCheckStatus::Approved && has_recent_signature(completed_at, now, days)
}
