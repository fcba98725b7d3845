//! Upload acceptance rules for identity and background-check documents.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// File extensions accepted for every document upload.
pub const ALLOWED_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "pdf"];

/// Default upload size cap (10 MiB).
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentKind {
    IdFront,
    IdBack,
    BackgroundCheck,
}

impl DocumentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::IdFront => "id_front",
            Self::IdBack => "id_back",
            Self::BackgroundCheck => "background_check",
        }
    }

    /// Human-readable label used in error messages.
    pub fn label(&self) -> &'static str {
        match self {
            Self::IdFront => "photo ID (front)",
            Self::IdBack => "photo ID (back)",
            Self::BackgroundCheck => "background check",
        }
    }
}

/// Validate an upload's name and size, returning its lowercase extension.
pub fn validate_upload(
    kind: DocumentKind,
    filename: &str,
    size: usize,
    max_bytes: usize,
) -> Result<String, CoreError> {
    if size == 0 {
        return Err(CoreError::Validation(format!(
            "No file selected for the {}",
            kind.label()
        )));
    }
    if size > max_bytes {
        return Err(CoreError::Validation(format!(
            "The {} exceeds the {max_bytes} byte limit",
            kind.label()
        )));
    }
    let ext = filename
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_lowercase())
        .unwrap_or_default();
    if !ALLOWED_EXTENSIONS.contains(&ext.as_str()) {
        return Err(CoreError::Validation(format!(
            "Invalid file type for the {}. Only JPG, JPEG, PNG, or PDF allowed",
            kind.label()
        )));
    }
    Ok(ext)
}

/// Result of a virus scan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanVerdict {
    Clean,
    Infected { signature: String },
    /// The scanner could not be reached or gave no usable answer.
    Unavailable { reason: String },
}

impl ScanVerdict {
    /// Accept only a clean verdict. An unavailable scanner rejects the upload.
    pub fn into_result(self, kind: DocumentKind) -> Result<(), CoreError> {
        match self {
            Self::Clean => Ok(()),
            Self::Infected { signature } => Err(CoreError::Validation(format!(
                "Upload rejected. The {} contains a virus ({signature})",
                kind.label()
            ))),
            Self::Unavailable { reason } => Err(CoreError::ExternalService(format!(
                "Upload rejected. The {} could not be safely scanned ({reason}); \
                 it has been flagged for manual review",
                kind.label()
            ))),
        }
    }

    /// Whether this verdict should be recorded for staff follow-up.
    pub fn needs_manual_review(&self) -> bool {
        !matches!(self, Self::Clean)
    }
}
