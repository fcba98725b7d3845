use crate::roles::Role;
use crate::types::DbId;

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: &'static str, id: DbId },

    #[error("Validation failed: {0}")]
    Validation(String),

    /// The request is redundant with existing state (e.g. an already-linked
    /// pair). Informational; nothing was written.
    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// A link was requested against an account holding the same role as the
    /// initiator.
    #[error("An account with email {email} is already registered as a {role}")]
    RoleMismatch { email: String, role: Role },

    /// Price or capacity could not be resolved for a tour. Retryable; no
    /// rows were written.
    #[error("Tour {tour_id} is unavailable: {reason}")]
    TourDataUnavailable { tour_id: DbId, reason: String },

    /// A collaborator outside the process (scanner, mailer, storage) failed.
    #[error("External service error: {0}")]
    ExternalService(String),

    #[error("Internal error: {0}")]
    Internal(String),
}
