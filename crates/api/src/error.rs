use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use tourdesk_core::error::CoreError;

/// Application-level error type for HTTP handlers.
///
/// Wraps [`CoreError`] for domain errors and adds HTTP-specific variants.
/// Every response carries a safe `redirect` target alongside the message so
/// the client always knows where to send the user next.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// A domain-level error from `tourdesk_core`.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// A database error from sqlx.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A bad request with a human-readable message.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// An internal error with a human-readable message.
    #[error("Internal error: {0}")]
    InternalError(String),

    /// Any of the above, with a redirect chosen by the handler.
    #[error("{source}")]
    Redirected {
        source: Box<AppError>,
        redirect: String,
    },
}

/// Convenience type alias for handler return values.
pub type AppResult<T> = Result<T, AppError>;

impl AppError {
    /// Replace the default redirect target.
    pub fn redirect_to(self, path: impl Into<String>) -> Self {
        let source = match self {
            AppError::Redirected { source, .. } => source,
            other => Box::new(other),
        };
        AppError::Redirected {
            source,
            redirect: path.into(),
        }
    }

    /// Status, machine-readable code and user-facing message.
    fn parts(&self) -> (StatusCode, &'static str, String) {
        match self {
            // --- CoreError variants ---
            AppError::Core(core) => match core {
                CoreError::NotFound { entity, id } => (
                    StatusCode::NOT_FOUND,
                    "NOT_FOUND",
                    format!("{entity} with id {id} not found"),
                ),
                CoreError::Validation(msg) => {
                    (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone())
                }
                CoreError::Conflict(msg) => (StatusCode::CONFLICT, "CONFLICT", msg.clone()),
                CoreError::Unauthorized(msg) => {
                    (StatusCode::UNAUTHORIZED, "UNAUTHORIZED", msg.clone())
                }
                CoreError::Forbidden(msg) => (StatusCode::FORBIDDEN, "FORBIDDEN", msg.clone()),
                CoreError::RoleMismatch { .. } => {
                    (StatusCode::CONFLICT, "ROLE_MISMATCH", core.to_string())
                }
                CoreError::TourDataUnavailable { tour_id, reason } => {
                    tracing::warn!(tour_id, reason = %reason, "Tour data unavailable");
                    (
                        StatusCode::SERVICE_UNAVAILABLE,
                        "TOUR_DATA_UNAVAILABLE",
                        "This tour cannot be booked right now. Please try again later".to_string(),
                    )
                }
                CoreError::ExternalService(msg) => {
                    tracing::warn!(error = %msg, "External service failure");
                    (StatusCode::BAD_GATEWAY, "EXTERNAL_SERVICE_ERROR", msg.clone())
                }
                CoreError::Internal(msg) => {
                    tracing::error!(error = %msg, "Internal core error");
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        "INTERNAL_ERROR",
                        "An internal error occurred".to_string(),
                    )
                }
            },

            // --- Database errors ---
            AppError::Database(err) => classify_sqlx_error(err),

            // --- HTTP-specific errors ---
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg.clone()),
            AppError::InternalError(msg) => {
                tracing::error!(error = %msg, "Internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal error occurred".to_string(),
                )
            }
            AppError::Redirected { source, .. } => source.parts(),
        }
    }

    /// Where the client lands when the handler did not choose a target.
    fn default_redirect(&self) -> &'static str {
        match self {
            AppError::Core(CoreError::Unauthorized(_)) => "/login",
            AppError::Core(CoreError::RoleMismatch { .. }) => "/links",
            AppError::Core(CoreError::TourDataUnavailable { .. }) => "/tours",
            _ => "/",
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = self.parts();
        let redirect = match &self {
            AppError::Redirected { redirect, .. } => redirect.clone(),
            other => other.default_redirect().to_string(),
        };

        let body = json!({
            "error": message,
            "code": code,
            "redirect": redirect,
        });

        (status, axum::Json(body)).into_response()
    }
}

/// Classify a sqlx error into an HTTP status, error code, and message.
///
/// - `RowNotFound` maps to 404.
/// - Unique constraint violations (constraint name starting with `uq_`) map to 409.
/// - Everything else maps to 500 with a sanitized message.
fn classify_sqlx_error(err: &sqlx::Error) -> (StatusCode, &'static str, String) {
    match err {
        sqlx::Error::RowNotFound => (
            StatusCode::NOT_FOUND,
            "NOT_FOUND",
            "Resource not found".to_string(),
        ),
        sqlx::Error::Database(db_err) => {
            // PostgreSQL unique constraint violation: error code 23505
            if db_err.code().as_deref() == Some("23505") {
                let constraint = db_err.constraint().unwrap_or("unknown");
                if constraint.starts_with("uq_") {
                    return (
                        StatusCode::CONFLICT,
                        "CONFLICT",
                        unique_violation_message(constraint),
                    );
                }
            }
            tracing::error!(error = %db_err, "Database error");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_ERROR",
                "An internal error occurred".to_string(),
            )
        }
        other => {
            tracing::error!(error = %other, "Database error");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_ERROR",
                "An internal error occurred".to_string(),
            )
        }
    }
}

fn unique_violation_message(constraint: &str) -> String {
    match constraint {
        "uq_accounts_email" => "An account with this email already exists".to_string(),
        "uq_account_links_pair" => "These accounts are already linked".to_string(),
        "uq_reservations_student_tour" => {
            "This student already has a reservation for this tour".to_string()
        }
        other => format!("Duplicate value violates unique constraint: {other}"),
    }
}
