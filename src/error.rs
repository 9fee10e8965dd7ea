use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use serde_json::json;
use thiserror::Error;

/// Error taxonomy for the leave core. Every variant carries a human-readable
/// reason and maps to a stable HTTP status in [`ResponseError`].
#[derive(Debug, Error)]
pub enum LeaveError {
    /// Bad request shape or date ordering. User-correctable.
    #[error("{0}")]
    Validation(String),

    /// A policy rule failed (duration, notice, holiday conflict, overlap).
    #[error("{0}")]
    PolicyViolation(String),

    /// Business-state conflict; may be transient under concurrency.
    #[error("insufficient leave balance: available {available}, required {required}")]
    InsufficientBalance { available: f32, required: f32 },

    #[error("{resource} not found: {detail}")]
    NotFound {
        resource: &'static str,
        detail: String,
    },

    /// Wrong actor for the action.
    #[error("{0}")]
    PermissionDenied(String),

    /// Lost a race on a row transition; safe to retry once.
    #[error("{0}")]
    Conflict(String),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl LeaveError {
    pub fn not_found(resource: &'static str, detail: impl Into<String>) -> Self {
        LeaveError::NotFound {
            resource,
            detail: detail.into(),
        }
    }
}

impl ResponseError for LeaveError {
    fn status_code(&self) -> StatusCode {
        match self {
            LeaveError::Validation(_) => StatusCode::BAD_REQUEST,
            LeaveError::PolicyViolation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            LeaveError::InsufficientBalance { .. } => StatusCode::CONFLICT,
            LeaveError::NotFound { .. } => StatusCode::NOT_FOUND,
            LeaveError::PermissionDenied(_) => StatusCode::FORBIDDEN,
            LeaveError::Conflict(_) => StatusCode::CONFLICT,
            LeaveError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        // DB details stay in the logs, not in the response body.
        if let LeaveError::Database(e) = self {
            tracing::error!(error = %e, "database error");
            return HttpResponse::InternalServerError().json(json!({
                "message": "Internal Server Error"
            }));
        }

        HttpResponse::build(self.status_code()).json(json!({
            "message": self.to_string()
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn statuses_follow_the_taxonomy() {
        assert_eq!(
            LeaveError::Validation("x".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            LeaveError::PolicyViolation("x".into()).status_code(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            LeaveError::InsufficientBalance {
                available: 1.0,
                required: 3.0
            }
            .status_code(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            LeaveError::not_found("LeaveApplication", "id 9").status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            LeaveError::PermissionDenied("x".into()).status_code(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            LeaveError::Conflict("x".into()).status_code(),
            StatusCode::CONFLICT
        );
    }

    #[test]
    fn insufficient_balance_message_names_both_amounts() {
        let e = LeaveError::InsufficientBalance {
            available: 2.0,
            required: 5.0,
        };
        let msg = e.to_string();
        assert!(msg.contains('2') && msg.contains('5'));
    }
}
