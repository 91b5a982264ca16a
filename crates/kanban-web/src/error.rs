//! HTTP error mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use kanban_core::KanbanError;

use crate::auth::AuthError;

/// Error returned by handlers, rendered as `{"error": "<message>"}`.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(StatusCode::FORBIDDEN, message)
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, err.to_string())
    }
}

impl From<KanbanError> for ApiError {
    fn from(err: KanbanError) -> Self {
        match err {
            KanbanError::BoardNotFound(_) => Self::new(StatusCode::NOT_FOUND, "Board not found"),
            KanbanError::NotFound(_) | KanbanError::UserNotFound(_) => {
                Self::new(StatusCode::NOT_FOUND, err.to_string())
            }
            KanbanError::AccessDenied => Self::forbidden("Access denied"),
            KanbanError::Forbidden(_) => Self::forbidden(err.to_string()),
            KanbanError::Conflict(msg) => Self::new(StatusCode::CONFLICT, msg),
            KanbanError::ValidationError(msg) => Self::bad_request(msg),
            KanbanError::Database(e) => {
                tracing::error!(error = %e, "Store failure");
                Self::new(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "error": self.message }))).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        let cases = [
            (KanbanError::BoardNotFound("b".into()), StatusCode::NOT_FOUND),
            (KanbanError::AccessDenied, StatusCode::FORBIDDEN),
            (KanbanError::forbidden("insufficient permissions"), StatusCode::FORBIDDEN),
            (KanbanError::Conflict("dup".into()), StatusCode::CONFLICT),
            (KanbanError::validation("Title is required"), StatusCode::BAD_REQUEST),
        ];
        for (err, status) in cases {
            assert_eq!(ApiError::from(err).status, status);
        }
        assert_eq!(ApiError::from(AuthError::TokenExpired).status, StatusCode::UNAUTHORIZED);
    }
}
