//! Centralized error types for board operations.

use kanban_db::DbError;
use thiserror::Error;

/// Main error type for board operations.
#[derive(Error, Debug)]
pub enum KanbanError {
    #[error("Board not found: {0}")]
    BoardNotFound(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("User not found: {0}")]
    UserNotFound(String),

    #[error("Access denied")]
    AccessDenied,

    #[error("Forbidden - {0}")]
    Forbidden(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Database error: {0}")]
    Database(DbError),
}

/// Result type for board operations.
pub type KanbanResult<T> = Result<T, KanbanError>;

impl KanbanError {
    /// Create a validation error.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::ValidationError(msg.into())
    }

    /// Create a forbidden error.
    pub fn forbidden(msg: impl Into<String>) -> Self {
        Self::Forbidden(msg.into())
    }
}

impl From<DbError> for KanbanError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound(what) => Self::NotFound(what),
            DbError::Conflict(what) => Self::Conflict(what),
            other => Self::Database(other),
        }
    }
}

/// Trim `value` and reject it when empty.
pub(crate) fn required(field: &str, value: &str) -> KanbanResult<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(KanbanError::validation(format!("{} is required", field)));
    }
    Ok(trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_db_errors_keep_their_kind() {
        assert!(matches!(
            KanbanError::from(DbError::NotFound("Card: x".into())),
            KanbanError::NotFound(_)
        ));
        assert!(matches!(
            KanbanError::from(DbError::Conflict("dup".into())),
            KanbanError::Conflict(_)
        ));
        assert!(matches!(
            KanbanError::from(DbError::InvalidRecord("bad".into())),
            KanbanError::Database(_)
        ));
    }

    #[test]
    fn test_required_trims() {
        assert_eq!(required("Title", "  Todo ").unwrap(), "Todo");
        assert!(matches!(required("Title", "   "), Err(KanbanError::ValidationError(_))));
    }
}
