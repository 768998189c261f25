//! Error types for the pagination core.
//!
//! This module defines a two-level hierarchy:
//!
//! - [`StorageError`] - Failures reported by a record source or store
//! - [`PaginationError`] - Request validation failures plus wrapped storage errors
//!
//! Storage errors convert into pagination errors via `From`, so `?` works
//! across the boundary. Callers use [`PaginationError::is_client_error`] to
//! map a failure onto a client-input or a backend category.

use thiserror::Error;

// =============================================================================
// Storage Errors
// =============================================================================

/// Database and repository errors.
///
/// These errors originate from storage operations such as range queries,
/// point lookups, and record mutations.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Failed to establish database connection.
    #[error("Database connection error: {0}")]
    ConnectionError(String),

    /// Query execution failed.
    #[error("Query execution error: {0}")]
    QueryError(String),

    /// A uniqueness or integrity constraint was violated.
    #[error("Constraint violation: {0}")]
    ConstraintViolation(String),

    /// A relation or column name is not a plain SQL identifier.
    #[error("Invalid identifier: {0}")]
    InvalidIdentifier(String),

    /// Data serialization/deserialization failed.
    #[error("Serialization error: {0}")]
    SerializationError(String),
}

// =============================================================================
// Pagination Errors
// =============================================================================

/// Failures of a single pagination call.
///
/// Every variant except [`PaginationError::Storage`] is caused by the request
/// itself and is never worth retrying.
#[derive(Debug, Error)]
pub enum PaginationError {
    /// `first` or `last` is outside `1..=100`.
    #[error("Pagination index error: `{argument}` must be between 1 and {max}, got {value}", max = crate::ports::MAX_PAGE_SIZE)]
    PageSizeOutOfRange {
        /// Name of the offending argument (`first` or `last`).
        argument: &'static str,
        /// Value supplied by the caller.
        value: i32,
    },

    /// `last` was given without a `before` cursor.
    #[error("Can't paginate backwards from the start: `last` requires a `before` cursor")]
    BackwardWithoutAnchor,

    /// The cursor is not a record id.
    #[error("Invalid cursor: {0}")]
    InvalidCursor(String),

    /// Storage operation failed.
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

impl PaginationError {
    /// Whether the failure was caused by the caller's input rather than the backend.
    pub fn is_client_error(&self) -> bool {
        !matches!(self, PaginationError::Storage(_))
    }

    /// Short label used for metrics and logs.
    pub fn reason(&self) -> &'static str {
        match self {
            PaginationError::PageSizeOutOfRange { .. } => "page_size",
            PaginationError::BackwardWithoutAnchor => "backward_without_anchor",
            PaginationError::InvalidCursor(_) => "invalid_cursor",
            PaginationError::Storage(_) => "storage",
        }
    }
}

// =============================================================================
// Result Type Aliases
// =============================================================================

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Result type for pagination operations.
pub type PaginationResult<T> = Result<T, PaginationError>;

#[cfg(test)]
mod tests {
    use super::*;

    // Test critique: la conversion Storage -> Pagination préserve le message
    // et reste classée comme erreur backend
    #[test]
    fn test_storage_error_converts_and_is_backend() {
        let storage_err = StorageError::QueryError("db failed".into());
        let err: PaginationError = storage_err.into();

        assert!(err.to_string().contains("db failed"));
        assert!(!err.is_client_error());
        assert_eq!(err.reason(), "storage");
    }

    // Test critique: toutes les erreurs de validation sont des erreurs client
    #[test]
    fn test_validation_errors_are_client_errors() {
        let errors = [
            PaginationError::PageSizeOutOfRange {
                argument: "first",
                value: 0,
            },
            PaginationError::BackwardWithoutAnchor,
            PaginationError::InvalidCursor("nope".into()),
        ];
        assert!(errors.iter().all(PaginationError::is_client_error));
    }

    #[test]
    fn test_page_size_message_names_argument() {
        let err = PaginationError::PageSizeOutOfRange {
            argument: "last",
            value: 101,
        };
        let msg = err.to_string();
        assert!(msg.contains("`last`") && msg.contains("101") && msg.contains("100"));
    }
}
