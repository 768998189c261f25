//! Shared helper functions for PostgreSQL query building and error mapping.

use keyset_core::error::StorageError;

/// Validate a relation or column name and return it double-quoted.
///
/// Accepts `[A-Za-z_][A-Za-z0-9_]*`, optionally schema-qualified as
/// `schema.name`. Each part is quoted separately.
pub fn quote_identifier(name: &str) -> Result<String, StorageError> {
    let parts: Vec<&str> = name.split('.').collect();
    if parts.len() > 2 || !parts.iter().all(|p| is_plain_identifier(p)) {
        return Err(StorageError::InvalidIdentifier(name.to_string()));
    }

    Ok(parts
        .iter()
        .map(|p| format!("\"{}\"", p))
        .collect::<Vec<_>>()
        .join("."))
}

fn is_plain_identifier(part: &str) -> bool {
    let mut chars = part.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    part.len() <= 63 && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Map a sqlx error onto a storage error, keeping unique violations apart.
pub fn query_error(e: sqlx::Error) -> StorageError {
    match e.as_database_error() {
        Some(db) if db.is_unique_violation() => StorageError::ConstraintViolation(db.to_string()),
        _ => StorageError::QueryError(e.to_string()),
    }
}
