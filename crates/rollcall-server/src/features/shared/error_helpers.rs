//! Database error handling utilities
//!
//! Helpers for classifying constraint violations coming back from sqlx.
//!
//! # Examples
//!
//! ```rust,ignore
//! use rollcall_server::features::shared::error_helpers::unique_violation_on;
//!
//! .map_err(|e| {
//!     if unique_violation_on(&e, "email") {
//!         return CreateUserError::DuplicateEmail;
//!     }
//!     CreateUserError::Database(e)
//! })?;
//! ```

use sqlx::Error as SqlxError;

/// Check if the error is a unique constraint violation
pub fn is_unique_violation(error: &SqlxError) -> bool {
    if let SqlxError::Database(db_err) = error {
        return db_err.is_unique_violation();
    }
    false
}

/// Check if the error is a foreign key violation
pub fn is_foreign_key_violation(error: &SqlxError) -> bool {
    if let SqlxError::Database(db_err) = error {
        return db_err.is_foreign_key_violation();
    }
    false
}

/// Name of the violated constraint, when the driver reports one
pub fn violated_constraint(error: &SqlxError) -> Option<&str> {
    match error {
        SqlxError::Database(db_err) => db_err.constraint(),
        _ => None,
    }
}

/// True when `error` is a unique violation whose constraint (or message)
/// mentions `column`.
pub fn unique_violation_on(error: &SqlxError, column: &str) -> bool {
    if !is_unique_violation(error) {
        return false;
    }

    match violated_constraint(error) {
        Some(name) => name.contains(column),
        None => error.to_string().contains(column),
    }
}
