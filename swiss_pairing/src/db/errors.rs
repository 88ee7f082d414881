//! Record store error types.

use std::time::Duration;

use thiserror::Error;

/// Record store errors
#[derive(Debug, Error)]
pub enum StoreError {
    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Query did not complete in time
    #[error("Database operation timed out after {0:?}")]
    Timeout(Duration),

    /// Write rejected by a uniqueness rule, such as a second bye
    #[error("Conflicting record: {0}")]
    Conflict(String),

    /// Stored data violates an invariant the store relies on
    #[error("Corrupt store state: {0}")]
    Corrupt(String),
}

/// Result type for record store operations
pub type StoreResult<T> = Result<T, StoreError>;
