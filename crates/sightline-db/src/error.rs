//! Database error types.

use thiserror::Error;

/// Database-specific errors.
#[derive(Debug, Error)]
pub enum DatabaseError {
    /// Failed to open or create database connection.
    #[error("failed to open database: {0}")]
    Open(String),

    /// Migration execution failed.
    #[error("migration failed: {0}")]
    Migration(String),

    /// Requested record was not found.
    #[error("scan not found: {0}")]
    ScanNotFound(String),

    /// Underlying `SQLx` error.
    #[error("database error: {0}")]
    Sqlx(#[from] sqlx::Error),
}

/// Result type alias for database operations.
pub type Result<T> = std::result::Result<T, DatabaseError>;
