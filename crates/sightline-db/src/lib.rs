//! Sightline Database Layer
//!
//! `SQLite` access via `SQLx` with embedded, versioned migrations.
//!
//! The only entity owned here is the `scans` table: one row per requested
//! accessibility scan, created `pending` and moved to a terminal state
//! exactly once by the scan orchestrator.
//!
//! # Example
//!
//! ```ignore
//! use sightline_db::Database;
//!
//! let db = Database::new("sightline.db").await?;
//! db.run_migrations().await?;
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

pub mod error;
pub mod migrations;
pub mod scans;

// Re-export commonly used types
pub use error::{DatabaseError, Result};
pub use scans::{Scan, ScanStatus};

use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Pool, Sqlite};
use std::path::Path;
use std::str::FromStr;

/// High-level database interface with connection pooling and migrations.
#[derive(Debug)]
pub struct Database {
    pool: Pool<Sqlite>,
}

impl Database {
    /// Open (or create) a `SQLite` database at the specified path.
    ///
    /// # Arguments
    /// * `path` - Path to the database file (or `:memory:` for in-memory)
    ///
    /// # Errors
    /// Returns `DatabaseError::Open` if the database cannot be opened.
    pub async fn new(path: impl AsRef<Path>) -> Result<Self> {
        let path_str = path
            .as_ref()
            .to_str()
            .ok_or_else(|| DatabaseError::Open("invalid database path: not valid UTF-8".to_string()))?;

        let connect_options = SqliteConnectOptions::from_str(path_str)
            .map_err(|e| DatabaseError::Open(format!("invalid connection string: {e}")))?
            .create_if_missing(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(connect_options)
            .await
            .map_err(|e| DatabaseError::Open(format!("failed to initialize pool: {e}")))?;

        tracing::info!("Database pool created at {}", path_str);

        Ok(Self { pool })
    }

    /// Run all pending database migrations.
    ///
    /// # Errors
    /// Returns `DatabaseError::Migration` if any migration fails.
    pub async fn run_migrations(&self) -> Result<()> {
        migrations::run_migrations(&self.pool).await
    }

    /// Get a reference to the underlying `SQLx` pool.
    #[must_use]
    pub fn pool(&self) -> &Pool<Sqlite> {
        &self.pool
    }

    /// Close the connection pool gracefully.
    pub async fn close(self) {
        self.pool.close().await;
        tracing::info!("Database pool closed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_pool_creation() {
        let db = Database::new(":memory:").await.expect("create database");
        sqlx::query("SELECT 1")
            .execute(db.pool())
            .await
            .expect("execute query");
    }

    #[tokio::test]
    async fn test_pool_close() {
        let db = Database::new(":memory:").await.expect("create database");
        db.close().await; // Should not panic
    }
}
