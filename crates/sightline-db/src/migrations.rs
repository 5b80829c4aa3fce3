//! Database migration management.
//!
//! Embeds SQL migrations and applies them automatically using `SQLx`'s
//! built-in migration support with compile-time embedding.

use crate::error::{DatabaseError, Result};
use sqlx::{Pool, Sqlite};

/// Run all pending database migrations.
///
/// Applies all migrations in the `migrations/` directory that haven't been
/// applied yet; applied migrations are tracked in a `_sqlx_migrations` table.
///
/// # Errors
/// Returns `DatabaseError::Migration` if any migration fails to execute.
pub async fn run_migrations(pool: &Pool<Sqlite>) -> Result<()> {
    tracing::info!("Running database migrations");

    sqlx::migrate!("./migrations")
        .run(pool)
        .await
        .map_err(|e| DatabaseError::Migration(format!("migration execution failed: {e}")))?;

    tracing::info!("Database migrations completed successfully");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Database;

    #[tokio::test]
    async fn test_run_migrations() {
        let db = Database::new(":memory:").await.expect("create database");
        db.run_migrations().await.expect("run migrations");

        let tables: Vec<String> = sqlx::query_scalar(
            "SELECT name FROM sqlite_master WHERE type='table' AND name NOT LIKE 'sqlite_%' AND name != '_sqlx_migrations' ORDER BY name"
        )
        .fetch_all(db.pool())
        .await
        .expect("query tables");

        assert_eq!(tables, vec!["scans"]);
    }

    #[tokio::test]
    async fn test_migrations_idempotent() {
        let db = Database::new(":memory:").await.expect("create database");
        db.run_migrations().await.expect("first migration run");
        db.run_migrations()
            .await
            .expect("second migration run should be idempotent");
    }
}
