//! Scan record management.
//!
//! A scan row is created in `pending` state synchronously when a scan is
//! requested, and moved to a terminal state (`completed` or `failed`)
//! exactly once by the orchestrator when background processing finishes.

use crate::error::{DatabaseError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sightline_core::ScanId;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use std::fmt;
use std::str::FromStr;

/// Persisted scan record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scan {
    /// Unique identifier (UUID v4)
    pub id: ScanId,
    /// Owning user
    pub user_id: String,
    /// Scanned URL (or fixture token)
    pub url: String,
    /// Current lifecycle status
    pub status: ScanStatus,
    /// Report artifact path, set when the scan completed
    pub report_url: Option<String>,
    /// When the scan was requested
    pub created_at: DateTime<Utc>,
}

/// Lifecycle status of a scan record.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ScanStatus {
    /// Created, background pipeline not finished yet
    Pending,
    /// Finished with a report artifact (possibly a degraded one)
    Completed,
    /// Finished without any report artifact
    Failed,
}

impl fmt::Display for ScanStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::Completed => write!(f, "completed"),
            Self::Failed => write!(f, "failed"),
        }
    }
}

impl FromStr for ScanStatus {
    type Err = DatabaseError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "pending" => Ok(Self::Pending),
            "completed" => Ok(Self::Completed),
            "failed" => Ok(Self::Failed),
            other => Err(DatabaseError::Open(format!("unknown scan status '{other}'"))),
        }
    }
}

fn scan_from_row(row: &SqliteRow) -> Result<Scan> {
    let id: String = row.try_get("id")?;
    let status: String = row.try_get("status")?;
    let created_at: String = row.try_get("created_at")?;
    Ok(Scan {
        id: ScanId::new(id)
            .map_err(|e| DatabaseError::Open(format!("invalid scan id in row: {e}")))?,
        user_id: row.try_get("user_id")?,
        url: row.try_get("url")?,
        status: status.parse()?,
        report_url: row.try_get("report_url")?,
        created_at: DateTime::parse_from_rfc3339(&created_at)
            .map_err(|e| DatabaseError::Open(format!("invalid created_at timestamp: {e}")))?
            .with_timezone(&Utc),
    })
}

/// Create a new scan record in `pending` state.
pub async fn create_scan(pool: &SqlitePool, user_id: &str, url: &str) -> Result<Scan> {
    let id = ScanId::generate();
    let created_at = Utc::now();

    sqlx::query(
        "INSERT INTO scans (id, user_id, url, status, created_at) VALUES (?, ?, ?, 'pending', ?)",
    )
    .bind(id.as_str())
    .bind(user_id)
    .bind(url)
    .bind(created_at.to_rfc3339())
    .execute(pool)
    .await?;

    Ok(Scan {
        id,
        user_id: user_id.to_string(),
        url: url.to_string(),
        status: ScanStatus::Pending,
        report_url: None,
        created_at,
    })
}

/// Move a scan to a terminal status.
///
/// The `WHERE status = 'pending'` guard makes the transition write-once:
/// returns `true` when this call performed the transition, `false` when the
/// row was already terminal (or missing).
pub async fn mark_terminal(
    pool: &SqlitePool,
    scan_id: &ScanId,
    status: ScanStatus,
    report_url: Option<&str>,
) -> Result<bool> {
    debug_assert!(status != ScanStatus::Pending, "terminal status expected");

    let result = sqlx::query(
        "UPDATE scans SET status = ?, report_url = ? WHERE id = ? AND status = 'pending'",
    )
    .bind(status.to_string())
    .bind(report_url)
    .bind(scan_id.as_str())
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

/// Fetch a single scan by id.
pub async fn get_scan(pool: &SqlitePool, scan_id: &ScanId) -> Result<Scan> {
    let row = sqlx::query("SELECT * FROM scans WHERE id = ?")
        .bind(scan_id.as_str())
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| DatabaseError::ScanNotFound(scan_id.to_string()))?;

    scan_from_row(&row)
}

/// List a user's scans, newest first (scan-history surface).
pub async fn list_for_user(pool: &SqlitePool, user_id: &str) -> Result<Vec<Scan>> {
    let rows = sqlx::query("SELECT * FROM scans WHERE user_id = ? ORDER BY created_at DESC")
        .bind(user_id)
        .fetch_all(pool)
        .await?;

    rows.iter().map(scan_from_row).collect()
}
