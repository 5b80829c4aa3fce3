//! The report rendering seam.
//!
//! The pipeline only requires "a readable file at a path"; PDF layout and
//! typography live behind this trait. The bundled implementation is
//! `HtmlReportRenderer`.

use crate::error::Result;
use sightline_core::ScanResult;
use std::path::PathBuf;

/// Renders scan results into report artifacts.
#[async_trait::async_trait]
pub trait ReportRenderer: Send + Sync {
    /// Render a full report for a finished scan.
    async fn render(&self, result: &ScanResult) -> Result<PathBuf>;

    /// Render a preview report with evidence capped at `evidence_cap` violations.
    async fn render_limited(&self, result: &ScanResult, evidence_cap: usize) -> Result<PathBuf>;

    /// Render a reduced diagnostic report when no scan result is available.
    ///
    /// Last rung of the fallback ladder before a scan goes `failed`.
    async fn render_basic(&self, url: &str) -> Result<PathBuf>;
}
