//! End-to-end pipeline tests over the fixture path and stubbed failure
//! paths. No network, no browser: live-target behavior is exercised with
//! stub page sources and reserved-address targets.

use async_trait::async_trait;
use sightline_core::{BrowserConfig, ReportConfig, ScanId, ScanResult, ScanningConfig};
use sightline_db::scans::{self, Scan, ScanStatus};
use sightline_db::Database;
use sightline_report::{HtmlReportRenderer, ReportRenderer, ReportError};
use sightline_scanner::{
    BuiltinRules, DefaultPageSource, HeadlessBackend, LoadedPage, PageSource, ReportMode,
    SanitizedTarget, ScanError, ScanInput, ScanOrchestrator,
};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

async fn test_db() -> Arc<Database> {
    let db = Database::new(":memory:").await.expect("create database");
    db.run_migrations().await.expect("run migrations");
    Arc::new(db)
}

fn html_renderer(reports_dir: &std::path::Path) -> Arc<HtmlReportRenderer> {
    Arc::new(HtmlReportRenderer::new(&ReportConfig {
        reports_dir: reports_dir.to_path_buf(),
        ..ReportConfig::default()
    }))
}

fn orchestrator(
    db: Arc<Database>,
    source: Arc<dyn PageSource>,
    renderer: Arc<dyn ReportRenderer>,
    reports_dir: PathBuf,
) -> ScanOrchestrator {
    ScanOrchestrator::new(
        db,
        source,
        Arc::new(BuiltinRules::new()),
        renderer,
        ScanningConfig::default(),
        reports_dir,
    )
}

fn default_source() -> Arc<dyn PageSource> {
    Arc::new(DefaultPageSource::new(&ScanningConfig::default()).expect("build source"))
}

async fn wait_terminal(db: &Database, scan_id: &ScanId) -> Scan {
    for _ in 0..200 {
        let scan = scans::get_scan(db.pool(), scan_id).await.expect("get scan");
        if scan.status != ScanStatus::Pending {
            return scan;
        }
        tokio::time::sleep(Duration::from_millis(25)).await;
    }
    panic!("scan {scan_id} never left pending");
}

struct FailingSource;

/// Stub source serving the clean fixture document for any input.
struct CleanPageSource;

#[async_trait]
impl PageSource for CleanPageSource {
    async fn load(&self, _input: &ScanInput) -> Result<LoadedPage, ScanError> {
        Ok(LoadedPage {
            html: include_str!("../fixtures/accessible.html").to_string(),
            screenshot: None,
        })
    }
}

#[async_trait]
impl PageSource for FailingSource {
    async fn load(&self, _input: &ScanInput) -> Result<LoadedPage, ScanError> {
        Err(ScanError::LoadFailure("connection refused".to_string()))
    }
}

/// Renderer whose full/preview variants fail; the diagnostic fallback
/// optionally fails too.
struct BrokenRenderer {
    basic_works: bool,
    reports_dir: PathBuf,
}

#[async_trait]
impl ReportRenderer for BrokenRenderer {
    async fn render(&self, _result: &ScanResult) -> Result<PathBuf, ReportError> {
        Err(ReportError::Render("layout engine unavailable".to_string()))
    }

    async fn render_limited(
        &self,
        _result: &ScanResult,
        _evidence_cap: usize,
    ) -> Result<PathBuf, ReportError> {
        Err(ReportError::Render("layout engine unavailable".to_string()))
    }

    async fn render_basic(&self, url: &str) -> Result<PathBuf, ReportError> {
        if !self.basic_works {
            return Err(ReportError::Render("disk full".to_string()));
        }
        let path = self.reports_dir.join("basic.html");
        tokio::fs::write(&path, format!("<html><body>{url}</body></html>"))
            .await
            .map_err(ReportError::Io)?;
        Ok(path)
    }
}

#[tokio::test]
async fn test_fixture_scan_completes_with_report() {
    let db = test_db().await;
    let reports = tempfile::tempdir().expect("tempdir");
    let orchestrator = orchestrator(
        db.clone(),
        default_source(),
        html_renderer(reports.path()),
        reports.path().to_path_buf(),
    );

    let scan = orchestrator
        .start_scan("user-1", "test-sample", ReportMode::Full)
        .await
        .expect("start scan");
    assert_eq!(scan.status, ScanStatus::Pending);
    assert_eq!(scan.url, "test-sample");

    let finished = wait_terminal(&db, &scan.id).await;
    assert_eq!(finished.status, ScanStatus::Completed);

    let report_url = finished.report_url.expect("completed scan has a report");
    assert!(!report_url.is_empty());
    let artifact = reports.path().join(&report_url);
    let contents = tokio::fs::read_to_string(&artifact)
        .await
        .expect("report artifact readable");
    assert!(contents.contains("image-alt"));
}

#[tokio::test]
async fn test_fixture_execute_finds_violations() {
    let db = test_db().await;
    let reports = tempfile::tempdir().expect("tempdir");
    let orchestrator = orchestrator(
        db,
        default_source(),
        html_renderer(reports.path()),
        reports.path().to_path_buf(),
    );

    let input = ScanInput::resolve("test-sample").await.expect("resolve");
    let result = orchestrator
        .execute(&input, ReportMode::Full)
        .await
        .expect("execute");

    assert!(!result.violations.is_empty());
    assert!(!result.is_degraded());

    // Most severe first
    let ranks: Vec<u8> = result
        .violations
        .iter()
        .map(|v| sightline_core::Impact::rank_opt(v.impact))
        .collect();
    let mut sorted = ranks.clone();
    sorted.sort_unstable();
    assert_eq!(ranks, sorted);

    let clean_input = ScanInput::resolve("test-accessible").await.expect("resolve");
    let clean = orchestrator
        .execute(&clean_input, ReportMode::Full)
        .await
        .expect("execute accessible fixture");
    assert!(clean.violations.is_empty());
}

#[tokio::test]
async fn test_disallowed_target_rejected_without_row() {
    let db = test_db().await;
    let reports = tempfile::tempdir().expect("tempdir");
    let orchestrator = orchestrator(
        db.clone(),
        default_source(),
        html_renderer(reports.path()),
        reports.path().to_path_buf(),
    );

    let result = orchestrator
        .start_scan("user-1", "https://10.0.0.5/admin", ReportMode::Full)
        .await;
    assert!(matches!(result, Err(ScanError::DisallowedTarget(_))));

    let result = orchestrator
        .start_scan("user-1", "", ReportMode::Full)
        .await;
    assert!(matches!(result, Err(ScanError::InvalidTarget(_))));

    let rows = scans::list_for_user(db.pool(), "user-1")
        .await
        .expect("list scans");
    assert!(rows.is_empty(), "rejected scans must not leave rows behind");
}

#[tokio::test]
async fn test_live_load_failure_degrades_to_completed() {
    let db = test_db().await;
    let reports = tempfile::tempdir().expect("tempdir");
    let orchestrator = orchestrator(
        db.clone(),
        Arc::new(FailingSource),
        html_renderer(reports.path()),
        reports.path().to_path_buf(),
    );

    // Reserved literal: passes the sanitizer without DNS
    let input = ScanInput::resolve("https://93.184.216.34").await.expect("resolve");
    let scan = scans::create_scan(db.pool(), "user-1", input.url())
        .await
        .expect("create scan");

    orchestrator.run_pipeline(&scan.id, &input, ReportMode::Full).await;

    let finished = scans::get_scan(db.pool(), &scan.id).await.expect("get scan");
    assert_eq!(finished.status, ScanStatus::Completed);

    let artifact = reports.path().join(finished.report_url.expect("report"));
    let contents = tokio::fs::read_to_string(&artifact)
        .await
        .expect("degraded report readable");
    assert!(contents.contains("connection refused"));
}

#[tokio::test]
async fn test_render_failure_falls_back_to_basic() {
    let db = test_db().await;
    let reports = tempfile::tempdir().expect("tempdir");
    let orchestrator = orchestrator(
        db.clone(),
        default_source(),
        Arc::new(BrokenRenderer {
            basic_works: true,
            reports_dir: reports.path().to_path_buf(),
        }),
        reports.path().to_path_buf(),
    );

    let input = ScanInput::resolve("test-sample").await.expect("resolve");
    let scan = scans::create_scan(db.pool(), "user-1", input.url())
        .await
        .expect("create scan");

    orchestrator.run_pipeline(&scan.id, &input, ReportMode::Full).await;

    let finished = scans::get_scan(db.pool(), &scan.id).await.expect("get scan");
    assert_eq!(finished.status, ScanStatus::Completed);
    assert_eq!(finished.report_url.as_deref(), Some("basic.html"));
}

#[tokio::test]
async fn test_all_renders_failing_marks_failed() {
    let db = test_db().await;
    let reports = tempfile::tempdir().expect("tempdir");
    let orchestrator = orchestrator(
        db.clone(),
        default_source(),
        Arc::new(BrokenRenderer {
            basic_works: false,
            reports_dir: reports.path().to_path_buf(),
        }),
        reports.path().to_path_buf(),
    );

    let input = ScanInput::resolve("test-sample").await.expect("resolve");
    let scan = scans::create_scan(db.pool(), "user-1", input.url())
        .await
        .expect("create scan");

    orchestrator.run_pipeline(&scan.id, &input, ReportMode::Full).await;

    let finished = scans::get_scan(db.pool(), &scan.id).await.expect("get scan");
    assert_eq!(finished.status, ScanStatus::Failed);
    assert!(finished.report_url.is_none());
}

#[tokio::test]
async fn test_preview_mode_completes() {
    let db = test_db().await;
    let reports = tempfile::tempdir().expect("tempdir");
    let orchestrator = orchestrator(
        db.clone(),
        default_source(),
        html_renderer(reports.path()),
        reports.path().to_path_buf(),
    );

    let scan = orchestrator
        .start_scan("user-1", "test-sample", ReportMode::Preview)
        .await
        .expect("start scan");

    let finished = wait_terminal(&db, &scan.id).await;
    assert_eq!(finished.status, ScanStatus::Completed);

    let artifact = reports.path().join(finished.report_url.expect("report"));
    let contents = tokio::fs::read_to_string(&artifact)
        .await
        .expect("preview report readable");
    assert!(contents.contains("Preview report"));
}

#[tokio::test]
#[ignore = "Requires Chrome browser to be installed"]
async fn test_clean_live_page_still_gets_screenshot() {
    let db = test_db().await;
    let reports = tempfile::tempdir().expect("tempdir");
    let orchestrator = orchestrator(
        db,
        Arc::new(CleanPageSource),
        html_renderer(reports.path()),
        reports.path().to_path_buf(),
    )
    .with_headless(Arc::new(HeadlessBackend::new(&BrowserConfig::default())));

    // A live target whose document has no violations: the full-page
    // screenshot is still taken, only the evidence crops are empty.
    let input = ScanInput::Live(SanitizedTarget {
        href: "about:blank".to_string(),
        origin: "about:blank".to_string(),
        host: String::new(),
    });

    let result = orchestrator
        .execute(&input, ReportMode::Full)
        .await
        .expect("execute clean live scan");

    assert!(result.violations.is_empty());
    assert!(result.evidence.is_empty());
    assert!(result.screenshot.is_some());
}
