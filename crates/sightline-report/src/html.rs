//! Bundled HTML report writer.
//!
//! Produces a self-contained branded HTML artifact per scan. Evidence
//! screenshots stay raw PNG bytes in memory and are written as sibling
//! files next to the report; the HTML references them by relative path.

use crate::error::{ReportError, Result};
use crate::renderer::ReportRenderer;
use sightline_core::{EvidenceShot, ReportConfig, ScanResult, Violation};
use std::path::{Path, PathBuf};

/// Writes report artifacts under a configured reports directory.
#[derive(Debug, Clone)]
pub struct HtmlReportRenderer {
    reports_dir: PathBuf,
    product_name: String,
    accent_color: String,
}

impl HtmlReportRenderer {
    /// Create a renderer from report configuration.
    #[must_use]
    pub fn new(config: &ReportConfig) -> Self {
        Self {
            reports_dir: config.reports_dir.clone(),
            product_name: config.product_name.clone(),
            accent_color: config.accent_color.clone(),
        }
    }

    /// Content-addressed-by-timestamp/uuid filename stem, unique per artifact.
    fn artifact_stem() -> String {
        format!(
            "report-{}-{}",
            chrono::Utc::now().format("%Y%m%d%H%M%S"),
            uuid::Uuid::new_v4()
        )
    }

    async fn write_artifact(&self, stem: &str, html: String) -> Result<PathBuf> {
        tokio::fs::create_dir_all(&self.reports_dir).await?;
        let path = self.reports_dir.join(format!("{stem}.html"));
        tokio::fs::write(&path, html).await?;
        tracing::info!("Report artifact written to {}", path.display());
        Ok(path)
    }

    /// Write evidence images as sibling PNG files, returning the relative
    /// paths the HTML should reference. Shots without an image get `None`.
    async fn write_evidence_images(
        &self,
        stem: &str,
        evidence: &[EvidenceShot],
    ) -> Result<Vec<Option<String>>> {
        let assets_dir = self.reports_dir.join(format!("{stem}_assets"));
        let mut refs = Vec::with_capacity(evidence.len());
        let mut assets_dir_created = false;

        for (index, shot) in evidence.iter().enumerate() {
            match &shot.image {
                Some(bytes) => {
                    if !assets_dir_created {
                        tokio::fs::create_dir_all(&assets_dir).await?;
                        assets_dir_created = true;
                    }
                    let name = format!("{:02}-{}.png", index, sanitize_file_part(&shot.rule_id));
                    tokio::fs::write(assets_dir.join(&name), bytes).await?;
                    refs.push(Some(format!("{stem}_assets/{name}")));
                }
                None => refs.push(None),
            }
        }

        Ok(refs)
    }

    fn render_document(&self, result: &ScanResult, evidence_refs: &[Option<String>]) -> String {
        let mut body = String::new();

        if let Some(error) = &result.error {
            body.push_str(&format!(
                "<section class=\"banner error\"><h2>We could not fully scan this site</h2>\
                 <p>{}</p><p>The findings below are incomplete; try again later.</p></section>",
                escape_html(error)
            ));
        }

        body.push_str(&format!(
            "<section class=\"summary\"><p><strong>{}</strong> violations, \
             <strong>{}</strong> passes, <strong>{}</strong> need manual review.</p></section>",
            result.violations.len(),
            result.passes.len(),
            result.incomplete.len()
        ));

        if !result.violations.is_empty() {
            body.push_str("<section><h2>Violations</h2>");
            for violation in &result.violations {
                body.push_str(&render_violation(violation));
            }
            body.push_str("</section>");
        }

        let shots: Vec<(&EvidenceShot, &str)> = result
            .evidence
            .iter()
            .zip(evidence_refs.iter())
            .filter_map(|(shot, reference)| reference.as_deref().map(|r| (shot, r)))
            .collect();
        if !shots.is_empty() {
            body.push_str("<section><h2>Evidence</h2>");
            for (shot, reference) in shots {
                body.push_str(&format!(
                    "<figure><img src=\"{}\" alt=\"Screenshot evidence for rule {}\">\
                     <figcaption><code>{}</code> — <code>{}</code></figcaption></figure>",
                    escape_html(reference),
                    escape_html(&shot.rule_id),
                    escape_html(&shot.rule_id),
                    escape_html(&shot.selector)
                ));
            }
            body.push_str("</section>");
        }

        if !result.incomplete.is_empty() {
            body.push_str("<section><h2>Needs manual review</h2>");
            for violation in &result.incomplete {
                body.push_str(&render_violation(violation));
            }
            body.push_str("</section>");
        }

        if !result.passes.is_empty() {
            body.push_str("<section><h2>Passed checks</h2><ul>");
            for pass in &result.passes {
                body.push_str(&format!(
                    "<li><code>{}</code> — {}</li>",
                    escape_html(&pass.rule_id),
                    escape_html(&pass.description)
                ));
            }
            body.push_str("</ul></section>");
        }

        self.page_shell(
            &format!("Accessibility report — {}", result.url),
            &format!(
                "<p class=\"meta\">Scanned <code>{}</code> at {}</p>{}",
                escape_html(&result.url),
                result.scanned_at.format("%Y-%m-%d %H:%M UTC"),
                body
            ),
        )
    }

    fn page_shell(&self, title: &str, body: &str) -> String {
        format!(
            "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n\
             <title>{title}</title>\n\
             <style>\n\
             body {{ font-family: system-ui, sans-serif; max-width: 60rem; margin: 2rem auto; padding: 0 1rem; color: #1d1d1f; }}\n\
             header {{ border-bottom: 4px solid {accent}; padding-bottom: 1rem; }}\n\
             header h1 {{ color: {accent}; margin-bottom: 0; }}\n\
             .banner.error {{ background: #fdecea; border-left: 4px solid #c0392b; padding: 0.5rem 1rem; }}\n\
             .violation {{ border: 1px solid #ddd; border-radius: 6px; padding: 0.75rem 1rem; margin: 0.75rem 0; }}\n\
             .impact {{ display: inline-block; padding: 0.1rem 0.5rem; border-radius: 4px; color: #fff; font-size: 0.8rem; }}\n\
             .impact.critical {{ background: #c0392b; }} .impact.serious {{ background: #d35400; }}\n\
             .impact.moderate {{ background: #b7950b; }} .impact.minor {{ background: #7f8c8d; }}\n\
             figure img {{ max-width: 100%; border: 1px solid #ddd; }}\n\
             pre {{ background: #f5f5f7; padding: 0.5rem; overflow-x: auto; }}\n\
             </style>\n</head>\n<body>\n\
             <header><h1>{product}</h1><p>{title}</p></header>\n\
             {body}\n</body>\n</html>\n",
            title = escape_html(title),
            accent = self.accent_color,
            product = escape_html(&self.product_name),
            body = body
        )
    }
}

#[async_trait::async_trait]
impl ReportRenderer for HtmlReportRenderer {
    async fn render(&self, result: &ScanResult) -> Result<PathBuf> {
        let stem = Self::artifact_stem();
        let evidence_refs = self.write_evidence_images(&stem, &result.evidence).await?;
        let html = self.render_document(result, &evidence_refs);
        self.write_artifact(&stem, html).await
    }

    async fn render_limited(&self, result: &ScanResult, evidence_cap: usize) -> Result<PathBuf> {
        let mut limited = result.clone();
        limited.evidence.truncate(evidence_cap);

        let stem = Self::artifact_stem();
        let evidence_refs = self.write_evidence_images(&stem, &limited.evidence).await?;
        // The caller asked for the preview variant; the banner is part of
        // that variant, not conditional on evidence being dropped.
        let html = self.render_document(&limited, &evidence_refs).replacen(
            "<section class=\"summary\">",
            "<section class=\"banner\"><p>Preview report: evidence is limited. \
             Upgrade for the full report.</p></section><section class=\"summary\">",
            1,
        );
        self.write_artifact(&stem, html).await
    }

    async fn render_basic(&self, url: &str) -> Result<PathBuf> {
        let stem = Self::artifact_stem();
        let html = self.page_shell(
            &format!("Accessibility report — {url}"),
            &format!(
                "<section class=\"banner error\"><h2>Report unavailable</h2>\
                 <p>We could not produce a full accessibility report for \
                 <code>{}</code>. The site may be unreachable or may block \
                 automated scanners. Please try again later.</p></section>",
                escape_html(url)
            ),
        );
        self.write_artifact(&stem, html).await
    }
}

fn render_violation(violation: &Violation) -> String {
    let impact_badge = violation.impact.map_or_else(String::new, |impact| {
        format!("<span class=\"impact {impact}\">{impact}</span> ")
    });

    let mut nodes = String::new();
    for node in &violation.nodes {
        nodes.push_str(&format!(
            "<p><code>{}</code></p><pre>{}</pre>",
            escape_html(&node.selector),
            escape_html(&node.html)
        ));
    }

    format!(
        "<div class=\"violation\">{impact_badge}<strong>{}</strong>\
         <p>{} (<a href=\"{}\">rule documentation</a>)</p>{nodes}</div>",
        escape_html(&violation.rule_id),
        escape_html(&violation.description),
        escape_html(&violation.help_url),
    )
}

fn escape_html(input: &str) -> String {
    input
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

fn sanitize_file_part(input: &str) -> String {
    input
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' { c } else { '_' })
        .collect()
}

/// Strip the reports directory prefix so callers can store a servable
/// relative path.
#[must_use]
pub fn relative_report_path(reports_dir: &Path, artifact: &Path) -> String {
    artifact
        .strip_prefix(reports_dir)
        .unwrap_or(artifact)
        .to_string_lossy()
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use sightline_core::{Impact, ReportConfig, RuleOutcome, ViolationNode};

    fn test_renderer(dir: &Path) -> HtmlReportRenderer {
        HtmlReportRenderer::new(&ReportConfig {
            reports_dir: dir.to_path_buf(),
            ..ReportConfig::default()
        })
    }

    fn sample_result() -> ScanResult {
        let mut result = ScanResult::from_rule_run(
            "https://example.com",
            sightline_core::RuleRun {
                violations: vec![Violation {
                    rule_id: "image-alt".to_string(),
                    description: "Images must have alternate text".to_string(),
                    help_url: "https://dequeuniversity.com/rules/axe/4.8/image-alt".to_string(),
                    impact: Some(Impact::Critical),
                    tags: vec!["wcag2a".to_string(), "wcag111".to_string()],
                    nodes: vec![ViolationNode {
                        selector: "img:nth-of-type(1)".to_string(),
                        html: "<img src=\"cat.png\">".to_string(),
                    }],
                }],
                passes: vec![RuleOutcome {
                    rule_id: "html-has-lang".to_string(),
                    description: "<html> element has a lang attribute".to_string(),
                }],
                incomplete: vec![],
            },
        );
        result.evidence = vec![
            EvidenceShot {
                rule_id: "image-alt".to_string(),
                selector: "img:nth-of-type(1)".to_string(),
                image: Some(vec![0x89, 0x50, 0x4e, 0x47]),
            },
            EvidenceShot {
                rule_id: "image-alt".to_string(),
                selector: "img:nth-of-type(2)".to_string(),
                image: None,
            },
        ];
        result
    }

    #[tokio::test]
    async fn test_render_full_report() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let renderer = test_renderer(dir.path());

        let path = renderer.render(&sample_result()).await.expect("render report");
        assert!(path.exists());

        let html = std::fs::read_to_string(&path).expect("read artifact");
        assert!(html.contains("image-alt"));
        assert!(html.contains("html-has-lang"));
        // Snippet is escaped, raw markup never lands in the document
        assert!(html.contains("&lt;img"));
        // One evidence image was written, the failed shot was skipped
        assert_eq!(html.matches("<figure>").count(), 1);
    }

    #[tokio::test]
    async fn test_render_basic_report() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let renderer = test_renderer(dir.path());

        let path = renderer
            .render_basic("https://unreachable.example")
            .await
            .expect("render basic report");
        let html = std::fs::read_to_string(&path).expect("read artifact");
        assert!(html.contains("Report unavailable"));
        assert!(html.contains("unreachable.example"));
    }

    #[tokio::test]
    async fn test_render_limited_caps_evidence() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let renderer = test_renderer(dir.path());

        let path = renderer
            .render_limited(&sample_result(), 0)
            .await
            .expect("render limited report");
        let html = std::fs::read_to_string(&path).expect("read artifact");
        assert!(!html.contains("<figure>"));
        assert!(html.contains("Preview report"));
    }

    #[tokio::test]
    async fn test_render_limited_banner_without_evidence() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let renderer = test_renderer(dir.path());

        // Scans without a headless backend carry no evidence at all; the
        // preview variant is still marked as a preview.
        let mut result = sample_result();
        result.evidence.clear();

        let path = renderer
            .render_limited(&result, 2)
            .await
            .expect("render limited report");
        let html = std::fs::read_to_string(&path).expect("read artifact");
        assert!(html.contains("Preview report"));
    }

    #[tokio::test]
    async fn test_degraded_result_gets_banner() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let renderer = test_renderer(dir.path());

        let result = ScanResult::degraded("https://example.com", "fetch timed out after 5 attempts");
        let path = renderer.render(&result).await.expect("render degraded report");
        let html = std::fs::read_to_string(&path).expect("read artifact");
        assert!(html.contains("could not fully scan"));
        assert!(html.contains("fetch timed out"));
    }

    #[test]
    fn test_relative_report_path() {
        let dir = PathBuf::from("reports");
        let artifact = dir.join("report-1.html");
        assert_eq!(relative_report_path(&dir, &artifact), "report-1.html");
    }

    #[test]
    fn test_escape_html() {
        assert_eq!(
            escape_html("<script>\"&\"</script>"),
            "&lt;script&gt;&quot;&amp;&quot;&lt;/script&gt;"
        );
    }
}
