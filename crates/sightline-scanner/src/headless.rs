//! Headless rendering as an evidence enhancement.
//!
//! The scan pipeline never depends on a browser being present: rule
//! evaluation runs over statically fetched or fixture markup either way.
//! When Chromium is available, this backend re-renders a live target to
//! take the full-page screenshot and per-violation element shots. Any
//! failure here degrades to absent evidence, never to a failed scan.

use crate::evidence;
use sightline_browser::{render_page, RenderOptions, RenderSession};
use sightline_core::{BrowserConfig, EvidenceShot, Violation};

/// Headless Chromium backend for screenshots and element evidence.
#[derive(Debug, Clone)]
pub struct HeadlessBackend {
    options: RenderOptions,
}

impl HeadlessBackend {
    /// Build a backend from browser configuration.
    #[must_use]
    pub fn new(config: &BrowserConfig) -> Self {
        Self {
            options: RenderOptions {
                nav_timeout: config.nav_timeout(),
                viewport_width: config.viewport_width,
                viewport_height: config.viewport_height,
            },
        }
    }

    /// Render the target and return its post-JavaScript HTML plus a
    /// full-page screenshot when one could be taken.
    pub async fn load(&self, url: &str) -> sightline_browser::Result<(String, Option<Vec<u8>>)> {
        render_page(url, &self.options).await
    }

    /// Capture a full-page screenshot and per-violation element shots.
    ///
    /// Opens one session for the whole capture pass and releases it before
    /// returning. When the session cannot be opened at all, the result is
    /// `(None, absent_shots(...))`: the evidence list keeps its shape so
    /// reports can say "no shot" per violation instead of dropping the
    /// section.
    pub async fn visual_evidence(
        &self,
        url: &str,
        violations: &[Violation],
        limit: usize,
    ) -> (Option<Vec<u8>>, Vec<EvidenceShot>) {
        let session = match RenderSession::open(url, &self.options).await {
            Ok(session) => session,
            Err(e) => {
                tracing::warn!("Headless session for {} unavailable: {}", url, e);
                return (None, evidence::absent_shots(violations, limit));
            }
        };

        let screenshot = match session.screenshot_full().await {
            Ok(bytes) => Some(bytes),
            Err(e) => {
                tracing::warn!("Full-page screenshot failed for {}: {}", url, e);
                None
            }
        };

        let shots = evidence::capture(&session, violations, limit).await;
        session.close().await;

        (screenshot, shots)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_options_from_config() {
        let backend = HeadlessBackend::new(&BrowserConfig::default());
        assert_eq!(backend.options.viewport_width, 1366);
        assert_eq!(backend.options.viewport_height, 900);
    }

    #[tokio::test]
    #[ignore = "Requires Chrome browser to be installed"]
    async fn test_visual_evidence_blank_page() {
        let backend = HeadlessBackend::new(&BrowserConfig::default());
        let (screenshot, shots) = backend.visual_evidence("about:blank", &[], 5).await;
        assert!(screenshot.is_some());
        assert!(shots.is_empty());
    }
}
