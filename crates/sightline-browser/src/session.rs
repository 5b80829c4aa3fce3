//! Scoped headless rendering sessions.
//!
//! A `RenderSession` owns one Chromium process and one page for the duration
//! of a single load/capture call. The process is launched on `open` and
//! released by `close` (or by the scoped helpers) on every exit path,
//! including navigation failures; a leaked browser process is a correctness
//! bug, not a hygiene concern.

use crate::error::{BrowserError, Result};
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::page::CaptureScreenshotFormat;
use chromiumoxide::page::{Page, ScreenshotParams};
use futures_util::stream::StreamExt;
use serde::Deserialize;
use std::time::Duration;
use tokio::task::JoinHandle;

/// Bounding boxes below this edge length are treated as degenerate and fall
/// back to a viewport shot.
const MIN_BOX_PX: f64 = 2.0;

/// Viewport and timing options for a rendering session.
#[derive(Debug, Clone)]
pub struct RenderOptions {
    /// Navigation timeout for the initial page load
    pub nav_timeout: Duration,
    /// Viewport width in pixels
    pub viewport_width: u32,
    /// Viewport height in pixels
    pub viewport_height: u32,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            nav_timeout: Duration::from_secs(25),
            viewport_width: 1366,
            viewport_height: 900,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ElementBox {
    width: f64,
    height: f64,
}

/// One live rendered page backed by an exclusively-owned Chromium process.
pub struct RenderSession {
    browser: Browser,
    page: Page,
    handler_task: JoinHandle<()>,
}

impl RenderSession {
    /// Launch Chromium, navigate to `url` and wait for the load to settle.
    ///
    /// The browser process is released before this returns on every failure
    /// path (launch error, navigation error, timeout).
    pub async fn open(url: &str, options: &RenderOptions) -> Result<Self> {
        let config = BrowserConfig::builder()
            .no_sandbox()
            .window_size(options.viewport_width, options.viewport_height)
            .arg("--disable-gpu")
            .arg("--disable-dev-shm-usage")
            .build()
            .map_err(BrowserError::Launch)?;

        let (browser, mut handler) = Browser::launch(config)
            .await
            .map_err(|e| BrowserError::Launch(e.to_string()))?;

        let handler_task = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                let _ = event;
            }
        });

        let navigation = async {
            let page = browser
                .new_page(url)
                .await
                .map_err(|e| BrowserError::Navigation(e.to_string()))?;
            page.wait_for_navigation()
                .await
                .map_err(|e| BrowserError::Navigation(e.to_string()))?;
            Ok::<Page, BrowserError>(page)
        };

        let page = match tokio::time::timeout(options.nav_timeout, navigation).await {
            Ok(Ok(page)) => page,
            Ok(Err(e)) => {
                shutdown(browser, handler_task).await;
                return Err(e);
            }
            Err(_) => {
                shutdown(browser, handler_task).await;
                return Err(BrowserError::Timeout(format!(
                    "navigation to {url} exceeded {:?}",
                    options.nav_timeout
                )));
            }
        };

        tracing::debug!("Render session open for {}", url);

        Ok(Self {
            browser,
            page,
            handler_task,
        })
    }

    /// Serialized HTML of the rendered document.
    pub async fn html(&self) -> Result<String> {
        self.page
            .content()
            .await
            .map_err(|e| BrowserError::Evaluation(e.to_string()))
    }

    /// Full-page screenshot as raw PNG bytes.
    pub async fn screenshot_full(&self) -> Result<Vec<u8>> {
        self.page
            .screenshot(
                ScreenshotParams::builder()
                    .format(CaptureScreenshotFormat::Png)
                    .full_page(true)
                    .build(),
            )
            .await
            .map_err(|e| BrowserError::Screenshot(e.to_string()))
    }

    /// Highlight the first element matching `selector` and capture it.
    ///
    /// The element is outlined and scrolled into view first. When its
    /// bounding box is degenerate (near-zero width or height) the capture
    /// falls back to a viewport shot so the evidence still shows the page
    /// region around the node.
    pub async fn capture_element(&self, selector: &str) -> Result<Vec<u8>> {
        let quoted = serde_json::to_string(selector)
            .map_err(|e| BrowserError::Evaluation(e.to_string()))?;
        let expr = format!(
            r"(() => {{
                const el = document.querySelector({quoted});
                if (!el) return null;
                el.scrollIntoView({{ block: 'center', inline: 'center' }});
                el.style.outline = '3px solid #ff3b30';
                el.style.outlineOffset = '2px';
                const r = el.getBoundingClientRect();
                return {{ width: r.width, height: r.height }};
            }})()"
        );

        let rect: Option<ElementBox> = self
            .page
            .evaluate(expr)
            .await
            .map_err(|e| BrowserError::Evaluation(e.to_string()))?
            .into_value()
            .map_err(|e| BrowserError::Evaluation(e.to_string()))?;

        let rect = rect.ok_or_else(|| BrowserError::SelectorNotFound(selector.to_string()))?;

        if rect.width < MIN_BOX_PX || rect.height < MIN_BOX_PX {
            tracing::debug!(
                "Degenerate bounding box for {} ({}x{}), using viewport shot",
                selector,
                rect.width,
                rect.height
            );
            return self
                .page
                .screenshot(
                    ScreenshotParams::builder()
                        .format(CaptureScreenshotFormat::Png)
                        .full_page(false)
                        .build(),
                )
                .await
                .map_err(|e| BrowserError::Screenshot(e.to_string()));
        }

        let element = self
            .page
            .find_element(selector)
            .await
            .map_err(|_| BrowserError::SelectorNotFound(selector.to_string()))?;

        element
            .screenshot(CaptureScreenshotFormat::Png)
            .await
            .map_err(|e| BrowserError::Screenshot(e.to_string()))
    }

    /// Release the browser process. Must be called on every path once the
    /// session is no longer needed.
    pub async fn close(self) {
        shutdown(self.browser, self.handler_task).await;
    }
}

async fn shutdown(mut browser: Browser, handler_task: JoinHandle<()>) {
    if let Err(e) = browser.close().await {
        tracing::warn!("Browser close failed: {}", e);
    }
    if let Err(e) = browser.wait().await {
        tracing::warn!("Browser wait failed: {}", e);
    }
    handler_task.abort();
    tracing::debug!("Render session closed");
}

/// Scoped one-shot render: navigate, read HTML and a full-page screenshot,
/// release the browser before returning.
///
/// A screenshot failure is non-fatal; only the screenshot is omitted.
pub async fn render_page(url: &str, options: &RenderOptions) -> Result<(String, Option<Vec<u8>>)> {
    let session = RenderSession::open(url, options).await?;

    let html = match session.html().await {
        Ok(html) => html,
        Err(e) => {
            session.close().await;
            return Err(e);
        }
    };

    let screenshot = match session.screenshot_full().await {
        Ok(bytes) => Some(bytes),
        Err(e) => {
            tracing::warn!("Full-page screenshot failed for {}: {}", url, e);
            None
        }
    };

    session.close().await;
    Ok((html, screenshot))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_options_in_bounds() {
        let options = RenderOptions::default();
        assert!(options.nav_timeout >= Duration::from_secs(20));
        assert!(options.nav_timeout <= Duration::from_secs(30));
        assert!(options.viewport_width > 0 && options.viewport_height > 0);
    }

    #[tokio::test]
    #[ignore = "Requires Chrome browser to be installed"]
    async fn test_render_fixture_server() {
        let (html, screenshot) = render_page("about:blank", &RenderOptions::default())
            .await
            .expect("render about:blank");
        assert!(html.contains("<html"));
        assert!(screenshot.is_some());
    }

    #[tokio::test]
    #[ignore = "Requires Chrome browser to be installed"]
    async fn test_capture_missing_selector() {
        let session = RenderSession::open("about:blank", &RenderOptions::default())
            .await
            .expect("open session");
        let result = session.capture_element("#does-not-exist").await;
        assert!(matches!(result, Err(BrowserError::SelectorNotFound(_))));
        session.close().await;
    }
}
