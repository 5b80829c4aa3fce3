//! Page loading: strategy selection and the `PageSource` seam.
//!
//! A scan input is either a bundled fixture (selected by a sentinel
//! token) or a live target that has passed sanitizing. The `PageSource`
//! trait is the injection point that lets the orchestrator run against
//! stub loaders in tests.

use crate::error::{Result, ScanError};
use crate::fixture::{FixtureKind, FixtureStore};
use crate::headless::HeadlessBackend;
use crate::sanitizer::{self, SanitizedTarget};
use crate::static_fetch::StaticFetcher;
use async_trait::async_trait;
use sightline_core::ScanningConfig;

/// A document ready for rule evaluation.
#[derive(Debug, Clone)]
pub struct LoadedPage {
    /// The HTML to evaluate
    pub html: String,
    /// Full-page screenshot, when the strategy produces one
    pub screenshot: Option<Vec<u8>>,
}

/// How a given raw input will be loaded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadStrategy {
    /// Bundled document, no network
    Fixture(FixtureKind),
    /// Plain HTTP GET of the live target
    StaticFetch,
    /// Chromium-rendered document with a full-page screenshot
    HeadlessRender,
}

/// Decide the primary strategy for a raw input. Sentinel tokens route to
/// fixtures; everything else fetches statically. `HeadlessRender` is never
/// chosen up front: it is the escalation used when the static fetch fails
/// and a browser backend is attached, and the enhancement layer for
/// screenshots and element evidence.
#[must_use]
pub fn select_strategy(raw_input: &str) -> LoadStrategy {
    match FixtureKind::from_token(raw_input) {
        Some(kind) => LoadStrategy::Fixture(kind),
        None => LoadStrategy::StaticFetch,
    }
}

/// A resolved scan input: fixture or sanitized live target.
#[derive(Debug, Clone)]
pub enum ScanInput {
    /// Bundled fixture page
    Fixture(FixtureKind),
    /// Live target that passed the sanitizer
    Live(SanitizedTarget),
}

impl ScanInput {
    /// Resolve a raw input. Sentinels bypass the sanitizer entirely;
    /// everything else must pass it or the scan is rejected up front.
    pub async fn resolve(raw_input: &str) -> Result<Self> {
        match select_strategy(raw_input) {
            LoadStrategy::Fixture(kind) => Ok(Self::Fixture(kind)),
            LoadStrategy::StaticFetch | LoadStrategy::HeadlessRender => {
                let target = sanitizer::sanitize(raw_input).await?;
                Ok(Self::Live(target))
            }
        }
    }

    /// The URL recorded for this input: the sentinel token for fixtures,
    /// the normalized href for live targets.
    #[must_use]
    pub fn url(&self) -> &str {
        match self {
            Self::Fixture(kind) => kind.token(),
            Self::Live(target) => &target.href,
        }
    }

    /// Whether this input is a bundled fixture.
    #[must_use]
    pub fn is_fixture(&self) -> bool {
        matches!(self, Self::Fixture(_))
    }

    /// The live href, when this input is a live target.
    #[must_use]
    pub fn live_href(&self) -> Option<&str> {
        match self {
            Self::Fixture(_) => None,
            Self::Live(target) => Some(&target.href),
        }
    }
}

/// Source of pages for the scan pipeline.
#[async_trait]
pub trait PageSource: Send + Sync {
    /// Load the document for a resolved input.
    async fn load(&self, input: &ScanInput) -> Result<LoadedPage>;
}

/// Production page source: fixtures from the embedded store, live
/// targets through the static fetcher, escalating to a headless render
/// when the fetch fails and a browser backend is attached.
#[derive(Debug)]
pub struct DefaultPageSource {
    fixtures: &'static FixtureStore,
    fetcher: StaticFetcher,
    headless: Option<HeadlessBackend>,
}

impl DefaultPageSource {
    /// Build the default source from scanning configuration.
    pub fn new(config: &ScanningConfig) -> Result<Self> {
        Ok(Self {
            fixtures: FixtureStore::shared(),
            fetcher: StaticFetcher::new(config)?,
            headless: None,
        })
    }

    /// Attach a headless backend as the escalation for live targets
    /// that defeat the static fetch (script-dependent rendering).
    #[must_use]
    pub fn with_headless(mut self, backend: HeadlessBackend) -> Self {
        self.headless = Some(backend);
        self
    }

    /// Escalation ladder for live targets: static fetch first, headless
    /// render when a backend is attached.
    fn live_ladder(&self) -> Vec<LoadStrategy> {
        let mut ladder = vec![LoadStrategy::StaticFetch];
        if self.headless.is_some() {
            ladder.push(LoadStrategy::HeadlessRender);
        }
        ladder
    }

    async fn attempt(&self, strategy: LoadStrategy, target: &SanitizedTarget) -> Result<LoadedPage> {
        match strategy {
            LoadStrategy::Fixture(kind) => Ok(self.fixtures.load(kind)),
            LoadStrategy::StaticFetch => self.fetcher.fetch(target).await,
            LoadStrategy::HeadlessRender => {
                let Some(headless) = &self.headless else {
                    return Err(ScanError::LoadFailure(
                        "no headless backend attached".to_string(),
                    ));
                };
                let (html, screenshot) = headless.load(&target.href).await?;
                Ok(LoadedPage { html, screenshot })
            }
        }
    }

    async fn load_live(&self, target: &SanitizedTarget) -> Result<LoadedPage> {
        let mut last_failure: Option<ScanError> = None;

        for strategy in self.live_ladder() {
            match self.attempt(strategy, target).await {
                Ok(page) => return Ok(page),
                Err(e) => {
                    tracing::warn!("{:?} load of {} failed: {}", strategy, target.href, e);
                    last_failure = Some(e);
                }
            }
        }

        Err(last_failure.unwrap_or_else(|| {
            ScanError::LoadFailure(format!("no load strategy available for {}", target.href))
        }))
    }
}

#[async_trait]
impl PageSource for DefaultPageSource {
    async fn load(&self, input: &ScanInput) -> Result<LoadedPage> {
        match input {
            ScanInput::Fixture(kind) => {
                tracing::debug!("Loading bundled fixture '{}'", kind.token());
                Ok(self.fixtures.load(*kind))
            }
            ScanInput::Live(target) => {
                tracing::debug!("Loading live target {}", target.href);
                self.load_live(target).await
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strategy_selection() {
        assert_eq!(
            select_strategy("test-sample"),
            LoadStrategy::Fixture(FixtureKind::Sample)
        );
        assert_eq!(
            select_strategy("test-accessible"),
            LoadStrategy::Fixture(FixtureKind::Accessible)
        );
        assert_eq!(select_strategy("example.com"), LoadStrategy::StaticFetch);
        assert_ne!(
            select_strategy("example.com"),
            LoadStrategy::HeadlessRender,
            "headless is an escalation, never the primary strategy"
        );
        assert_eq!(
            select_strategy("https://test-sample.example"),
            LoadStrategy::StaticFetch
        );
    }

    #[tokio::test]
    async fn test_resolve_sentinel_skips_sanitizer() {
        // "test-sample" is not a valid URL; it resolves anyway
        let input = ScanInput::resolve("test-sample").await.expect("resolves");
        assert!(input.is_fixture());
        assert_eq!(input.url(), "test-sample");
        assert!(input.live_href().is_none());
    }

    #[tokio::test]
    async fn test_resolve_live_target_is_sanitized() {
        let result = ScanInput::resolve("https://127.0.0.1/admin").await;
        assert!(matches!(result, Err(ScanError::DisallowedTarget(_))));
    }

    #[tokio::test]
    async fn test_resolve_public_literal() {
        let input = ScanInput::resolve("93.184.216.34")
            .await
            .expect("public literal resolves");
        assert_eq!(input.url(), "https://93.184.216.34/");
        assert_eq!(input.live_href(), Some("https://93.184.216.34/"));
    }

    #[test]
    fn test_live_ladder_orders_escalation() {
        let source =
            DefaultPageSource::new(&ScanningConfig::default()).expect("build source");
        assert_eq!(source.live_ladder(), vec![LoadStrategy::StaticFetch]);

        let source = source.with_headless(HeadlessBackend::new(
            &sightline_core::BrowserConfig::default(),
        ));
        assert_eq!(
            source.live_ladder(),
            vec![LoadStrategy::StaticFetch, LoadStrategy::HeadlessRender]
        );
    }

    #[tokio::test]
    async fn test_default_source_loads_fixture() {
        let source =
            DefaultPageSource::new(&ScanningConfig::default()).expect("build source");
        let page = source
            .load(&ScanInput::Fixture(FixtureKind::Sample))
            .await
            .expect("fixture load is infallible");
        assert!(page.html.contains("<html"));
    }
}
