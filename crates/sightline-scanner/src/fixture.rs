//! Bundled fixture pages.
//!
//! A small closed set of sentinel tokens routes a scan to a
//! version-controlled HTML document instead of the network: the
//! deterministic baseline for tests and the offline demo path for
//! restricted-network environments. Matching is exact-string, never fuzzy.

use crate::loader::LoadedPage;
use std::sync::OnceLock;

/// Sentinel selecting the deliberately inaccessible sample page.
pub const SENTINEL_SAMPLE: &str = "test-sample";

/// Sentinel selecting the accessible counterpart page.
pub const SENTINEL_ACCESSIBLE: &str = "test-accessible";

/// Which bundled fixture a sentinel selects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FixtureKind {
    /// Sample page with at least one violation by construction
    Sample,
    /// Page where every built-in check passes
    Accessible,
}

impl FixtureKind {
    /// Map a raw input to a fixture, exact match only.
    #[must_use]
    pub fn from_token(raw_input: &str) -> Option<Self> {
        match raw_input.trim() {
            SENTINEL_SAMPLE => Some(Self::Sample),
            SENTINEL_ACCESSIBLE => Some(Self::Accessible),
            _ => None,
        }
    }

    /// The sentinel token that selects this fixture.
    #[must_use]
    pub fn token(self) -> &'static str {
        match self {
            Self::Sample => SENTINEL_SAMPLE,
            Self::Accessible => SENTINEL_ACCESSIBLE,
        }
    }
}

/// Read-only store of the embedded fixture documents.
///
/// Lazily initialized once per process; callers hold a shared reference,
/// no mutable global state.
#[derive(Debug)]
pub struct FixtureStore {
    sample: &'static str,
    accessible: &'static str,
}

impl FixtureStore {
    /// The process-wide fixture store.
    pub fn shared() -> &'static Self {
        static STORE: OnceLock<FixtureStore> = OnceLock::new();
        STORE.get_or_init(|| Self {
            sample: include_str!("../fixtures/sample.html"),
            accessible: include_str!("../fixtures/accessible.html"),
        })
    }

    /// Load a fixture page. Infallible: the documents are embedded at
    /// compile time and involve no I/O.
    #[must_use]
    pub fn load(&self, kind: FixtureKind) -> LoadedPage {
        let html = match kind {
            FixtureKind::Sample => self.sample,
            FixtureKind::Accessible => self.accessible,
        };
        LoadedPage {
            html: html.to_string(),
            screenshot: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sentinels_exact_match_only() {
        assert_eq!(FixtureKind::from_token("test-sample"), Some(FixtureKind::Sample));
        assert_eq!(
            FixtureKind::from_token("test-accessible"),
            Some(FixtureKind::Accessible)
        );
        assert_eq!(FixtureKind::from_token(" test-sample "), Some(FixtureKind::Sample));

        // Near-misses never route to fixtures
        assert_eq!(FixtureKind::from_token("Test-Sample"), None);
        assert_eq!(FixtureKind::from_token("test-sample2"), None);
        assert_eq!(FixtureKind::from_token("test sample"), None);
        assert_eq!(FixtureKind::from_token("https://test-sample"), None);
    }

    #[test]
    fn test_fixture_load_never_fails() {
        let store = FixtureStore::shared();
        for kind in [FixtureKind::Sample, FixtureKind::Accessible] {
            let page = store.load(kind);
            assert!(!page.html.is_empty());
            assert!(page.html.contains("<html"));
            assert!(page.screenshot.is_none());
        }
    }

    #[test]
    fn test_sample_fixture_has_known_defects() {
        let page = FixtureStore::shared().load(FixtureKind::Sample);
        // Violations by construction: missing alt, missing lang
        assert!(page.html.contains("<img src=\"widget.png\">"));
        assert!(!page.html.contains("<html lang"));
    }
}
