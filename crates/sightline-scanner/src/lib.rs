//! Sightline Scanner - the accessibility scan pipeline.
//!
//! Target sanitizing, page loading (fixtures, static fetch, optional
//! headless enhancement), the built-in WCAG rule engine, per-violation
//! evidence capture, and the orchestrator that drives a scan from
//! `pending` to a terminal status.

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]

pub mod error;
pub mod evidence;
pub mod fixture;
pub mod headless;
pub mod loader;
pub mod orchestrator;
pub mod retry;
pub mod rules;
pub mod sanitizer;
pub mod static_fetch;

pub use error::{Result, ScanError};
pub use fixture::{FixtureKind, FixtureStore, SENTINEL_ACCESSIBLE, SENTINEL_SAMPLE};
pub use headless::HeadlessBackend;
pub use loader::{select_strategy, DefaultPageSource, LoadStrategy, LoadedPage, PageSource, ScanInput};
pub use orchestrator::{ReportMode, ScanOrchestrator};
pub use rules::{BuiltinRules, RuleEngine};
pub use sanitizer::{sanitize, SanitizedTarget};
pub use static_fetch::StaticFetcher;
