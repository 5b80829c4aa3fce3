//! Sightline Core - shared types, configuration and errors.
//!
//! This crate defines the vocabulary the rest of the workspace speaks:
//! scan identifiers, the WCAG impact ordering, rule-run result shapes,
//! evidence records, and the application configuration.
//!
//! # Design Principles
//!
//! - Newtypes with validation over bare strings
//! - Raw binary buffers for images in memory; encoding happens only at
//!   the serialization boundary
//! - Configuration via TOML with environment overrides

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]

pub mod config;
pub mod error;
pub mod types;

// Re-export commonly used types
pub use config::{AppConfig, BrowserConfig, ReportConfig, ScanningConfig};
pub use error::{ConfigError, ConfigResult, Result, SightlineError};
pub use types::{
    EvidenceShot, Impact, RuleOutcome, RuleRun, ScanId, ScanResult, Violation, ViolationNode,
};
