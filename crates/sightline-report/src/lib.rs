//! Sightline Report - report rendering seam and bundled HTML writer.
//!
//! The scan pipeline's only contract with reporting is "produce a readable
//! file at a path". The `ReportRenderer` trait expresses the three render
//! operations (full, evidence-limited preview, reduced diagnostic fallback);
//! `HtmlReportRenderer` is the bundled implementation.

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]

pub mod error;
pub mod html;
pub mod renderer;

pub use error::{ReportError, Result};
pub use html::{relative_report_path, HtmlReportRenderer};
pub use renderer::ReportRenderer;
