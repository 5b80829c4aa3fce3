//! Sightline Browser - scoped headless Chromium rendering.
//!
//! Provides the rendered-page capability the scan pipeline layers on top of
//! static fetching: JavaScript-executed documents, full-page screenshots,
//! and per-element evidence capture. Every browser process is acquired,
//! used and released within a single call.

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]

pub mod error;
pub mod session;

pub use error::{BrowserError, Result};
pub use session::{render_page, RenderOptions, RenderSession};
