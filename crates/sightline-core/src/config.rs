//! Configuration management for Sightline.
//!
//! Provides TOML-based configuration with XDG-compliant paths and
//! environment variable overrides.

use crate::error::{ConfigError, ConfigResult};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

/// Main application configuration.
///
/// This is loaded from `~/.config/sightline/config.toml` (or platform
/// equivalent). If the file doesn't exist, default values are used.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Scanning behavior settings
    pub scanning: ScanningConfig,
    /// Browser automation settings
    pub browser: BrowserConfig,
    /// Report output settings
    pub report: ReportConfig,
}

impl AppConfig {
    /// Load configuration from disk, falling back to defaults if not found.
    ///
    /// # Errors
    /// Returns error if:
    /// - Config directory cannot be determined
    /// - File exists but cannot be read
    /// - File contents are not valid TOML
    pub fn load() -> ConfigResult<Self> {
        let config_path = Self::config_path()?;

        if config_path.exists() {
            tracing::debug!("Loading config from {}", config_path.display());
            let contents = fs::read_to_string(&config_path)?;
            let config = toml::from_str(&contents)?;
            Ok(config)
        } else {
            tracing::debug!("Config file not found, using defaults");
            Ok(Self::default())
        }
    }

    /// Load configuration with environment variable overrides.
    ///
    /// Supports the following environment variables:
    /// - `SIGHTLINE_HEADLESS`: Override browser headless mode (true/false)
    /// - `SIGHTLINE_REPORTS_DIR`: Override report output directory
    /// - `SIGHTLINE_EVIDENCE_LIMIT`: Override full-report evidence limit
    pub fn load_with_env() -> ConfigResult<Self> {
        let mut config = Self::load()?;

        if let Ok(val) = std::env::var("SIGHTLINE_HEADLESS") {
            if let Ok(headless) = val.parse() {
                config.browser.headless = headless;
                tracing::debug!("Override browser.headless from env: {}", headless);
            }
        }

        if let Ok(val) = std::env::var("SIGHTLINE_REPORTS_DIR") {
            config.report.reports_dir = PathBuf::from(val);
            tracing::debug!(
                "Override report.reports_dir from env: {}",
                config.report.reports_dir.display()
            );
        }

        if let Ok(val) = std::env::var("SIGHTLINE_EVIDENCE_LIMIT") {
            if let Ok(limit) = val.parse() {
                config.scanning.evidence_limit = limit;
                tracing::debug!("Override scanning.evidence_limit from env: {}", limit);
            }
        }

        Ok(config)
    }

    /// Save configuration to disk.
    ///
    /// Creates the config directory if it doesn't exist.
    pub fn save(&self) -> ConfigResult<()> {
        let config_path = Self::config_path()?;
        let config_dir = config_path
            .parent()
            .ok_or_else(|| ConfigError::InvalidValue {
                field: "config_path".to_string(),
                reason: "no parent directory".to_string(),
            })?;

        fs::create_dir_all(config_dir)?;
        tracing::debug!("Saving config to {}", config_path.display());

        let contents = toml::to_string_pretty(self)?;
        fs::write(config_path, contents)?;
        Ok(())
    }

    /// Get the path to the configuration file.
    ///
    /// Uses XDG base directories: `~/.config/sightline/config.toml`
    pub fn config_path() -> ConfigResult<PathBuf> {
        let dirs =
            ProjectDirs::from("io", "sightline", "sightline").ok_or(ConfigError::NoConfigDir)?;
        Ok(dirs.config_dir().join("config.toml"))
    }
}

/// Scanning behavior settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanningConfig {
    /// HTTP fetch timeout per attempt, seconds
    pub fetch_timeout_secs: u64,
    /// Maximum HTTP fetch attempts (User-Agent rotates per attempt)
    pub fetch_max_attempts: u32,
    /// Evidence limit for full reports
    pub evidence_limit: usize,
    /// Evidence limit for the free/preview report variant.
    ///
    /// A product policy parameter, not a technical constraint.
    pub preview_evidence_limit: usize,
}

impl Default for ScanningConfig {
    fn default() -> Self {
        Self {
            fetch_timeout_secs: 15,
            fetch_max_attempts: 5,
            evidence_limit: 10,
            preview_evidence_limit: 2,
        }
    }
}

impl ScanningConfig {
    /// HTTP fetch timeout as a `Duration`.
    #[must_use]
    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }
}

/// Browser automation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BrowserConfig {
    /// Run Chromium headless
    pub headless: bool,
    /// Navigation timeout, seconds
    pub nav_timeout_secs: u64,
    /// Viewport width in pixels
    pub viewport_width: u32,
    /// Viewport height in pixels
    pub viewport_height: u32,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            headless: true,
            nav_timeout_secs: 25,
            viewport_width: 1366,
            viewport_height: 900,
        }
    }
}

impl BrowserConfig {
    /// Navigation timeout as a `Duration`.
    #[must_use]
    pub fn nav_timeout(&self) -> Duration {
        Duration::from_secs(self.nav_timeout_secs)
    }
}

/// Report output settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    /// Directory report artifacts are written into
    pub reports_dir: PathBuf,
    /// Product name shown on report headers
    pub product_name: String,
    /// Accent color for report branding (CSS color)
    pub accent_color: String,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            reports_dir: PathBuf::from("reports"),
            product_name: "Sightline".to_string(),
            accent_color: "#2457d6".to_string(),
        }
    }
}
