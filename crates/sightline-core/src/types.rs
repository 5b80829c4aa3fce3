//! Shared types used across the Sightline application.
//!
//! This module defines the scan identifier newtype, the WCAG impact
//! ordering, and the result shapes produced by the rule runner and the
//! scan pipeline.

use crate::error::SightlineError;
use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::sync::OnceLock;

/// Newtype for scan identifiers with validation.
///
/// Scan IDs must be valid UUIDs (v4 format).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ScanId(String);

impl ScanId {
    /// Create a new `ScanId` from a string.
    ///
    /// # Errors
    /// Returns error if the ID is not a valid UUID v4.
    pub fn new(id: impl Into<String>) -> Result<Self, SightlineError> {
        let id = id.into();
        Self::validate(&id)?;
        Ok(Self(id))
    }

    /// Create a new random `ScanId` using UUID v4.
    #[must_use]
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    /// Get the inner string value.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Validate that a string is a valid UUID v4.
    fn validate(id: &str) -> Result<(), SightlineError> {
        static UUID_REGEX: OnceLock<Regex> = OnceLock::new();
        let regex = UUID_REGEX.get_or_init(|| {
            Regex::new(r"^[0-9a-f]{8}-[0-9a-f]{4}-4[0-9a-f]{3}-[89ab][0-9a-f]{3}-[0-9a-f]{12}$")
                .expect("valid regex")
        });

        if regex.is_match(id) {
            Ok(())
        } else {
            Err(SightlineError::Validation(format!(
                "invalid scan ID: must be a valid UUID v4, got '{id}'"
            )))
        }
    }
}

impl fmt::Display for ScanId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Severity classification of an accessibility violation.
///
/// The total order `Critical > Serious > Moderate > Minor` is load-bearing:
/// evidence capture takes the top-N violations and reports lead with the
/// most severe findings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Impact {
    /// Blocks access for affected users
    Critical,
    /// Serious barrier for affected users
    Serious,
    /// Noticeable barrier, workarounds exist
    Moderate,
    /// Cosmetic or low-impact issue
    Minor,
}

impl Impact {
    /// Rank for sorting, lower sorts first.
    #[must_use]
    pub fn rank(self) -> u8 {
        match self {
            Self::Critical => 0,
            Self::Serious => 1,
            Self::Moderate => 2,
            Self::Minor => 3,
        }
    }

    /// Rank of an optional impact; unknown/missing impact sorts last.
    #[must_use]
    pub fn rank_opt(impact: Option<Self>) -> u8 {
        impact.map_or(4, Self::rank)
    }
}

impl fmt::Display for Impact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Critical => write!(f, "critical"),
            Self::Serious => write!(f, "serious"),
            Self::Moderate => write!(f, "moderate"),
            Self::Minor => write!(f, "minor"),
        }
    }
}

/// One affected DOM node within a violation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ViolationNode {
    /// CSS selector path locating the node in the document
    pub selector: String,
    /// Outer HTML snippet of the offending node
    pub html: String,
}

/// One failed accessibility rule with its affected nodes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Violation {
    /// Stable rule identifier (e.g. `image-alt`)
    pub rule_id: String,
    /// Human-readable description of the failure
    pub description: String,
    /// Documentation URL for the rule
    pub help_url: String,
    /// Severity classification; `None` when the rule does not classify
    pub impact: Option<Impact>,
    /// WCAG reference tags (e.g. `wcag2a`, `wcag111`)
    pub tags: Vec<String>,
    /// Affected nodes, document order
    pub nodes: Vec<ViolationNode>,
}

/// A rule that ran and found no offending nodes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuleOutcome {
    /// Stable rule identifier
    pub rule_id: String,
    /// Human-readable description of what was checked
    pub description: String,
}

/// Categorized output of a single rule-engine run over one document.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RuleRun {
    /// Failed rules with affected nodes
    pub violations: Vec<Violation>,
    /// Rules that ran clean
    pub passes: Vec<RuleOutcome>,
    /// Rules that need manual review (cannot be decided statically)
    pub incomplete: Vec<Violation>,
}

/// Sort violations most severe first.
///
/// Stable sort: within the same impact class, rule id breaks ties so the
/// ordering is deterministic across runs.
pub fn sort_by_impact(violations: &mut [Violation]) {
    violations.sort_by(|a, b| {
        match Impact::rank_opt(a.impact).cmp(&Impact::rank_opt(b.impact)) {
            Ordering::Equal => a.rule_id.cmp(&b.rule_id),
            other => other,
        }
    });
}

/// Cropped screenshot evidence for one violation.
///
/// `image` is `None` when capture failed for any reason; a missing shot is
/// an explicit non-fatal marker, never an error that aborts the scan.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvidenceShot {
    /// Rule the evidence belongs to
    pub rule_id: String,
    /// Selector of the captured node
    pub selector: String,
    /// Raw PNG bytes, absent when capture failed
    #[serde(skip)]
    pub image: Option<Vec<u8>>,
}

/// The orchestrator's output for one finished scan.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanResult {
    /// Scanned URL (or fixture token)
    pub url: String,
    /// When the scan ran
    pub scanned_at: DateTime<Utc>,
    /// Violations, sorted most severe first
    pub violations: Vec<Violation>,
    /// Rules that ran clean
    pub passes: Vec<RuleOutcome>,
    /// Rules needing manual review
    pub incomplete: Vec<Violation>,
    /// Full-page screenshot (raw PNG bytes) when headless rendering succeeded
    #[serde(skip)]
    pub screenshot: Option<Vec<u8>>,
    /// Per-violation evidence shots
    pub evidence: Vec<EvidenceShot>,
    /// Set exactly when this result represents a degraded/fallback outcome
    pub error: Option<String>,
}

impl ScanResult {
    /// Build a result from a rule run over a loaded page.
    #[must_use]
    pub fn from_rule_run(url: impl Into<String>, mut run: RuleRun) -> Self {
        sort_by_impact(&mut run.violations);
        Self {
            url: url.into(),
            scanned_at: Utc::now(),
            violations: run.violations,
            passes: run.passes,
            incomplete: run.incomplete,
            screenshot: None,
            evidence: Vec::new(),
            error: None,
        }
    }

    /// Build the synthetic result used when every load attempt failed.
    ///
    /// Carries the failure cause so the rendered report can explain why the
    /// site could not be scanned.
    #[must_use]
    pub fn degraded(url: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            scanned_at: Utc::now(),
            violations: Vec::new(),
            passes: Vec::new(),
            incomplete: Vec::new(),
            screenshot: None,
            evidence: Vec::new(),
            error: Some(error.into()),
        }
    }

    /// Whether this result represents a degraded/fallback outcome.
    #[must_use]
    pub fn is_degraded(&self) -> bool {
        self.error.is_some()
    }
}
