//! Per-violation visual evidence capture.
//!
//! Walks the ordered violation list and asks an `ElementShooter` for an
//! element screenshot of each violation's first node, up to a cap. Every
//! violation considered gets an entry even when capture fails; a shot
//! with `image: None` records that evidence was attempted but absent.

use async_trait::async_trait;
use sightline_browser::RenderSession;
use sightline_core::{EvidenceShot, Violation};

/// Captures a screenshot of a single element by CSS selector.
///
/// `RenderSession` is the production implementation; tests supply stubs.
#[async_trait]
pub trait ElementShooter: Send + Sync {
    /// Capture the element, returning encoded PNG bytes.
    async fn shoot(&self, selector: &str) -> sightline_browser::Result<Vec<u8>>;
}

#[async_trait]
impl ElementShooter for RenderSession {
    async fn shoot(&self, selector: &str) -> sightline_browser::Result<Vec<u8>> {
        self.capture_element(selector).await
    }
}

/// Capture evidence for the first `limit` violations.
///
/// The result has exactly `min(limit, violations.len())` entries, in
/// violation order. A capture failure or a violation without nodes
/// yields an entry with no image rather than shrinking the list.
pub async fn capture(
    shooter: &dyn ElementShooter,
    violations: &[Violation],
    limit: usize,
) -> Vec<EvidenceShot> {
    let mut shots = Vec::with_capacity(limit.min(violations.len()));

    for violation in violations.iter().take(limit) {
        let Some(node) = violation.nodes.first() else {
            shots.push(EvidenceShot {
                rule_id: violation.rule_id.clone(),
                selector: String::new(),
                image: None,
            });
            continue;
        };

        let image = match shooter.shoot(&node.selector).await {
            Ok(bytes) => Some(bytes),
            Err(e) => {
                tracing::warn!(
                    "Evidence capture failed for rule '{}' selector '{}': {}",
                    violation.rule_id,
                    node.selector,
                    e
                );
                None
            }
        };

        shots.push(EvidenceShot {
            rule_id: violation.rule_id.clone(),
            selector: node.selector.clone(),
            image,
        });
    }

    shots
}

/// Evidence entries for when no browser session could be opened at all:
/// same shape and ordering as a real capture, every image absent.
#[must_use]
pub fn absent_shots(violations: &[Violation], limit: usize) -> Vec<EvidenceShot> {
    violations
        .iter()
        .take(limit)
        .map(|violation| EvidenceShot {
            rule_id: violation.rule_id.clone(),
            selector: violation
                .nodes
                .first()
                .map(|n| n.selector.clone())
                .unwrap_or_default(),
            image: None,
        })
        .collect()
}
