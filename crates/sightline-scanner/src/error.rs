use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScanError {
    #[error("invalid target: {0}")]
    InvalidTarget(String),

    #[error("disallowed target: {0}")]
    DisallowedTarget(String),

    #[error("page load failed: {0}")]
    LoadFailure(String),

    #[error("rate limited by {url}, retry after {retry_after:?}")]
    RateLimited { url: String, retry_after: Duration },

    #[error("rule engine failure: {0}")]
    RuleEngine(String),

    #[error("report rendering failed: {0}")]
    ReportRender(#[from] sightline_report::ReportError),

    #[error("database error: {0}")]
    Database(#[from] sightline_db::DatabaseError),

    #[error("browser error: {0}")]
    Browser(#[from] sightline_browser::BrowserError),
}

impl ScanError {
    /// Whether this error is a synchronous request failure (4xx-equivalent)
    /// rather than a background pipeline failure.
    #[must_use]
    pub fn is_request_error(&self) -> bool {
        matches!(self, Self::InvalidTarget(_) | Self::DisallowedTarget(_))
    }
}

pub type Result<T> = std::result::Result<T, ScanError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ScanError::DisallowedTarget("10.0.0.5 is a private address".to_string());
        assert_eq!(
            err.to_string(),
            "disallowed target: 10.0.0.5 is a private address"
        );
    }

    #[test]
    fn test_request_error_classification() {
        assert!(ScanError::InvalidTarget(String::new()).is_request_error());
        assert!(ScanError::DisallowedTarget(String::new()).is_request_error());
        assert!(!ScanError::LoadFailure(String::new()).is_request_error());
        assert!(!ScanError::RuleEngine(String::new()).is_request_error());
    }
}
