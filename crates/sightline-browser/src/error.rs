use thiserror::Error;

pub type Result<T> = std::result::Result<T, BrowserError>;

#[derive(Debug, Error)]
pub enum BrowserError {
    #[error("browser launch failed: {0}")]
    Launch(String),

    #[error("navigation failed: {0}")]
    Navigation(String),

    #[error("timeout: {0}")]
    Timeout(String),

    #[error("selector not found: {0}")]
    SelectorNotFound(String),

    #[error("screenshot failed: {0}")]
    Screenshot(String),

    #[error("script evaluation failed: {0}")]
    Evaluation(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = BrowserError::Navigation("net::ERR_NAME_NOT_RESOLVED".to_string());
        assert_eq!(
            err.to_string(),
            "navigation failed: net::ERR_NAME_NOT_RESOLVED"
        );
    }

    #[test]
    fn test_selector_error_carries_selector() {
        let err = BrowserError::SelectorNotFound("img:nth-of-type(3)".to_string());
        assert!(err.to_string().contains("img:nth-of-type(3)"));
    }
}
