use thiserror::Error;

pub type Result<T> = std::result::Result<T, ReportError>;

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("failed to write report artifact: {0}")]
    Io(#[from] std::io::Error),

    #[error("report rendering failed: {0}")]
    Render(String),
}
