use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ScanError {
    #[error("Browser error: {0}")]
    Browser(String),

    #[error("{operation} timed out after {after:?}")]
    Timeout {
        operation: String,
        after: Duration,
    },

    #[error("Element not found: {0}")]
    ElementNotFound(String),

    #[error("Element detached from the document: {0}")]
    Detached(String),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Script evaluation failed: {0}")]
    Script(String),

    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Other error: {0}")]
    Other(String),
}

impl ScanError {
    pub fn timeout(operation: impl Into<String>, after: Duration) -> Self {
        ScanError::Timeout {
            operation: operation.into(),
            after,
        }
    }

    /// Element-scoped failures that the discovery engine skips rather than propagates.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            ScanError::Timeout { .. }
                | ScanError::ElementNotFound(_)
                | ScanError::Detached(_)
                | ScanError::Script(_)
        )
    }
}

impl From<chromiumoxide::error::CdpError> for ScanError {
    fn from(err: chromiumoxide::error::CdpError) -> Self {
        use chromiumoxide::error::CdpError;
        match err {
            CdpError::NotFound => ScanError::ElementNotFound("node".to_string()),
            CdpError::Timeout => ScanError::timeout("cdp request", Duration::ZERO),
            // Protocol-level rejections are scoped to the node the command targeted
            CdpError::Chrome(err) => ScanError::Detached(err.message),
            err @ CdpError::JavascriptException(_) => ScanError::Script(err.to_string()),
            other => ScanError::Browser(other.to_string()),
        }
    }
}

pub type Result<T> = std::result::Result<T, ScanError>;
