use crate::models::SourceId;
use thiserror::Error as ThisError;

#[derive(ThisError, Debug)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Rate limit exceeded")]
    RateLimit,

    /// One provider failed or timed out; its contribution is dropped from the cycle.
    #[error("Source {provider} unavailable: {reason}")]
    SourceUnavailable { provider: SourceId, reason: String },

    /// A provider answered with a body that could not be decoded.
    #[error("Malformed payload from {provider}: {reason}")]
    MalformedPayload { provider: SourceId, reason: String },

    /// Every source failed in one fetch cycle.
    #[error("No data available from any source")]
    NoDataAvailable,

    #[error("Analysis error: {0}")]
    Analysis(String),

    #[error("{0}")]
    Other(String),
}

impl AppError {
    /// Per-source failures are tolerated by the orchestrator, everything else is not.
    pub fn is_source_failure(&self) -> bool {
        matches!(
            self,
            AppError::SourceUnavailable { .. } | AppError::MalformedPayload { .. }
        )
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::Other(format!("IO error: {}", err))
    }
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        AppError::Network(err.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Parse(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
