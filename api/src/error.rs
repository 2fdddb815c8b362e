use thiserror::Error;

pub type ApiResult<T> = Result<T, ApiError>;

#[derive(Debug, Error)]
pub enum ApiError {
    /// Caller arguments are invalid or mutually exclusive.
    #[error("Configuration error: {0}")]
    Configuration(String),
    /// The JSON document matches none of the supported shapes.
    #[error("Malformed payload: {0}")]
    MalformedPayload(String),
    /// A "not modified" response could not be attributed to a conditional header.
    #[error("Inconsistent state: {0}")]
    InconsistentState(String),
    #[error("Network error for {1}: {0}")]
    Network(#[source] reqwest::Error, String),
    #[error("Parse error for {1}: {0}")]
    Parsing(#[source] serde_json::Error, String),
    #[error("Unknown column: {0}")]
    UnknownColumn(String),
}

impl ApiError {
    pub(crate) fn config(msg: impl Into<String>) -> Self {
        ApiError::Configuration(msg.into())
    }

    pub(crate) fn malformed(msg: impl Into<String>) -> Self {
        ApiError::MalformedPayload(msg.into())
    }
}
