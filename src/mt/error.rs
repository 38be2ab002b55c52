/// Error types for the translation relay pipeline
///
/// Errors are `Clone` because the error of the last transport in the fallback
/// chain is handed to the caller's completion callback unchanged.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MtError {
    /// Missing or invalid relay configuration; no transport is attempted
    #[error("Configuration error: {0}")]
    ConfigError(String),
    /// Connectivity failure or non-success HTTP status
    #[error("Network error: {0}")]
    NetworkError(String),
    /// The service answered with an error page instead of results
    #[error("Service error: {0}")]
    ServiceError(String),
    /// The service signalled that it is throttling requests
    #[error("Rate limited: {0}")]
    RateLimited(String),
    /// The response could not be realigned with the outbound queries
    #[error("Malformed response: {0}")]
    MalformedResponse(String),
    /// A language code that cannot be used for a request
    #[error("Invalid locale: {0}")]
    InvalidLocale(String),
    /// The job was cancelled before it completed
    #[error("Translation cancelled")]
    Cancelled,
    /// General error with context
    #[error("{0}")]
    Other(String),
}

impl MtError {
    /// Whether the next strategy in the fallback chain should be tried
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            MtError::NetworkError(_)
                | MtError::ServiceError(_)
                | MtError::RateLimited(_)
                | MtError::MalformedResponse(_)
        )
    }
}

impl From<reqwest::Error> for MtError {
    fn from(err: reqwest::Error) -> Self {
        MtError::NetworkError(err.to_string())
    }
}

/// Result type for relay operations
pub type MtResult<T> = Result<T, MtError>;
