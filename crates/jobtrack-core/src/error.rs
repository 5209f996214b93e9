use thiserror::Error;

/// Application-wide error types for jobtrack.
#[derive(Error, Debug)]
pub enum AppError {
    /// HTTP request to an external API failed.
    #[error("HTTP error: {0}")]
    HttpError(String),

    /// External provider has no record for the queried code/area.
    ///
    /// This drives the fallback ladder in the job-count fetcher; exhausting
    /// the ladder is a valid "no data" outcome, not a failure.
    #[error("not found: {0}")]
    NotFound(String),

    /// Provider reported a nonzero job count but no company data.
    ///
    /// Treated as a hard failure for that single fetch: nothing is
    /// persisted and the prior record is left untouched.
    #[error("data integrity: provider returned {job_count} jobs but no companies for {code} in {area}")]
    DataIntegrity {
        code: String,
        area: String,
        job_count: u64,
    },

    /// Request timed out.
    #[error("Request timed out after {0} seconds")]
    Timeout(u64),

    /// Rate limit exceeded.
    #[error("Rate limit exceeded")]
    RateLimitExceeded,

    /// Network/connection error.
    #[error("Network error: {0}")]
    NetworkError(String),

    /// Database operation failed.
    #[error("Database error: {0}")]
    DatabaseError(String),

    /// JSON serialization/deserialization failed.
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    /// Missing or invalid configuration.
    #[error("Config error: {0}")]
    ConfigError(String),

    /// Generic error.
    #[error("{0}")]
    Generic(String),
}

impl AppError {
    /// Returns true if this error is transient and worth retrying
    /// at the same scope.
    pub fn is_retryable(&self) -> bool {
        match self {
            AppError::NetworkError(_) | AppError::Timeout(_) | AppError::RateLimitExceeded => true,
            AppError::HttpError(msg) => {
                msg.contains("timeout") || msg.contains("connect") || msg.contains("reset")
            }
            _ => false,
        }
    }

    /// Returns true for the provider's "no record" response.
    pub fn is_not_found(&self) -> bool {
        matches!(self, AppError::NotFound(_))
    }
}
