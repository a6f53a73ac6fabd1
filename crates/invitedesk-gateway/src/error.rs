//! Error types for gateway operations.

/// Result type alias for gateway operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Gateway error types.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// HTTP request error (transport failure, timeout, TLS, DNS).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON parsing error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The backend processed the call and rejected it.
    #[error("{message}")]
    Rejected {
        /// The backend's human-readable rejection message.
        message: String,
    },

    /// Response decoded but is missing a required field.
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// URL parsing error.
    #[error("URL error: {0}")]
    Url(#[from] url::ParseError),
}

impl Error {
    /// Creates a rejection error from the backend's message.
    #[must_use]
    pub fn rejected(message: impl Into<String>) -> Self {
        Self::Rejected {
            message: message.into(),
        }
    }

    /// Returns true for transport-level failures (as opposed to
    /// rejections the backend produced after processing the call).
    #[must_use]
    pub const fn is_transport(&self) -> bool {
        matches!(self, Self::Http(_))
    }
}
