//! Error types for the core library.

use thiserror::Error;

/// Validation failures for a submission or edit, rejected before the
/// queue is touched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Participant name is empty.
    MissingName,
    /// Primary phone number is empty.
    MissingPrimaryPhone,
    /// Session label is empty.
    MissingSession,
    /// Session descriptor is empty.
    MissingSessionDescriptor,
    /// Session descriptor does not split into date-region-location.
    MalformedSessionDescriptor,
}

impl ValidationError {
    /// Get human-readable error message.
    #[must_use]
    pub const fn message(&self) -> &'static str {
        match self {
            Self::MissingName => "Participant name is required",
            Self::MissingPrimaryPhone => "Primary phone number is required",
            Self::MissingSession => "Session selection is required",
            Self::MissingSessionDescriptor => "Session descriptor is required",
            Self::MalformedSessionDescriptor => "Session descriptor format is invalid",
        }
    }

    /// Get the field name this error relates to.
    #[must_use]
    pub const fn field(&self) -> &'static str {
        match self {
            Self::MissingName => "name",
            Self::MissingPrimaryPhone => "phone1",
            Self::MissingSession => "session",
            Self::MissingSessionDescriptor | Self::MalformedSessionDescriptor => "session_info",
        }
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message())
    }
}

impl std::error::Error for ValidationError {}

/// Errors that can occur in core operations.
#[derive(Debug, Error)]
pub enum Error {
    /// Submission or edit rejected before queuing.
    #[error("{0}")]
    Validation(#[from] ValidationError),

    /// Optimistic quota pre-check denied the submission.
    #[error("{reason}")]
    QuotaExceeded {
        /// User-facing denial reason, including the current count and limit.
        reason: String,
    },

    /// Local record store operation failed.
    #[error("Store error: {0}")]
    Store(#[from] sqlx::Error),

    /// Remote store gateway call failed.
    #[error("Gateway error: {0}")]
    Gateway(#[from] invitedesk_gateway::Error),

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    /// Operation requires a signed-in user.
    #[error("No signed-in user")]
    NotSignedIn,
}

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;
