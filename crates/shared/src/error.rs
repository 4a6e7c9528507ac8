//! Application-wide error types.

use thiserror::Error;

/// Result type alias using `AppError`.
pub type AppResult<T> = Result<T, AppError>;

/// Application error types.
///
/// Validation and confirmation failures are raised before any write is
/// issued. Store failures are recoverable: the operator may retry.
#[derive(Debug, Error)]
pub enum AppError {
    /// Missing required field, non-positive amount, unsaved record, and similar.
    #[error("Validation error: {0}")]
    Validation(String),

    /// Record absent from the store.
    #[error("Not found: {0}")]
    NotFound(String),

    /// A destructive action was attempted without operator confirmation.
    #[error("Confirmation required: {0}")]
    ConfirmationRequired(String),

    /// Concurrent modification detected (e.g., a bill number was taken).
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Document store failure (network, permission, backend).
    #[error("Store error: {0}")]
    Store(String),

    /// Internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn status_code(&self) -> u16 {
        match self {
            Self::Validation(_) => 400,
            Self::NotFound(_) => 404,
            Self::Conflict(_) => 409,
            Self::ConfirmationRequired(_) => 428,
            Self::Store(_) => 503,
            Self::Internal(_) => 500,
        }
    }

    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::NotFound(_) => "NOT_FOUND",
            Self::ConfirmationRequired(_) => "CONFIRMATION_REQUIRED",
            Self::Conflict(_) => "CONFLICT",
            Self::Store(_) => "STORE_ERROR",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Returns true if repeating the same request may succeed.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::Conflict(_) | Self::Store(_))
    }
}
