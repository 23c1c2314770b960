//! Shared primitives for all Rust crates in Fiscalia.

#![forbid(unsafe_code)]

/// Authentication primitives shared across services.
pub mod auth;

use thiserror::Error;

pub use auth::OperatorSession;

/// Result type used across Fiscalia crates.
pub type AppResult<T> = Result<T, AppError>;

/// A validated non-empty UTF-8 string.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NonEmptyString(String);

impl NonEmptyString {
    /// Creates a validated non-empty string.
    pub fn new(value: impl Into<String>) -> AppResult<Self> {
        let value = value.into();
        if value.trim().is_empty() {
            return Err(AppError::Validation(
                "value must not be empty or whitespace".to_owned(),
            ));
        }

        Ok(Self(value))
    }

    /// Returns the underlying string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl From<NonEmptyString> for String {
    fn from(value: NonEmptyString) -> Self {
        value.0
    }
}

/// Common application error categories.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AppError {
    /// Invalid input or violated invariant.
    #[error("validation error: {0}")]
    Validation(String),

    /// Requested resource does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// Write operation conflicts with existing state.
    #[error("conflict: {0}")]
    Conflict(String),

    /// User is not authenticated or not allowed to access a resource.
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// User is authenticated but blocked by authorization policy.
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// Remote service could not be reached or answered with a transient failure.
    #[error("unavailable: {0}")]
    Unavailable(String),

    /// Revocation rejected because the user would be left without an active profile.
    #[error("last active profile: {0}")]
    LastActiveProfile(String),

    /// Internal unexpected error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Returns the message carried by the error without its category prefix.
    #[must_use]
    pub fn message(&self) -> &str {
        match self {
            Self::Validation(message)
            | Self::NotFound(message)
            | Self::Conflict(message)
            | Self::Unauthorized(message)
            | Self::Forbidden(message)
            | Self::Unavailable(message)
            | Self::LastActiveProfile(message)
            | Self::Internal(message) => message.as_str(),
        }
    }
}
