use fiscalia_core::AppError;
use thiserror::Error;

/// Fallback text when the backend gives no usable message.
pub const GENERIC_FAILURE_MESSAGE: &str = "the profile change could not be saved";

/// Operator-facing failures of profile editing.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProfileAssignmentError {
    /// Catalog or snapshot could not be loaded.
    #[error("could not load profile data: {message}")]
    TransientFetch {
        /// Underlying failure.
        message: String,
    },

    /// Submit attempted with no profile selected.
    #[error("select at least one profile")]
    EmptySelection,

    /// Backend refused a revocation that would leave the user without profiles.
    #[error("this user must keep at least one profile: {server_message}")]
    LastActiveProfileRevocation {
        /// Backend message, shown verbatim.
        server_message: String,
    },

    /// Any other backend rejection.
    #[error("{message}")]
    GenericApi {
        /// Backend message or the generic fallback.
        message: String,
    },

    /// The editing session was closed before the action ran.
    #[error("the profile editing session is closed")]
    SessionClosed,
}

impl ProfileAssignmentError {
    /// Classifies a failure while loading catalog or snapshot.
    #[must_use]
    pub fn from_fetch(error: AppError) -> Self {
        match error {
            AppError::Unavailable(message) | AppError::Internal(message) => {
                Self::TransientFetch { message }
            }
            other => Self::generic(other.message()),
        }
    }

    /// Classifies a failure of a grant or revoke call.
    #[must_use]
    pub fn from_assignment(error: AppError) -> Self {
        match error {
            AppError::LastActiveProfile(server_message) => {
                Self::LastActiveProfileRevocation { server_message }
            }
            other => Self::generic(other.message()),
        }
    }

    fn generic(message: &str) -> Self {
        let message = message.trim();
        let message = if message.is_empty() {
            GENERIC_FAILURE_MESSAGE.to_owned()
        } else {
            message.to_owned()
        };

        Self::GenericApi { message }
    }

    /// Returns whether this is the backend last-profile rejection.
    #[must_use]
    pub fn is_last_active_profile(&self) -> bool {
        matches!(self, Self::LastActiveProfileRevocation { .. })
    }
}

impl From<ProfileAssignmentError> for AppError {
    fn from(value: ProfileAssignmentError) -> Self {
        let message = value.to_string();
        match value {
            ProfileAssignmentError::TransientFetch { .. } => Self::Unavailable(message),
            ProfileAssignmentError::EmptySelection => Self::Validation(message),
            ProfileAssignmentError::LastActiveProfileRevocation { .. } => {
                Self::LastActiveProfile(message)
            }
            ProfileAssignmentError::GenericApi { .. } => Self::Internal(message),
            ProfileAssignmentError::SessionClosed => Self::Conflict(message),
        }
    }
}
