use async_trait::async_trait;

use fiscalia_core::{AppResult, OperatorSession};
use fiscalia_domain::{Profile, UserId, UserProfileInfo};

use super::requests::{AssignmentConfirmation, ProfileAssignmentRequest};

/// Port for the user-administration backend that owns profile assignments.
#[async_trait]
pub trait ProfileDirectory: Send + Sync {
    /// Lists every profile known to the backend, active or not.
    async fn list_profiles(&self, session: &OperatorSession) -> AppResult<Vec<Profile>>;

    /// Returns the complete profile record of a user.
    ///
    /// A user without profile history yields `AppError::NotFound`.
    async fn get_user_profile_info(
        &self,
        session: &OperatorSession,
        user_id: UserId,
    ) -> AppResult<UserProfileInfo>;

    /// Grants profiles to a user.
    async fn grant_profiles(
        &self,
        session: &OperatorSession,
        user_id: UserId,
        request: &ProfileAssignmentRequest,
    ) -> AppResult<AssignmentConfirmation>;

    /// Revokes profiles from a user.
    ///
    /// Fails with `AppError::LastActiveProfile` when the user would be left
    /// without an active profile.
    async fn revoke_profiles(
        &self,
        session: &OperatorSession,
        user_id: UserId,
        request: &ProfileAssignmentRequest,
    ) -> AppResult<AssignmentConfirmation>;
}

/// Port for the list view that displays users and their profiles.
#[async_trait]
pub trait ProfileListRefresher: Send + Sync {
    /// Asks the view to reload after a confirmed assignment change.
    async fn request_refresh(&self, user_id: UserId) -> AppResult<()>;
}
