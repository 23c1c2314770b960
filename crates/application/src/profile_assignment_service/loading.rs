use fiscalia_core::{AppError, OperatorSession};
use fiscalia_domain::{ProfileCatalog, UserId, UserProfileInfo, UserProfileSnapshot};
use tracing::{debug, info, warn};

use super::{ProfileAssignmentError, ProfileAssignmentService, ProfileEditingSession};

impl ProfileAssignmentService {
    /// Loads the active profiles offered for selection, in backend order.
    pub async fn load_catalog(
        &self,
        operator: &OperatorSession,
    ) -> Result<ProfileCatalog, ProfileAssignmentError> {
        let profiles = self
            .directory
            .list_profiles(operator)
            .await
            .map_err(ProfileAssignmentError::from_fetch)?;

        let listed = profiles.len();
        let catalog = ProfileCatalog::from_profiles(profiles);
        debug!(
            operator = %operator.subject(),
            listed,
            active = catalog.len(),
            "loaded profile catalog"
        );

        Ok(catalog)
    }

    /// Loads the complete profile record of a user.
    ///
    /// Returns `None` for a user without profile history.
    pub async fn load_user_info(
        &self,
        operator: &OperatorSession,
        user_id: UserId,
    ) -> Result<Option<UserProfileInfo>, ProfileAssignmentError> {
        match self
            .directory
            .get_user_profile_info(operator, user_id)
            .await
        {
            Ok(info) if info.user_id != user_id => Err(ProfileAssignmentError::TransientFetch {
                message: format!(
                    "backend returned profiles of user '{}' when asked for user '{user_id}'",
                    info.user_id
                ),
            }),
            Ok(info) => Ok(Some(info)),
            Err(AppError::NotFound(_)) => Ok(None),
            Err(error) => Err(ProfileAssignmentError::from_fetch(error)),
        }
    }

    /// Loads the profiles currently granted to a user.
    ///
    /// A user the backend does not know yet gets an empty snapshot.
    pub async fn load_snapshot(
        &self,
        operator: &OperatorSession,
        user_id: UserId,
    ) -> Result<UserProfileSnapshot, ProfileAssignmentError> {
        let snapshot = match self.load_user_info(operator, user_id).await? {
            Some(info) => info.snapshot(),
            None => {
                debug!(
                    operator = %operator.subject(),
                    user_id = %user_id,
                    "user has no profile history, starting from an empty snapshot"
                );
                UserProfileSnapshot::empty(user_id)
            }
        };

        if snapshot.is_degraded() {
            warn!(
                operator = %operator.subject(),
                user_id = %user_id,
                "user holds no profile"
            );
        }

        Ok(snapshot)
    }

    /// Opens an editing session for a user.
    ///
    /// Catalog and snapshot are loaded concurrently. A catalog failure leaves
    /// the session with no candidates and a recorded error; a snapshot failure
    /// prevents the session from opening.
    pub async fn start_session(
        &self,
        operator: OperatorSession,
        user_id: UserId,
    ) -> Result<ProfileEditingSession, ProfileAssignmentError> {
        let (catalog, snapshot) = tokio::join!(
            self.load_catalog(&operator),
            self.load_snapshot(&operator, user_id)
        );

        let snapshot = snapshot.inspect_err(|error| {
            warn!(
                operator = %operator.subject(),
                user_id = %user_id,
                error = %error,
                "failed to load user profiles"
            );
        })?;

        let (catalog, catalog_error) = match catalog {
            Ok(catalog) => (catalog, None),
            Err(error) => {
                warn!(
                    operator = %operator.subject(),
                    user_id = %user_id,
                    error = %error,
                    "failed to load profile catalog, no profiles available"
                );
                (ProfileCatalog::empty(), Some(error))
            }
        };

        let session = ProfileEditingSession::new(operator, catalog, catalog_error, snapshot);
        info!(
            operator = %session.operator().subject(),
            user_id = %user_id,
            session_id = %session.handle().session_id(),
            candidates = session.catalog().len(),
            granted = session.snapshot().profile_ids().len(),
            "opened profile editing session"
        );

        Ok(session)
    }
}
