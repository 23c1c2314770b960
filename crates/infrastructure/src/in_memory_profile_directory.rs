use std::collections::{BTreeSet, HashMap};

use async_trait::async_trait;
use fiscalia_application::{AssignmentConfirmation, ProfileAssignmentRequest, ProfileDirectory};
use fiscalia_core::{AppError, AppResult, OperatorSession};
use fiscalia_domain::{Profile, ProfileId, UserId, UserProfileInfo};
use tokio::sync::RwLock;

/// In-memory profile backend that enforces the same assignment rules as the API.
#[derive(Debug, Default)]
pub struct InMemoryProfileDirectory {
    profiles: RwLock<Vec<Profile>>,
    assignments: RwLock<HashMap<UserId, BTreeSet<ProfileId>>>,
}

impl InMemoryProfileDirectory {
    /// Creates a directory with the given profile catalog and no assignments.
    #[must_use]
    pub fn new(profiles: Vec<Profile>) -> Self {
        Self {
            profiles: RwLock::new(profiles),
            assignments: RwLock::new(HashMap::new()),
        }
    }

    /// Seeds the profiles held by a user.
    pub async fn set_user_profiles(
        &self,
        user_id: UserId,
        profile_ids: impl IntoIterator<Item = ProfileId>,
    ) {
        self.assignments
            .write()
            .await
            .insert(user_id, profile_ids.into_iter().collect());
    }

    /// Returns the profiles held by a user.
    pub async fn user_profiles(&self, user_id: UserId) -> Option<BTreeSet<ProfileId>> {
        self.assignments.read().await.get(&user_id).cloned()
    }

    async fn active_profile_ids(&self) -> BTreeSet<ProfileId> {
        self.profiles
            .read()
            .await
            .iter()
            .filter(|profile| profile.is_active())
            .map(Profile::id)
            .collect()
    }
}

#[async_trait]
impl ProfileDirectory for InMemoryProfileDirectory {
    async fn list_profiles(&self, _session: &OperatorSession) -> AppResult<Vec<Profile>> {
        Ok(self.profiles.read().await.clone())
    }

    async fn get_user_profile_info(
        &self,
        _session: &OperatorSession,
        user_id: UserId,
    ) -> AppResult<UserProfileInfo> {
        let profile_ids = self
            .assignments
            .read()
            .await
            .get(&user_id)
            .cloned()
            .ok_or_else(|| AppError::NotFound(format!("user '{user_id}' has no profiles")))?;

        let profiles = self.profiles.read().await;
        let profile_names = profiles
            .iter()
            .filter(|profile| profile_ids.contains(&profile.id()))
            .map(|profile| profile.name().to_owned())
            .collect::<Vec<_>>();

        Ok(UserProfileInfo {
            user_id,
            name: format!("user {user_id}"),
            email: None,
            registration: None,
            profiles_text: Some(profile_names.join(", ")),
            profile_names,
            profile_ids: profile_ids.into_iter().collect(),
        })
    }

    async fn grant_profiles(
        &self,
        _session: &OperatorSession,
        user_id: UserId,
        request: &ProfileAssignmentRequest,
    ) -> AppResult<AssignmentConfirmation> {
        let active = self.active_profile_ids().await;
        if let Some(unknown) = request
            .profile_ids
            .iter()
            .find(|profile_id| !active.contains(*profile_id))
        {
            return Err(AppError::Validation(format!(
                "profile '{unknown}' does not exist or is inactive"
            )));
        }

        let mut assignments = self.assignments.write().await;
        let held = assignments.entry(user_id).or_default();
        held.extend(request.profile_ids.iter().copied());

        Ok(AssignmentConfirmation {
            user_id,
            profile_ids: Some(held.iter().copied().collect()),
            message: None,
        })
    }

    async fn revoke_profiles(
        &self,
        _session: &OperatorSession,
        user_id: UserId,
        request: &ProfileAssignmentRequest,
    ) -> AppResult<AssignmentConfirmation> {
        let active = self.active_profile_ids().await;
        let mut assignments = self.assignments.write().await;
        let Some(held) = assignments.get_mut(&user_id) else {
            return Ok(AssignmentConfirmation {
                user_id,
                profile_ids: Some(Vec::new()),
                message: None,
            });
        };

        if held.is_disjoint(&request.profile_ids) {
            return Ok(AssignmentConfirmation {
                user_id,
                profile_ids: Some(held.iter().copied().collect()),
                message: None,
            });
        }

        let remaining: BTreeSet<ProfileId> =
            held.difference(&request.profile_ids).copied().collect();
        if !remaining.iter().any(|profile_id| active.contains(profile_id)) {
            return Err(AppError::LastActiveProfile(format!(
                "user '{user_id}' must keep at least one active profile"
            )));
        }
        *held = remaining;

        Ok(AssignmentConfirmation {
            user_id,
            profile_ids: Some(held.iter().copied().collect()),
            message: None,
        })
    }
}
