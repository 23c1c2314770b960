//! User-side profile assignment state.

use std::collections::BTreeSet;
use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};

use crate::ProfileId;

/// Identifier of a user record issued by the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(i64);

impl UserId {
    /// Creates a user identifier from the backend integer key.
    #[must_use]
    pub const fn new(value: i64) -> Self {
        Self(value)
    }

    /// Returns the backend integer key.
    #[must_use]
    pub const fn value(self) -> i64 {
        self.0
    }
}

impl From<i64> for UserId {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

impl Display for UserId {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "{}", self.0)
    }
}

/// Profiles currently granted to a user, captured when an editing session opens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserProfileSnapshot {
    user_id: UserId,
    profile_ids: BTreeSet<ProfileId>,
}

impl UserProfileSnapshot {
    /// Creates a snapshot from granted profile ids.
    #[must_use]
    pub fn new(user_id: UserId, profile_ids: impl IntoIterator<Item = ProfileId>) -> Self {
        Self {
            user_id,
            profile_ids: profile_ids.into_iter().collect(),
        }
    }

    /// Creates the snapshot of a user without profile history.
    #[must_use]
    pub fn empty(user_id: UserId) -> Self {
        Self {
            user_id,
            profile_ids: BTreeSet::new(),
        }
    }

    /// Returns the user the snapshot belongs to.
    #[must_use]
    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    /// Returns granted profile ids.
    #[must_use]
    pub fn profile_ids(&self) -> &BTreeSet<ProfileId> {
        &self.profile_ids
    }

    /// Returns whether the profile is granted.
    #[must_use]
    pub fn contains(&self, profile_id: ProfileId) -> bool {
        self.profile_ids.contains(&profile_id)
    }

    /// A user without any profile breaks the assignment invariant and must be
    /// flagged to the operator.
    #[must_use]
    pub fn is_degraded(&self) -> bool {
        self.profile_ids.is_empty()
    }
}

/// Complete profile record of a user as reported by the backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserProfileInfo {
    /// User identifier.
    pub user_id: UserId,
    /// Display name.
    pub name: String,
    /// Contact email, when registered.
    pub email: Option<String>,
    /// Staff registration number ("matrícula").
    pub registration: Option<String>,
    /// Granted profile names.
    pub profile_names: Vec<String>,
    /// Granted profile ids.
    pub profile_ids: Vec<ProfileId>,
    /// Backend-formatted summary of granted profiles.
    pub profiles_text: Option<String>,
}

impl UserProfileInfo {
    /// Projects the record onto the set of granted profile ids.
    #[must_use]
    pub fn snapshot(&self) -> UserProfileSnapshot {
        UserProfileSnapshot::new(self.user_id, self.profile_ids.iter().copied())
    }

    /// Returns the profile summary, building one from names when the backend omits it.
    #[must_use]
    pub fn profiles_summary(&self) -> String {
        match self.profiles_text.as_deref().map(str::trim) {
            Some(text) if !text.is_empty() => text.to_owned(),
            _ => self.profile_names.join(", "),
        }
    }
}
