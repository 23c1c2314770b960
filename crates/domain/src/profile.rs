use std::collections::HashSet;
use std::fmt::{Display, Formatter};

use fiscalia_core::{AppResult, NonEmptyString};
use serde::{Deserialize, Serialize};

/// Identifier of an assignable access profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProfileId(i64);

impl ProfileId {
    /// Creates a profile identifier from the backend integer key.
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

impl From<i64> for ProfileId {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

impl Display for ProfileId {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "{}", self.0)
    }
}

/// Access profile (role) such as Administrator, Manager or Inspector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Profile {
    id: ProfileId,
    name: NonEmptyString,
    active: bool,
}

impl Profile {
    /// Creates a validated profile definition.
    pub fn new(id: ProfileId, name: impl Into<String>, active: bool) -> AppResult<Self> {
        let name = name.into().trim().to_owned();

        Ok(Self {
            id,
            name: NonEmptyString::new(name)?,
            active,
        })
    }

    /// Returns the profile identifier.
    #[must_use]
    pub fn id(&self) -> ProfileId {
        self.id
    }

    /// Returns the human-readable profile label.
    #[must_use]
    pub fn name(&self) -> &str {
        self.name.as_str()
    }

    /// Returns whether the profile may be offered for selection.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.active
    }
}

/// Active profiles offered as selection candidates, in backend order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProfileCatalog {
    profiles: Vec<Profile>,
}

impl ProfileCatalog {
    /// Builds a catalog from the backend listing.
    ///
    /// Inactive profiles are dropped and the listing order is preserved. When
    /// the backend repeats an id, the first occurrence wins.
    #[must_use]
    pub fn from_profiles(profiles: impl IntoIterator<Item = Profile>) -> Self {
        let mut seen = HashSet::new();
        let profiles = profiles
            .into_iter()
            .filter(Profile::is_active)
            .filter(|profile| seen.insert(profile.id()))
            .collect();

        Self { profiles }
    }

    /// Returns an empty catalog, shown as "no profiles available".
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Returns the candidates in display order.
    #[must_use]
    pub fn profiles(&self) -> &[Profile] {
        &self.profiles
    }

    /// Finds an active candidate by id.
    #[must_use]
    pub fn find(&self, profile_id: ProfileId) -> Option<&Profile> {
        self.profiles
            .iter()
            .find(|profile| profile.id() == profile_id)
    }

    /// Returns whether the id is an active candidate.
    #[must_use]
    pub fn contains(&self, profile_id: ProfileId) -> bool {
        self.find(profile_id).is_some()
    }

    /// Returns whether no candidate is available.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }

    /// Returns the number of candidates.
    #[must_use]
    pub fn len(&self) -> usize {
        self.profiles.len()
    }
}
