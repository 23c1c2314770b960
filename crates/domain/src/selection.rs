use std::collections::BTreeSet;

use fiscalia_core::{AppError, AppResult};

use crate::{ProfileId, UserProfileSnapshot};

/// Maximum length accepted for assignment notes.
pub const ASSIGNMENT_NOTES_MAX_LENGTH: usize = 500;

/// Profiles the operator is choosing for a user.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProfileSelection {
    profile_ids: BTreeSet<ProfileId>,
}

impl ProfileSelection {
    /// Creates a selection from explicit ids.
    #[must_use]
    pub fn new(profile_ids: impl IntoIterator<Item = ProfileId>) -> Self {
        Self {
            profile_ids: profile_ids.into_iter().collect(),
        }
    }

    /// Seeds a selection with the profiles the user currently holds.
    #[must_use]
    pub fn seeded_from(snapshot: &UserProfileSnapshot) -> Self {
        Self {
            profile_ids: snapshot.profile_ids().clone(),
        }
    }

    /// Flips the membership of a profile and returns whether it is now selected.
    pub fn toggle(&mut self, profile_id: ProfileId) -> bool {
        if self.profile_ids.remove(&profile_id) {
            false
        } else {
            self.profile_ids.insert(profile_id);
            true
        }
    }

    /// Adds a profile; returns `false` when it was already selected.
    pub fn select(&mut self, profile_id: ProfileId) -> bool {
        self.profile_ids.insert(profile_id)
    }

    /// Removes a profile; returns `false` when it was not selected.
    pub fn remove(&mut self, profile_id: ProfileId) -> bool {
        self.profile_ids.remove(&profile_id)
    }

    /// Returns whether the profile is selected.
    #[must_use]
    pub fn contains(&self, profile_id: ProfileId) -> bool {
        self.profile_ids.contains(&profile_id)
    }

    /// Returns selected ids.
    #[must_use]
    pub fn ids(&self) -> &BTreeSet<ProfileId> {
        &self.profile_ids
    }

    /// Returns whether nothing is selected.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.profile_ids.is_empty()
    }

    /// Required-field rule: at least one profile must be selected.
    pub fn validate(&self) -> AppResult<&BTreeSet<ProfileId>> {
        if self.profile_ids.is_empty() {
            return Err(AppError::Validation(
                "select at least one profile".to_owned(),
            ));
        }

        Ok(&self.profile_ids)
    }
}

/// Optional free-text justification attached to grant and revoke calls.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AssignmentNotes(Option<String>);

impl AssignmentNotes {
    /// Creates validated notes; blank input means no notes.
    pub fn new(value: Option<String>) -> AppResult<Self> {
        let value = value.and_then(|value| {
            let trimmed = value.trim().to_owned();
            (!trimmed.is_empty()).then_some(trimmed)
        });

        if let Some(text) = &value
            && text.chars().count() > ASSIGNMENT_NOTES_MAX_LENGTH
        {
            return Err(AppError::Validation(format!(
                "notes must be at most {ASSIGNMENT_NOTES_MAX_LENGTH} characters"
            )));
        }

        Ok(Self(value))
    }

    /// Returns notes without any text.
    #[must_use]
    pub fn none() -> Self {
        Self(None)
    }

    /// Returns the note text.
    #[must_use]
    pub fn as_deref(&self) -> Option<&str> {
        self.0.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use fiscalia_core::AppError;

    use super::{ASSIGNMENT_NOTES_MAX_LENGTH, AssignmentNotes, ProfileSelection};
    use crate::{ProfileId, UserId, UserProfileSnapshot};

    #[test]
    fn toggle_flips_membership() {
        let snapshot = UserProfileSnapshot::new(UserId::new(1), [ProfileId::new(1)]);
        let mut selection = ProfileSelection::seeded_from(&snapshot);

        assert!(!selection.toggle(ProfileId::new(1)));
        assert!(selection.toggle(ProfileId::new(4)));
        assert!(selection.contains(ProfileId::new(4)));
        assert!(!selection.contains(ProfileId::new(1)));
    }

    #[test]
    fn validate_rejects_empty_selection() {
        let selection = ProfileSelection::default();
        assert!(matches!(selection.validate(), Err(AppError::Validation(_))));
    }

    #[test]
    fn notes_are_trimmed_and_blank_is_absent() {
        let notes = AssignmentNotes::new(Some("  promoted  ".to_owned()))
            .unwrap_or_else(|_| unreachable!());
        assert_eq!(notes.as_deref(), Some("promoted"));

        let blank =
            AssignmentNotes::new(Some("   ".to_owned())).unwrap_or_else(|_| unreachable!());
        assert_eq!(blank, AssignmentNotes::none());
    }

    #[test]
    fn notes_reject_overlong_text() {
        let text = "x".repeat(ASSIGNMENT_NOTES_MAX_LENGTH + 1);
        assert!(AssignmentNotes::new(Some(text)).is_err());
    }
}
