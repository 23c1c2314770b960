use std::collections::BTreeSet;

use fiscalia_domain::ProfileId;

use crate::profile_assignment_ports::AssignmentConfirmation;

use super::errors::ProfileAssignmentError;

/// Result of one grant or revoke call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallOutcome {
    /// Nothing to send for this direction.
    Skipped,
    /// The backend confirmed the change for these profiles.
    Succeeded {
        /// Profiles granted or revoked.
        profile_ids: BTreeSet<ProfileId>,
        /// Backend acknowledgement of the call.
        confirmation: AssignmentConfirmation,
    },
    /// The backend rejected the call.
    Failed(ProfileAssignmentError),
    /// The call was needed but not issued because an earlier step aborted.
    NotAttempted,
}

impl CallOutcome {
    /// Returns whether the backend confirmed a change.
    #[must_use]
    pub fn is_succeeded(&self) -> bool {
        matches!(self, Self::Succeeded { .. })
    }

    /// Returns the call error, if any.
    #[must_use]
    pub fn error(&self) -> Option<&ProfileAssignmentError> {
        match self {
            Self::Failed(error) => Some(error),
            _ => None,
        }
    }

    fn confirmed_ids(&self) -> Option<&BTreeSet<ProfileId>> {
        match self {
            Self::Succeeded { profile_ids, .. } => Some(profile_ids),
            _ => None,
        }
    }

    fn reported_state(&self) -> Option<BTreeSet<ProfileId>> {
        match self {
            Self::Succeeded { confirmation, .. } => confirmation
                .profile_ids
                .as_ref()
                .map(|ids| ids.iter().copied().collect()),
            _ => None,
        }
    }
}

/// Changes confirmed by the backend.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AppliedChanges {
    /// Revoked profiles.
    pub revoked: BTreeSet<ProfileId>,
    /// Granted profiles.
    pub granted: BTreeSet<ProfileId>,
    /// Profiles the backend reported after the last call, when it did.
    pub reported: Option<BTreeSet<ProfileId>>,
}

/// A submit that did not fully apply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmitFailure {
    /// First classified error, revoke before grant.
    pub reason: ProfileAssignmentError,
    /// Revoke call outcome.
    pub revoke: CallOutcome,
    /// Grant call outcome.
    pub grant: CallOutcome,
}

impl SubmitFailure {
    /// Failure raised before any backend call.
    #[must_use]
    pub fn rejected(reason: ProfileAssignmentError) -> Self {
        Self {
            reason,
            revoke: CallOutcome::NotAttempted,
            grant: CallOutcome::NotAttempted,
        }
    }

    /// Returns whether one of the calls went through.
    #[must_use]
    pub fn is_partially_applied(&self) -> bool {
        self.revoke.is_succeeded() || self.grant.is_succeeded()
    }
}

/// Tri-state result of a profile submit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// The selection matched the current profiles; nothing was sent.
    NoChanges,
    /// Every required call succeeded.
    Applied(AppliedChanges),
    /// At least one call failed or the submit was rejected locally.
    Failed(SubmitFailure),
}

impl SubmitOutcome {
    /// Combines the revoke and grant outcomes.
    #[must_use]
    pub fn from_calls(revoke: CallOutcome, grant: CallOutcome) -> Self {
        let reason = revoke.error().or_else(|| grant.error()).cloned();

        match reason {
            Some(reason) => Self::Failed(SubmitFailure {
                reason,
                revoke,
                grant,
            }),
            None => Self::Applied(AppliedChanges {
                revoked: revoke.confirmed_ids().cloned().unwrap_or_default(),
                granted: grant.confirmed_ids().cloned().unwrap_or_default(),
                reported: grant.reported_state().or_else(|| revoke.reported_state()),
            }),
        }
    }

    /// Returns whether the backend state changed at all.
    #[must_use]
    pub fn changed_backend(&self) -> bool {
        match self {
            Self::NoChanges => false,
            Self::Applied(_) => true,
            Self::Failed(failure) => failure.is_partially_applied(),
        }
    }

    /// Profiles the user holds after this outcome, from confirmed calls only.
    ///
    /// The set reported by the last successful call wins; without one the
    /// confirmed changes are applied to `original`.
    #[must_use]
    pub fn confirmed_state(&self, original: &BTreeSet<ProfileId>) -> BTreeSet<ProfileId> {
        let (reported, revoked, granted) = match self {
            Self::NoChanges => return original.clone(),
            Self::Applied(changes) => (
                changes.reported.clone(),
                Some(&changes.revoked),
                Some(&changes.granted),
            ),
            Self::Failed(failure) => (
                failure
                    .grant
                    .reported_state()
                    .or_else(|| failure.revoke.reported_state()),
                failure.revoke.confirmed_ids(),
                failure.grant.confirmed_ids(),
            ),
        };

        if let Some(reported) = reported {
            return reported;
        }

        let mut state = original.clone();
        if let Some(revoked) = revoked {
            state.retain(|profile_id| !revoked.contains(profile_id));
        }
        if let Some(granted) = granted {
            state.extend(granted.iter().copied());
        }
        state
    }

    /// Returns the notification text for the operator.
    #[must_use]
    pub fn operator_message(&self) -> String {
        match self {
            Self::NoChanges => "No profile changes to save.".to_owned(),
            Self::Applied(_) => "User profiles updated.".to_owned(),
            Self::Failed(failure) if failure.is_partially_applied() => {
                format!("User profiles partially updated: {}", failure.reason)
            }
            Self::Failed(failure) => format!("User profiles not updated: {}", failure.reason),
        }
    }
}
