use std::collections::BTreeSet;

use fiscalia_domain::{AssignmentNotes, ProfileId, UserId};

/// Direction of a profile assignment call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AssignmentOperation {
    /// Adds profiles to the user.
    Grant,
    /// Removes profiles from the user.
    Revoke,
}

impl AssignmentOperation {
    /// Returns a stable label for logs and audit notes.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Grant => "grant",
            Self::Revoke => "revoke",
        }
    }
}

/// Payload of a grant or revoke call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileAssignmentRequest {
    /// Profiles to grant or revoke.
    pub profile_ids: BTreeSet<ProfileId>,
    /// Optional audit justification.
    pub notes: AssignmentNotes,
}

/// Backend acknowledgement of an assignment change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssignmentConfirmation {
    /// User whose assignment changed.
    pub user_id: UserId,
    /// Profiles the user holds after the change, when reported.
    pub profile_ids: Option<Vec<ProfileId>>,
    /// Optional backend message.
    pub message: Option<String>,
}
