use std::collections::BTreeSet;

use crate::ProfileId;

/// Grants and revocations needed to move a user from one profile set to another.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconciliationDelta {
    /// Held originally, no longer desired.
    pub to_revoke: BTreeSet<ProfileId>,
    /// Desired, not held originally.
    pub to_grant: BTreeSet<ProfileId>,
}

impl ReconciliationDelta {
    /// Returns whether no backend call is needed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.to_revoke.is_empty() && self.to_grant.is_empty()
    }
}

/// Computes `original − desired` as revocations and `desired − original` as grants.
#[must_use]
pub fn reconcile(
    original: &BTreeSet<ProfileId>,
    desired: &BTreeSet<ProfileId>,
) -> ReconciliationDelta {
    ReconciliationDelta {
        to_revoke: original.difference(desired).copied().collect(),
        to_grant: desired.difference(original).copied().collect(),
    }
}
