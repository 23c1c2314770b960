use std::collections::BTreeSet;

use fiscalia_core::OperatorSession;
use fiscalia_domain::{
    AssignmentNotes, ProfileId, ProfileSelection, ReconciliationDelta, UserId, reconcile,
};
use tracing::{debug, info, warn};

use crate::profile_assignment_ports::{AssignmentOperation, ProfileAssignmentRequest};

use super::{
    CallOutcome, ProfileAssignmentError, ProfileAssignmentService, SubmitFailure, SubmitOutcome,
};

impl ProfileAssignmentService {
    /// Validates the selection, computes the delta against `original` and applies it.
    ///
    /// An empty selection is rejected before any backend call.
    pub async fn submit(
        &self,
        operator: &OperatorSession,
        user_id: UserId,
        original: &BTreeSet<ProfileId>,
        selection: &ProfileSelection,
        notes: &AssignmentNotes,
    ) -> SubmitOutcome {
        let Ok(desired) = selection.validate() else {
            info!(
                operator = %operator.subject(),
                user_id = %user_id,
                "rejected empty profile selection"
            );
            return SubmitOutcome::Failed(SubmitFailure::rejected(
                ProfileAssignmentError::EmptySelection,
            ));
        };

        let delta = reconcile(original, desired);
        self.apply_delta(operator, user_id, &delta, notes).await
    }

    /// Applies a delta: revoke first, then grant, one call at a time.
    ///
    /// A last-profile rejection of the revoke aborts the grant. Any other
    /// revoke failure still lets the grant run and both outcomes are reported.
    pub async fn apply_delta(
        &self,
        operator: &OperatorSession,
        user_id: UserId,
        delta: &ReconciliationDelta,
        notes: &AssignmentNotes,
    ) -> SubmitOutcome {
        if delta.is_empty() {
            debug!(
                operator = %operator.subject(),
                user_id = %user_id,
                "profile selection unchanged, nothing to submit"
            );
            return SubmitOutcome::NoChanges;
        }

        let revoke = if delta.to_revoke.is_empty() {
            CallOutcome::Skipped
        } else {
            self.send_assignment(
                operator,
                user_id,
                AssignmentOperation::Revoke,
                &delta.to_revoke,
                notes,
            )
            .await
        };

        let grant = if delta.to_grant.is_empty() {
            CallOutcome::Skipped
        } else if revoke
            .error()
            .is_some_and(ProfileAssignmentError::is_last_active_profile)
        {
            warn!(
                operator = %operator.subject(),
                user_id = %user_id,
                profile_ids = ?delta.to_grant,
                "skipping profile grant after last-profile revocation rejection"
            );
            CallOutcome::NotAttempted
        } else {
            self.send_assignment(
                operator,
                user_id,
                AssignmentOperation::Grant,
                &delta.to_grant,
                notes,
            )
            .await
        };

        SubmitOutcome::from_calls(revoke, grant)
    }

    async fn send_assignment(
        &self,
        operator: &OperatorSession,
        user_id: UserId,
        operation: AssignmentOperation,
        profile_ids: &BTreeSet<ProfileId>,
        notes: &AssignmentNotes,
    ) -> CallOutcome {
        let request = ProfileAssignmentRequest {
            profile_ids: profile_ids.clone(),
            notes: notes.clone(),
        };

        let result = match operation {
            AssignmentOperation::Grant => {
                self.directory
                    .grant_profiles(operator, user_id, &request)
                    .await
            }
            AssignmentOperation::Revoke => {
                self.directory
                    .revoke_profiles(operator, user_id, &request)
                    .await
            }
        };

        match result {
            Ok(confirmation) => {
                info!(
                    operator = %operator.subject(),
                    user_id = %user_id,
                    operation = operation.as_str(),
                    profile_ids = ?request.profile_ids,
                    reported_profile_ids = ?confirmation.profile_ids,
                    "profile assignment applied"
                );
                CallOutcome::Succeeded {
                    profile_ids: request.profile_ids,
                    confirmation,
                }
            }
            Err(error) => {
                warn!(
                    operator = %operator.subject(),
                    user_id = %user_id,
                    operation = operation.as_str(),
                    profile_ids = ?request.profile_ids,
                    error = %error,
                    "profile assignment failed"
                );
                CallOutcome::Failed(ProfileAssignmentError::from_assignment(error))
            }
        }
    }
}
