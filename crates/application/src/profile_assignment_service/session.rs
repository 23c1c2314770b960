use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use fiscalia_core::{AppError, AppResult, OperatorSession};
use fiscalia_domain::{
    AssignmentNotes, ProfileCatalog, ProfileId, ProfileSelection, ReconciliationDelta, UserId,
    UserProfileSnapshot, reconcile,
};
use tracing::{debug, info};
use uuid::Uuid;

use super::{ProfileAssignmentError, ProfileAssignmentService, SubmitFailure, SubmitOutcome};

/// Shared liveness flag of an editing session.
///
/// The UI keeps a clone and closes it when the dialog goes away; results that
/// arrive afterwards are not applied.
#[derive(Debug, Clone)]
pub struct SessionHandle {
    session_id: Uuid,
    open: Arc<AtomicBool>,
}

impl SessionHandle {
    fn new() -> Self {
        Self {
            session_id: Uuid::new_v4(),
            open: Arc::new(AtomicBool::new(true)),
        }
    }

    /// Returns the session identifier used in logs.
    #[must_use]
    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    /// Returns whether the session is still the one on screen.
    #[must_use]
    pub fn is_current(&self) -> bool {
        self.open.load(Ordering::Acquire)
    }

    /// Marks the session as gone.
    pub fn close(&self) {
        self.open.store(false, Ordering::Release);
    }
}

/// Profile editing state for one user, owned by a single dialog.
#[derive(Debug)]
pub struct ProfileEditingSession {
    handle: SessionHandle,
    operator: OperatorSession,
    catalog: ProfileCatalog,
    catalog_error: Option<ProfileAssignmentError>,
    snapshot: UserProfileSnapshot,
    selection: ProfileSelection,
}

impl ProfileEditingSession {
    pub(super) fn new(
        operator: OperatorSession,
        catalog: ProfileCatalog,
        catalog_error: Option<ProfileAssignmentError>,
        snapshot: UserProfileSnapshot,
    ) -> Self {
        let selection = ProfileSelection::seeded_from(&snapshot);

        Self {
            handle: SessionHandle::new(),
            operator,
            catalog,
            catalog_error,
            snapshot,
            selection,
        }
    }

    /// Returns a handle the UI uses to close the session.
    #[must_use]
    pub fn handle(&self) -> SessionHandle {
        self.handle.clone()
    }

    /// Returns the operator that opened the session.
    #[must_use]
    pub fn operator(&self) -> &OperatorSession {
        &self.operator
    }

    /// Returns the user being edited.
    #[must_use]
    pub fn user_id(&self) -> UserId {
        self.snapshot.user_id()
    }

    /// Returns the selectable profiles.
    #[must_use]
    pub fn catalog(&self) -> &ProfileCatalog {
        &self.catalog
    }

    /// Returns why the catalog is empty, when loading it failed.
    #[must_use]
    pub fn catalog_error(&self) -> Option<&ProfileAssignmentError> {
        self.catalog_error.as_ref()
    }

    /// Returns the last confirmed profiles of the user.
    #[must_use]
    pub fn snapshot(&self) -> &UserProfileSnapshot {
        &self.snapshot
    }

    /// Returns the live selection.
    #[must_use]
    pub fn selection(&self) -> &ProfileSelection {
        &self.selection
    }

    /// Toggles a profile and returns whether it is now selected.
    ///
    /// Only active catalog entries can be added; anything selected can be dropped.
    pub fn toggle_profile(&mut self, profile_id: ProfileId) -> AppResult<bool> {
        if !self.selection.contains(profile_id) && !self.catalog.contains(profile_id) {
            return Err(AppError::Validation(format!(
                "profile '{profile_id}' is not an active profile"
            )));
        }

        Ok(self.selection.toggle(profile_id))
    }

    /// Drops a profile from the selection; returns `false` when it was not selected.
    pub fn remove_profile(&mut self, profile_id: ProfileId) -> bool {
        self.selection.remove(profile_id)
    }

    /// Returns the calls a submit would issue right now.
    #[must_use]
    pub fn pending_delta(&self) -> ReconciliationDelta {
        reconcile(self.snapshot.profile_ids(), self.selection.ids())
    }

    /// Submits the selection.
    ///
    /// Backend calls always run to completion. Their result updates this
    /// session and triggers a list refresh only while the handle is current.
    /// A fully applied submit closes the session.
    pub async fn submit(
        &mut self,
        service: &ProfileAssignmentService,
        notes: &AssignmentNotes,
    ) -> SubmitOutcome {
        if !self.handle.is_current() {
            return SubmitOutcome::Failed(SubmitFailure::rejected(
                ProfileAssignmentError::SessionClosed,
            ));
        }

        let user_id = self.user_id();
        let original = self.snapshot.profile_ids().clone();
        let outcome = service
            .submit(&self.operator, user_id, &original, &self.selection, notes)
            .await;

        if !self.handle.is_current() {
            debug!(
                operator = %self.operator.subject(),
                user_id = %user_id,
                session_id = %self.handle.session_id(),
                "profile editing session closed during submit, result not applied"
            );
            return outcome;
        }

        if outcome.changed_backend() {
            self.snapshot = UserProfileSnapshot::new(user_id, outcome.confirmed_state(&original));
            service.request_refresh(&self.operator, user_id).await;
        }

        if matches!(outcome, SubmitOutcome::Applied(_)) {
            self.handle.close();
            info!(
                operator = %self.operator.subject(),
                user_id = %user_id,
                session_id = %self.handle.session_id(),
                "closed profile editing session after applied submit"
            );
        }

        outcome
    }
}
