use std::sync::Arc;

use fiscalia_core::OperatorSession;
use fiscalia_domain::UserId;
use tracing::{debug, warn};

use crate::profile_assignment_ports::{ProfileDirectory, ProfileListRefresher};

mod errors;
mod loading;
mod outcome;
mod session;
mod submission;


pub use errors::{GENERIC_FAILURE_MESSAGE, ProfileAssignmentError};
pub use outcome::{AppliedChanges, CallOutcome, SubmitFailure, SubmitOutcome};
pub use session::{ProfileEditingSession, SessionHandle};

/// Application service for editing the profiles granted to a user.
#[derive(Clone)]
pub struct ProfileAssignmentService {
    directory: Arc<dyn ProfileDirectory>,
    refresher: Arc<dyn ProfileListRefresher>,
}

impl ProfileAssignmentService {
    /// Creates a new service from required dependencies.
    #[must_use]
    pub fn new(
        directory: Arc<dyn ProfileDirectory>,
        refresher: Arc<dyn ProfileListRefresher>,
    ) -> Self {
        Self {
            directory,
            refresher,
        }
    }

    async fn request_refresh(&self, operator: &OperatorSession, user_id: UserId) {
        match self.refresher.request_refresh(user_id).await {
            Ok(()) => debug!(
                operator = %operator.subject(),
                user_id = %user_id,
                "requested profile list refresh"
            ),
            Err(error) => warn!(
                operator = %operator.subject(),
                user_id = %user_id,
                error = %error,
                "failed to request profile list refresh"
            ),
        }
    }
}
