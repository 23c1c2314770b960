mod directory;
mod requests;

pub use directory::{ProfileDirectory, ProfileListRefresher};
pub use requests::{AssignmentConfirmation, AssignmentOperation, ProfileAssignmentRequest};
