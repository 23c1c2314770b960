//! Application services and ports.

#![forbid(unsafe_code)]

mod profile_assignment_ports;
mod profile_assignment_service;

pub use profile_assignment_ports::{
    AssignmentConfirmation, AssignmentOperation, ProfileAssignmentRequest, ProfileDirectory,
    ProfileListRefresher,
};
pub use profile_assignment_service::{
    AppliedChanges, CallOutcome, GENERIC_FAILURE_MESSAGE, ProfileAssignmentError,
    ProfileAssignmentService, ProfileEditingSession, SessionHandle, SubmitFailure, SubmitOutcome,
};
