//! Domain entities and invariants.

#![forbid(unsafe_code)]

mod profile;
mod reconciliation;
mod selection;
mod user;

pub use profile::{Profile, ProfileCatalog, ProfileId};
pub use reconciliation::{ReconciliationDelta, reconcile};
pub use selection::{ASSIGNMENT_NOTES_MAX_LENGTH, AssignmentNotes, ProfileSelection};
pub use user::{UserId, UserProfileInfo, UserProfileSnapshot};
