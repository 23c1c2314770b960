//! Infrastructure adapters for application ports.

#![forbid(unsafe_code)]

mod http_profile_directory;
mod in_memory_profile_directory;
mod logging_list_refresher;

pub use http_profile_directory::HttpProfileDirectory;
pub use in_memory_profile_directory::InMemoryProfileDirectory;
pub use logging_list_refresher::LoggingListRefresher;
