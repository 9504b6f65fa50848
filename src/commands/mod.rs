pub mod analyze;
pub mod ask;
pub mod sessions;

// Re-export command functions for convenience
pub use analyze::{analyze, physics};
pub use ask::{ask, concept, neighbors, path};
pub use sessions::{delete_session, list_sessions, rename_session, show_session};
