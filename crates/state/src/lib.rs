//! Processed-entry tracking for feedsync.
//!
//! Two phases are kept apart on purpose:
//! - [`ProcessedState::claim`] marks an identifier as seen in memory so no
//!   fetch task hands it out twice in a run.
//! - [`ProcessedState::record`] buffers an identifier once it was delivered;
//!   [`ProcessedState::flush`] appends the buffer to the state file.
//!
//! The state file is plain text, one identifier per line, append-only.

pub mod error;
pub mod state;

pub use error::StateError;
pub use state::ProcessedState;
