//! Command hooks run for newly delivered entries.
//!
//! This crate provides:
//! - Minijinja rendering of per-argument templates against an entry context
//! - Spawning of external commands with a bounded timeout and captured output
//! - `HookDispatcher`, which validates hook configuration up front and runs
//!   every configured hook independently so one failing hook never blocks
//!   the others

pub mod dispatcher;
pub mod error;
pub mod spawn;
pub mod templating;

pub use dispatcher::HookDispatcher;
pub use error::HookError;
