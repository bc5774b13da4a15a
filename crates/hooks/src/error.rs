//! Hook error types.

use std::time::Duration;

/// Errors raised while building or running hooks.
///
/// Only [`HookError::NoSpawnCommand`] and [`HookError::InvalidTemplate`] are
/// returned to callers, from [`HookDispatcher::new`](crate::HookDispatcher::new).
/// The rest are logged by the dispatcher.
#[derive(Debug, thiserror::Error)]
pub enum HookError {
    #[error("no spawn command configured: {event}")]
    NoSpawnCommand { event: &'static str },

    #[error("failed to parse template {template}: {reason}")]
    InvalidTemplate { template: String, reason: String },

    #[error("failed to render template {template}: {reason}")]
    Render { template: String, reason: String },

    #[error("failed to run hook command {command}: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("hook command {command} timed out after {timeout:?}")]
    Timeout {
        command: String,
        timeout: Duration,
        output: String,
    },
}
