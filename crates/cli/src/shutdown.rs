use std::sync::Arc;

use feedsync_state::ProcessedState;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

/// Flush `state` and exit as soon as the process is asked to stop.
///
/// Exits with status 0 when the flush succeeds, 1 otherwise. The state's
/// flush runs once, so racing the normal completion path is harmless.
pub fn flush_on_signal(state: Arc<ProcessedState>) -> JoinHandle<()> {
    tokio::spawn(async move {
        os_signal().await;
        warn!("Shutdown signal received, saving state");

        match state.flush() {
            Ok(saved) => {
                info!(saved, path = %state.path().display(), "state saved");
                std::process::exit(0);
            }
            Err(e) => {
                error!(error = %e, "failed to save state");
                std::process::exit(1);
            }
        }
    })
}

/// Wait for SIGINT or SIGTERM (Unix) or Ctrl+C (cross-platform fallback).
async fn os_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        let mut sigint = signal(SignalKind::interrupt()).expect("failed to register SIGINT");
        let mut sigterm = signal(SignalKind::terminate()).expect("failed to register SIGTERM");
        tokio::select! {
            _ = sigint.recv() => {}
            _ = sigterm.recv() => {}
        }
    }

    #[cfg(not(unix))]
    {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to listen for ctrl_c");
    }
}
