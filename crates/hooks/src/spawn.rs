//! External command execution with a bounded wall-clock timeout.
//!
//! stdout and stderr are captured into one buffer in arrival order. On
//! timeout the child is killed and whatever it printed so far is kept.

use std::process::{ExitStatus, Stdio};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::Command;
use tokio::task::JoinSet;
use tokio::time::Instant;
use tracing::debug;

use crate::error::HookError;

/// Default time a hook command may run before it is killed.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Result of a command that ran to completion.
#[derive(Debug)]
pub struct CommandOutput {
    pub status: ExitStatus,
    /// Combined stdout and stderr.
    pub output: String,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.status.success()
    }
}

type Captured = Arc<Mutex<Vec<u8>>>;

/// Run `program` with `args`, killing it once `timeout` elapses.
///
/// A non-zero exit is not an error here; callers inspect
/// [`CommandOutput::status`].
pub async fn run_command(
    program: &str,
    args: &[String],
    timeout: Duration,
) -> Result<CommandOutput, HookError> {
    debug!(
        command = program,
        args = ?args,
        timeout_secs = timeout.as_secs_f64(),
        "spawning hook command"
    );

    let deadline = Instant::now() + timeout;
    let mut child = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .map_err(|source| HookError::Spawn {
            command: program.to_string(),
            source,
        })?;

    let captured: Captured = Arc::new(Mutex::new(Vec::new()));
    let mut readers = JoinSet::new();
    if let Some(stdout) = child.stdout.take() {
        readers.spawn(capture(stdout, captured.clone()));
    }
    if let Some(stderr) = child.stderr.take() {
        readers.spawn(capture(stderr, captured.clone()));
    }

    let status = match tokio::time::timeout_at(deadline, child.wait()).await {
        Ok(Ok(status)) => Some(status),
        Ok(Err(source)) => {
            return Err(HookError::Spawn {
                command: program.to_string(),
                source,
            })
        }
        Err(_) => {
            if let Err(e) = child.kill().await {
                debug!(command = program, error = %e, "failed to kill timed out hook command");
            }
            None
        }
    };

    // Pipes may outlive the child when it forked; never wait past the deadline.
    let _ = tokio::time::timeout_at(deadline, async {
        while readers.join_next().await.is_some() {}
    })
    .await;
    readers.abort_all();

    let output = {
        let bytes = captured.lock().expect("output buffer lock poisoned");
        String::from_utf8_lossy(&bytes).into_owned()
    };

    match status {
        Some(status) => Ok(CommandOutput { status, output }),
        None => Err(HookError::Timeout {
            command: program.to_string(),
            timeout,
            output,
        }),
    }
}

async fn capture<R>(mut reader: R, sink: Captured)
where
    R: AsyncRead + Unpin,
{
    let mut buf = [0u8; 4096];
    loop {
        match reader.read(&mut buf).await {
            Ok(0) | Err(_) => break,
            Ok(n) => sink
                .lock()
                .expect("output buffer lock poisoned")
                .extend_from_slice(&buf[..n]),
        }
    }
}
