use std::collections::HashSet;
use std::fs::{self, File, OpenOptions};
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, OnceLock};

use tracing::{debug, info};

use crate::error::StateError;

/// Directory under the user state dir that holds the state file.
pub const APP_DIR: &str = "feeds-to-instapaper";
/// File name of the append-only log of delivered identifiers.
pub const STATE_FILE: &str = "added";

/// Tracks which entry identifiers were already handed out or delivered.
///
/// `processed` is shared between concurrent fetch tasks; `pending` holds the
/// identifiers recorded in this run and not yet written to disk.
#[derive(Debug)]
pub struct ProcessedState {
    path: PathBuf,
    processed: Mutex<HashSet<String>>,
    pending: Mutex<Vec<String>>,
    flushed: OnceLock<Result<usize, StateError>>,
}

impl ProcessedState {
    /// Create a state with nothing processed, backed by `path`.
    pub fn empty(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            processed: Mutex::new(HashSet::new()),
            pending: Mutex::new(Vec::new()),
            flushed: OnceLock::new(),
        }
    }

    /// `$XDG_STATE_HOME/feeds-to-instapaper/added`, falling back to
    /// `~/.local/state/feeds-to-instapaper/added`.
    pub fn default_path() -> Result<PathBuf, StateError> {
        let state_dir = dirs::state_dir()
            .or_else(|| dirs::home_dir().map(|home| home.join(".local").join("state")))
            .ok_or(StateError::NoStateDir)?;
        Ok(state_dir.join(APP_DIR).join(STATE_FILE))
    }

    /// Load the state file at `path`. A missing file means nothing was
    /// delivered yet and is not an error.
    pub fn load(path: impl Into<PathBuf>) -> Result<Self, StateError> {
        let mut state = Self::empty(path);

        let file = match File::open(&state.path) {
            Ok(file) => file,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!(path = %state.path.display(), "state file not found, starting empty");
                return Ok(state);
            }
            Err(e) => return Err(StateError::read(&state.path, e)),
        };

        let processed = state
            .processed
            .get_mut()
            .expect("processed set lock poisoned");
        // Raw lines: a stray invalid byte must not make the whole file unreadable.
        for line in BufReader::new(file).split(b'\n') {
            let raw = line.map_err(|e| StateError::read(&state.path, e))?;
            let line = raw.strip_suffix(b"\r").unwrap_or(&raw);
            // Blank lines carry no identifier.
            if !line.is_empty() {
                processed.insert(String::from_utf8_lossy(line).into_owned());
            }
        }

        info!(
            path = %state.path.display(),
            entries = processed.len(),
            "loaded processed entries"
        );
        Ok(state)
    }

    /// Path of the backing state file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Atomically mark `id` as processed.
    ///
    /// Returns `true` only for the first caller to claim `id`; later calls,
    /// and calls for identifiers loaded from disk, return `false`.
    pub fn claim(&self, id: &str) -> bool {
        let mut processed = self.processed.lock().expect("processed set lock poisoned");
        if processed.contains(id) {
            return false;
        }
        processed.insert(id.to_owned())
    }

    /// Whether `id` has been claimed or loaded.
    pub fn is_processed(&self, id: &str) -> bool {
        self.processed
            .lock()
            .expect("processed set lock poisoned")
            .contains(id)
    }

    /// Queue `id` for the next flush. Call only after a successful delivery.
    pub fn record(&self, id: impl Into<String>) {
        self.pending
            .lock()
            .expect("pending buffer lock poisoned")
            .push(id.into());
    }

    /// Identifiers recorded in this run and not yet flushed, in record order.
    pub fn pending(&self) -> Vec<String> {
        self.pending
            .lock()
            .expect("pending buffer lock poisoned")
            .clone()
    }

    /// Append pending identifiers to the state file.
    ///
    /// Runs at most once per instance: the first call does the write and
    /// every call, concurrent or later, observes that same outcome. Returns
    /// the number of identifiers written.
    pub fn flush(&self) -> Result<usize, StateError> {
        self.flushed.get_or_init(|| self.write_pending()).clone()
    }

    fn write_pending(&self) -> Result<usize, StateError> {
        let mut pending = self.pending.lock().expect("pending buffer lock poisoned");
        if pending.is_empty() {
            debug!("no new entries to save");
            return Ok(0);
        }

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| StateError::create_dir(parent, e))?;
        }

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| StateError::write(&self.path, e))?;

        let mut writer = BufWriter::new(file);
        for id in pending.iter() {
            writer
                .write_all(id.as_bytes())
                .and_then(|_| writer.write_all(b"\n"))
                .map_err(|e| StateError::write(&self.path, e))?;
        }
        writer
            .flush()
            .and_then(|_| writer.get_ref().sync_all())
            .map_err(|e| StateError::write(&self.path, e))?;

        let written = pending.len();
        pending.clear();
        info!(path = %self.path.display(), written, "saved processed entries");
        Ok(written)
    }
}
