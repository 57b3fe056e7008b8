use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use chrono::{Duration, NaiveDateTime, Timelike};

use crate::models::error::MonitorError;
use crate::models::session::SESSION_NAME_FORMAT;

/// Upper bound on how far a session name is pushed forward to find a free slot.
const MAX_NAME_ATTEMPTS: u32 = 3600;

/// Format a session directory name (`YYYY_MM_DD___HH_MM_SS`).
pub fn session_name(timestamp: NaiveDateTime) -> String {
    timestamp.format(SESSION_NAME_FORMAT).to_string()
}

/// Create `directory` (and parents) if missing. Returns whether it was created.
pub fn ensure_directory(directory: &Path) -> Result<bool, MonitorError> {
    if directory.is_dir() {
        log::info!("Video directory already exists: {}", directory.display());
        return Ok(false);
    }
    fs::create_dir_all(directory).map_err(|e| {
        MonitorError::StorageError(format!("failed to create {}: {}", directory.display(), e))
    })?;
    log::info!("Created video directory: {}", directory.display());
    Ok(true)
}

/// Allocates one fresh directory per RECORDING phase under a root.
///
/// Names are strictly increasing and never reused: if the wall clock has not
/// moved past the previous session's second (or went backwards), or the
/// directory already exists, the timestamp is advanced one second at a time.
#[derive(Debug, Clone)]
pub struct SessionDirectories {
    root: PathBuf,
    last: Option<NaiveDateTime>,
}

impl SessionDirectories {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            last: None,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Create the next session directory. Returns its path and the timestamp
    /// its name encodes.
    pub fn create_next(&mut self, now: NaiveDateTime) -> Result<(PathBuf, NaiveDateTime), MonitorError> {
        fs::create_dir_all(&self.root).map_err(|e| {
            MonitorError::StorageError(format!("failed to create {}: {}", self.root.display(), e))
        })?;

        let mut candidate = now.with_nanosecond(0).unwrap_or(now);
        if let Some(last) = self.last {
            if candidate <= last {
                candidate = last + Duration::seconds(1);
            }
        }

        for _ in 0..MAX_NAME_ATTEMPTS {
            let directory = self.root.join(session_name(candidate));
            match fs::create_dir(&directory) {
                Ok(()) => {
                    log::info!("Created session directory: {}", directory.display());
                    self.last = Some(candidate);
                    return Ok((directory, candidate));
                }
                Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                    candidate += Duration::seconds(1);
                }
                Err(e) => {
                    return Err(MonitorError::StorageError(format!(
                        "failed to create {}: {}",
                        directory.display(),
                        e
                    )));
                }
            }
        }

        Err(MonitorError::StorageError(format!(
            "no free session directory name under {}",
            self.root.display()
        )))
    }
}
