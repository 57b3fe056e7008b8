use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use super::device::DeviceInfo;

/// Timestamp format shared by session directory names and manifests.
pub const SESSION_NAME_FORMAT: &str = "%Y_%m_%d___%H_%M_%S";

/// One RECORDING phase: a directory plus the streams started into it.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordingSession {
    pub name: String,
    pub directory: PathBuf,
    pub started_at: NaiveDateTime,
    pub streams: Vec<SessionStream>,
}

impl RecordingSession {
    pub fn new(directory: PathBuf, started_at: NaiveDateTime) -> Self {
        let name = directory
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        Self {
            name,
            directory,
            started_at,
            streams: Vec::new(),
        }
    }

    /// Remember a stream that started writing into this session.
    ///
    /// A device restarted within the session gets one entry per output file.
    pub fn record_stream(&mut self, device: &DeviceInfo, output_file: &Path) {
        if self.streams.iter().any(|s| s.output_file == output_file) {
            return;
        }
        self.streams.push(SessionStream {
            bus_id: device.bus_id().to_string(),
            device_name: device.name().to_string(),
            capture_path: device.capture_path().to_path_buf(),
            output_file: output_file.to_path_buf(),
        });
    }

    /// Snapshot of this session for the `session.json` sidecar.
    pub fn manifest(&self, ended_at: NaiveDateTime) -> SessionManifest {
        SessionManifest {
            name: self.name.clone(),
            started_at: self.started_at,
            ended_at,
            streams: self.streams.clone(),
        }
    }
}

/// A stream that recorded into a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionStream {
    pub bus_id: String,
    pub device_name: String,
    pub capture_path: PathBuf,
    pub output_file: PathBuf,
}

/// Serializable summary written next to the recordings when a session closes.
///
/// Timestamps are local wall-clock time, serialized as ISO 8601 without offset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionManifest {
    pub name: String,
    pub started_at: NaiveDateTime,
    pub ended_at: NaiveDateTime,
    pub streams: Vec<SessionStream>,
}
