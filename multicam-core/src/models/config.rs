use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::error::MonitorError;

/// Recording configuration, loaded once at startup.
///
/// The four recording fields are required; a file missing any of them is a
/// fatal startup error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonitorConfiguration {
    /// Length of each RECORDING phase.
    pub recording_length_seconds: u64,

    /// Length of each IDLE phase between recordings.
    #[serde(alias = "idle_duration_seconds")]
    pub recording_interval_seconds: u64,

    /// Capture width in pixels, passed to the capture backend.
    pub resolution_width: u32,

    /// Capture framerate in frames per second.
    pub framerate: u32,

    /// Free space (MB) below which the monitor shuts down (default: 1000).
    #[serde(default = "default_disk_threshold_mb")]
    pub disk_threshold_mb: u64,

    /// How long a capture process gets to finalize its file after the stop
    /// signal before it is killed (default: 5).
    #[serde(default = "default_stop_grace_period_seconds")]
    pub stop_grace_period_seconds: u64,
}

fn default_disk_threshold_mb() -> u64 {
    1000
}

fn default_stop_grace_period_seconds() -> u64 {
    5
}

impl MonitorConfiguration {
    /// Read and validate a JSON configuration file.
    pub fn load(path: &Path) -> Result<Self, MonitorError> {
        let json = fs::read_to_string(path).map_err(|e| {
            MonitorError::ConfigurationFailed(format!("failed to read {}: {}", path.display(), e))
        })?;
        Self::from_json(&json)
            .map_err(|e| MonitorError::ConfigurationFailed(format!("{}: {}", path.display(), e)))
    }

    pub fn from_json(json: &str) -> Result<Self, String> {
        let config: Self = serde_json::from_str(json).map_err(|e| e.to_string())?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.recording_length_seconds == 0 {
            return Err("recording_length_seconds must be positive".into());
        }
        if self.recording_interval_seconds == 0 {
            return Err("recording_interval_seconds must be positive".into());
        }
        if self.resolution_width == 0 {
            return Err("resolution_width must be positive".into());
        }
        if self.framerate == 0 {
            return Err("framerate must be positive".into());
        }
        Ok(())
    }

    pub fn recording_duration(&self) -> Duration {
        Duration::from_secs(self.recording_length_seconds)
    }

    pub fn idle_duration(&self) -> Duration {
        Duration::from_secs(self.recording_interval_seconds)
    }

    pub fn stop_grace_period(&self) -> Duration {
        Duration::from_secs(self.stop_grace_period_seconds)
    }
}

impl Default for MonitorConfiguration {
    fn default() -> Self {
        Self {
            recording_length_seconds: 30,
            recording_interval_seconds: 60,
            resolution_width: 1920,
            framerate: 30,
            disk_threshold_mb: default_disk_threshold_mb(),
            stop_grace_period_seconds: default_stop_grace_period_seconds(),
        }
    }
}
