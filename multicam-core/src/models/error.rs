use thiserror::Error;

/// Errors that can occur while monitoring and recording cameras.
///
/// Per-device variants (`LaunchFailed`, `StopFailed`) carry the bus identifier
/// so every failure can be logged with the device it belongs to.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MonitorError {
    #[error("configuration failed: {0}")]
    ConfigurationFailed(String),

    #[error("invalid device: {0}")]
    InvalidDevice(String),

    #[error("device enumeration failed: {0}")]
    EnumerationFailed(String),

    #[error("capture launch failed for {bus_id}: {reason}")]
    LaunchFailed { bus_id: String, reason: String },

    #[error("capture stop failed for {bus_id}: {reason}")]
    StopFailed { bus_id: String, reason: String },

    #[error("storage error: {0}")]
    StorageError(String),

    #[error("disk probe failed: {0}")]
    DiskProbeFailed(String),
}

impl MonitorError {
    /// Bus identifier of the device this error concerns, if any.
    pub fn bus_id(&self) -> Option<&str> {
        match self {
            Self::LaunchFailed { bus_id, .. } | Self::StopFailed { bus_id, .. } => Some(bus_id),
            _ => None,
        }
    }

    pub fn is_configuration(&self) -> bool {
        matches!(self, Self::ConfigurationFailed(_))
    }
}
