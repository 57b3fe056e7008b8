use std::path::PathBuf;
use std::time::Duration;

use crate::models::error::MonitorError;

/// Everything a backend needs to record one device into one file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptureParams {
    /// Bus identifier, used in error reports.
    pub bus_id: String,
    pub device_path: PathBuf,
    pub output_path: PathBuf,
    pub width: u32,
    pub framerate: u32,
}

/// Interface for an external capture process launcher.
///
/// Implemented by:
/// - `GstLaunchBackend` (Linux, `gst-launch-1.0`)
///
/// Supervisors, the registry and the scheduler only talk to this trait, so a
/// different media tool can be swapped in without touching them.
pub trait CaptureBackend: Send + Sync {
    /// A running capture process. Consumed by `stop`, so a stopped handle can
    /// never be reused.
    type Handle: Send;

    /// Short name used in logs.
    fn name(&self) -> &str;

    /// Extension (without dot) of the container files this backend writes.
    fn file_extension(&self) -> &str;

    /// Launch a capture process writing `params.output_path`.
    ///
    /// Returns `LaunchFailed` if the process cannot be spawned or dies during
    /// startup.
    fn start(&self, params: &CaptureParams) -> Result<Self::Handle, MonitorError>;

    /// Ask the process to finish its file, wait up to `grace`, then kill it.
    ///
    /// When this returns, whether `Ok` or `Err`, the process is no longer alive.
    fn stop(&self, handle: Self::Handle, grace: Duration) -> Result<(), MonitorError>;

    /// Non-blocking liveness check. `Some(status)` once the process has exited.
    fn exit_status(&self, handle: &mut Self::Handle) -> Option<String>;
}
