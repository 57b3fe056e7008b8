use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use uuid::Uuid;

use crate::models::device::DeviceInfo;
use crate::models::error::MonitorError;
use crate::models::state::{StreamHealth, StreamState};
use crate::traits::capture_backend::{CaptureBackend, CaptureParams};

/// Output format shared by every stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamSettings {
    pub width: u32,
    pub framerate: u32,
    /// Time a capture process gets to finalize its file before it is killed.
    pub stop_grace: Duration,
}

/// Owns the capture process for one device.
///
/// At most one process exists per supervisor. `start` on a running supervisor
/// stops the old process first, and dropping a supervisor stops its process,
/// so a handle can never leak.
///
/// ```text
/// [DeviceInfo] + [StreamSettings] ─start(dir)─▶ [CaptureBackend] ─▶ dir/<bus_id>.<ext>
/// ```
pub struct StreamSupervisor<B: CaptureBackend> {
    id: Uuid,
    device: DeviceInfo,
    settings: StreamSettings,
    backend: Arc<B>,
    state: StreamState,
    handle: Option<B::Handle>,
    output_path: Option<PathBuf>,
}

impl<B: CaptureBackend> StreamSupervisor<B> {
    pub fn new(device: DeviceInfo, settings: StreamSettings, backend: Arc<B>) -> Self {
        Self {
            id: Uuid::new_v4(),
            device,
            settings,
            backend,
            state: StreamState::Idle,
            handle: None,
            output_path: None,
        }
    }

    /// Unique per supervisor instance, even for a re-attached bus id.
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn device(&self) -> &DeviceInfo {
        &self.device
    }

    pub fn bus_id(&self) -> &str {
        self.device.bus_id()
    }

    pub fn state(&self) -> StreamState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.state.is_running()
    }

    /// File the current (or most recent) process writes.
    pub fn output_path(&self) -> Option<&Path> {
        self.output_path.as_deref()
    }

    /// Where this device's next recording lands inside `output_directory`.
    ///
    /// `<stem>.<ext>` if free, else the first free `<stem>_<n>.<ext>`, so a
    /// restart or re-attach within one session never truncates earlier footage.
    pub fn output_path_in(&self, output_directory: &Path) -> PathBuf {
        let stem = self.device.file_stem();
        let extension = self.backend.file_extension();
        let first = output_directory.join(format!("{}.{}", stem, extension));
        if !first.exists() {
            return first;
        }
        let mut n = 1u32;
        loop {
            let candidate = output_directory.join(format!("{}_{}.{}", stem, n, extension));
            if !candidate.exists() {
                return candidate;
            }
            n += 1;
        }
    }

    /// Launch a capture process writing into `output_directory`.
    ///
    /// A running process is stopped first. On launch failure the supervisor
    /// stays IDLE and the error is returned; there is no retry here.
    pub fn start(&mut self, output_directory: &Path) -> Result<PathBuf, MonitorError> {
        if self.is_running() {
            if let Err(e) = self.stop() {
                log::error!("Restart of {}: {}", self.bus_id(), e);
            }
        }

        let output_path = self.output_path_in(output_directory);
        let params = CaptureParams {
            bus_id: self.device.bus_id().to_string(),
            device_path: self.device.capture_path().to_path_buf(),
            output_path: output_path.clone(),
            width: self.settings.width,
            framerate: self.settings.framerate,
        };

        let handle = self.backend.start(&params)?;
        log::info!(
            "Recording {} ({}) via {} -> {}",
            self.bus_id(),
            self.device.capture_path().display(),
            self.backend.name(),
            output_path.display()
        );

        self.handle = Some(handle);
        self.output_path = Some(output_path.clone());
        self.state = StreamState::Running;
        Ok(output_path)
    }

    /// Stop the capture process, if any. No-op when IDLE.
    ///
    /// The supervisor is IDLE afterwards even if the backend reports an error.
    pub fn stop(&mut self) -> Result<(), MonitorError> {
        self.state = StreamState::Idle;
        let Some(handle) = self.handle.take() else {
            return Ok(());
        };
        log::info!("Stop recording: {}", self.bus_id());
        self.backend.stop(handle, self.settings.stop_grace)
    }

    /// Poll the capture process. A process that exited on its own is reaped
    /// and the supervisor drops back to IDLE.
    pub fn poll_health(&mut self) -> StreamHealth {
        let Some(handle) = self.handle.as_mut() else {
            return StreamHealth::Idle;
        };
        match self.backend.exit_status(handle) {
            None => StreamHealth::Running,
            Some(status) => {
                log::error!(
                    "Capture process for {} exited unexpectedly ({})",
                    self.device.bus_id(),
                    status
                );
                self.state = StreamState::Idle;
                if let Some(handle) = self.handle.take() {
                    // Already exited; this only reaps it.
                    if let Err(e) = self.backend.stop(handle, Duration::ZERO) {
                        log::warn!("Reaping {}: {}", self.device.bus_id(), e);
                    }
                }
                StreamHealth::Exited(status)
            }
        }
    }
}

impl<B: CaptureBackend> Drop for StreamSupervisor<B> {
    fn drop(&mut self) {
        if let Err(e) = self.stop() {
            log::error!("{}", e);
        }
    }
}
