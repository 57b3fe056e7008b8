//! GStreamer capture backend.
//!
//! Runs one `gst-launch-1.0 -e` process per device:
//!
//! ```text
//! v4l2src device=<path> ! image/jpeg,width=<w>,framerate=<f>/1 ! queue ! avimux ! filesink location=<out>
//! ```
//!
//! `-e` turns SIGINT into an end-of-stream, so `avimux` writes its index and
//! the file stays playable when the phase ends.

use std::path::PathBuf;
use std::process::{Child, Command, Stdio};
use std::thread;
use std::time::Duration;

use multicam_core::models::error::MonitorError;
use multicam_core::traits::capture_backend::{CaptureBackend, CaptureParams};

use crate::process::{self, Signal};

/// `gst-launch-1.0` process launcher recording MJPEG into AVI.
#[derive(Debug, Clone)]
pub struct GstLaunchBackend {
    program: PathBuf,
    startup_check: Duration,
}

/// A running `gst-launch-1.0` process.
#[derive(Debug)]
pub struct GstProcess {
    bus_id: String,
    child: Child,
}

impl GstProcess {
    pub fn pid(&self) -> u32 {
        self.child.id()
    }
}

impl GstLaunchBackend {
    pub fn new() -> Self {
        Self {
            program: PathBuf::from("gst-launch-1.0"),
            startup_check: Duration::from_millis(150),
        }
    }

    pub fn with_program(mut self, program: impl Into<PathBuf>) -> Self {
        self.program = program.into();
        self
    }

    /// How long to wait after spawning before checking the pipeline is still
    /// alive. Zero disables the check.
    pub fn with_startup_check(mut self, startup_check: Duration) -> Self {
        self.startup_check = startup_check;
        self
    }

    /// Command-line arguments for one capture, one pipeline token per argument
    /// so paths with spaces survive.
    pub fn pipeline_args(params: &CaptureParams) -> Vec<String> {
        vec![
            "-e".to_string(),
            "v4l2src".to_string(),
            format!("device={}", params.device_path.display()),
            "!".to_string(),
            format!(
                "image/jpeg,width={},framerate={}/1",
                params.width, params.framerate
            ),
            "!".to_string(),
            "queue".to_string(),
            "!".to_string(),
            "avimux".to_string(),
            "!".to_string(),
            "filesink".to_string(),
            format!("location={}", params.output_path.display()),
        ]
    }
}

impl Default for GstLaunchBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl CaptureBackend for GstLaunchBackend {
    type Handle = GstProcess;

    fn name(&self) -> &str {
        "gst-launch-1.0"
    }

    fn file_extension(&self) -> &str {
        "avi"
    }

    fn start(&self, params: &CaptureParams) -> Result<GstProcess, MonitorError> {
        let args = Self::pipeline_args(params);
        log::info!("{} {}", self.program.display(), args.join(" "));

        let launch_failed = |reason: String| MonitorError::LaunchFailed {
            bus_id: params.bus_id.clone(),
            reason,
        };

        let mut child = Command::new(&self.program)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .spawn()
            .map_err(|e| launch_failed(format!("failed to spawn {}: {}", self.program.display(), e)))?;

        if !self.startup_check.is_zero() {
            thread::sleep(self.startup_check);
            match child.try_wait() {
                Ok(Some(status)) => {
                    return Err(launch_failed(format!("exited during startup ({})", status)));
                }
                Ok(None) => {}
                Err(e) => {
                    if let Err(kill_err) = process::terminate(&mut child, Signal::Interrupt, Duration::ZERO) {
                        log::warn!("Cleaning up capture for {}: {}", params.bus_id, kill_err);
                    }
                    return Err(launch_failed(format!("cannot poll process: {}", e)));
                }
            }
        }

        let handle = GstProcess {
            bus_id: params.bus_id.clone(),
            child,
        };
        log::debug!("{} capture running as pid {}", handle.bus_id, handle.pid());
        Ok(handle)
    }

    fn stop(&self, mut handle: GstProcess, grace: Duration) -> Result<(), MonitorError> {
        let pid = handle.pid();
        let status = process::terminate(&mut handle.child, Signal::Interrupt, grace).map_err(|e| {
            MonitorError::StopFailed {
                bus_id: handle.bus_id.clone(),
                reason: e.to_string(),
            }
        })?;
        log::debug!("{} capture (pid {}) exited ({})", handle.bus_id, pid, status);
        Ok(())
    }

    fn exit_status(&self, handle: &mut GstProcess) -> Option<String> {
        match handle.child.try_wait() {
            Ok(Some(status)) => Some(status.to_string()),
            Ok(None) => None,
            Err(e) => {
                log::warn!("Cannot poll capture for {}: {}", handle.bus_id, e);
                None
            }
        }
    }
}
