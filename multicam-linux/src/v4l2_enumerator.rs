//! V4L2 device enumeration via `v4l2-ctl --list-devices`.
//!
//! The listing groups device nodes under a header carrying the card name and
//! the bus info, which is stable per physical port:
//!
//! ```text
//! HD Pro Webcam C920 (usb-0000:00:14.0-1):
//!         /dev/video0
//!         /dev/video1
//!         /dev/media0
//! ```

use std::path::PathBuf;
use std::process::{Command, Stdio};

use multicam_core::models::device::DeviceInfo;
use multicam_core::models::error::MonitorError;
use multicam_core::traits::device_enumerator::DeviceEnumerator;

/// Printed by `v4l2-ctl` when there is no video device at all.
const NO_DEVICE_MARKER: &str = "Cannot open device";

/// Device enumerator backed by the `v4l2-ctl` utility (v4l-utils).
#[derive(Debug, Clone)]
pub struct V4l2CtlEnumerator {
    program: PathBuf,
    bus_prefix: Option<String>,
}

impl V4l2CtlEnumerator {
    pub fn new() -> Self {
        Self {
            program: PathBuf::from("v4l2-ctl"),
            bus_prefix: None,
        }
    }

    /// Only report devices whose bus info starts with `prefix` (e.g. `usb-`).
    pub fn with_bus_prefix(mut self, prefix: impl Into<String>) -> Self {
        let prefix = prefix.into();
        self.bus_prefix = if prefix.is_empty() { None } else { Some(prefix) };
        self
    }

    pub fn with_program(mut self, program: impl Into<PathBuf>) -> Self {
        self.program = program.into();
        self
    }
}

impl Default for V4l2CtlEnumerator {
    fn default() -> Self {
        Self::new()
    }
}

impl DeviceEnumerator for V4l2CtlEnumerator {
    fn enumerate(&self) -> Result<Vec<DeviceInfo>, MonitorError> {
        let output = Command::new(&self.program)
            .arg("--list-devices")
            .stdin(Stdio::null())
            .output()
            .map_err(|e| {
                MonitorError::EnumerationFailed(format!(
                    "failed to run {}: {}",
                    self.program.display(),
                    e
                ))
            })?;

        let stdout = String::from_utf8_lossy(&output.stdout);
        if !output.status.success() && stdout.trim().is_empty() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            if stderr.contains(NO_DEVICE_MARKER) {
                return Ok(Vec::new());
            }
            return Err(MonitorError::EnumerationFailed(format!(
                "{} --list-devices failed ({}): {}",
                self.program.display(),
                output.status,
                stderr.trim()
            )));
        }

        Ok(parse_list_devices(&stdout, self.bus_prefix.as_deref()))
    }
}

/// Parse `v4l2-ctl --list-devices` output.
///
/// Only `/dev/video*` nodes are kept; groups without one are dropped. The bus
/// info is the last parenthesised part of the header.
pub fn parse_list_devices(output: &str, bus_prefix: Option<&str>) -> Vec<DeviceInfo> {
    let mut devices = Vec::new();
    let mut current: Option<(String, String, Vec<PathBuf>)> = None;

    let mut flush = |entry: Option<(String, String, Vec<PathBuf>)>| {
        let Some((name, bus_id, paths)) = entry else {
            return;
        };
        if paths.is_empty() {
            return;
        }
        if let Some(prefix) = bus_prefix {
            if !bus_id.starts_with(prefix) {
                return;
            }
        }
        match DeviceInfo::new(bus_id, paths, name) {
            Ok(device) => devices.push(device),
            Err(e) => log::warn!("Ignoring device: {}", e),
        }
    };

    for line in output.lines() {
        if line.trim().is_empty() {
            continue;
        }
        if line.starts_with(char::is_whitespace) {
            let node = line.trim();
            if let Some((_, _, paths)) = current.as_mut() {
                if node.starts_with("/dev/video") {
                    paths.push(PathBuf::from(node));
                }
            }
            continue;
        }
        flush(current.take());
        let (name, bus_id) = parse_header(line);
        current = Some((name, bus_id, Vec::new()));
    }
    flush(current.take());

    devices
}

fn parse_header(line: &str) -> (String, String) {
    let header = line.trim().trim_end_matches(':').trim_end();
    if let Some(inner) = header.strip_suffix(')') {
        if let Some(open) = inner.rfind('(') {
            let name = inner[..open].trim().to_string();
            let bus_id = inner[open + 1..].trim().to_string();
            return (name, bus_id);
        }
    }
    (header.to_string(), header.to_string())
}
