use std::hash::{Hash, Hasher};
use std::path::{Path, PathBuf};

use super::error::MonitorError;

/// One physical camera as reported by a device enumerator.
///
/// Identity is the bus identifier alone: two values with the same bus id are
/// equal even if the OS handed out different `/dev/video*` paths. Paths are
/// never used to pair devices up; a changed path list under a known bus id
/// only tells that the camera was re-plugged (see `same_nodes`).
#[derive(Debug, Clone)]
pub struct DeviceInfo {
    bus_id: String,
    device_paths: Vec<PathBuf>,
    name: String,
}

impl DeviceInfo {
    /// Build a device. At least one access path is required; the first one is
    /// the capture path.
    pub fn new(
        bus_id: impl Into<String>,
        device_paths: Vec<PathBuf>,
        name: impl Into<String>,
    ) -> Result<Self, MonitorError> {
        let bus_id = bus_id.into();
        if bus_id.trim().is_empty() {
            return Err(MonitorError::InvalidDevice("empty bus identifier".into()));
        }
        if device_paths.is_empty() {
            return Err(MonitorError::InvalidDevice(format!(
                "{} has no device paths",
                bus_id
            )));
        }
        Ok(Self {
            bus_id,
            device_paths,
            name: name.into(),
        })
    }

    pub fn bus_id(&self) -> &str {
        &self.bus_id
    }

    pub fn device_paths(&self) -> &[PathBuf] {
        &self.device_paths
    }

    /// Path handed to the capture backend.
    pub fn capture_path(&self) -> &Path {
        // Non-empty by construction.
        &self.device_paths[0]
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether `other` reports the same access paths, in the same order.
    pub fn same_nodes(&self, other: &DeviceInfo) -> bool {
        self.device_paths == other.device_paths
    }

    /// File stem for this device's recording inside a session directory.
    ///
    /// Bus ids may contain `/` (e.g. some platform buses), which would escape
    /// the session directory.
    pub fn file_stem(&self) -> String {
        self.bus_id
            .chars()
            .map(|c| if c == '/' || c == '\\' || c.is_whitespace() { '_' } else { c })
            .collect()
    }
}

impl PartialEq for DeviceInfo {
    fn eq(&self, other: &Self) -> bool {
        self.bus_id == other.bus_id
    }
}

impl Eq for DeviceInfo {}

impl Hash for DeviceInfo {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.bus_id.hash(state);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn equality_ignores_paths_and_name() {
        let a = DeviceInfo::new("usb-0000:00:14.0-1", vec!["/dev/video0".into()], "C920").unwrap();
        let b = DeviceInfo::new("usb-0000:00:14.0-1", vec!["/dev/video4".into()], "Other").unwrap();
        let c = DeviceInfo::new("usb-0000:00:14.0-2", vec!["/dev/video0".into()], "C920").unwrap();

        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn requires_a_device_path() {
        let err = DeviceInfo::new("usb-1", Vec::new(), "cam").unwrap_err();
        assert!(matches!(err, MonitorError::InvalidDevice(_)));
    }

    #[test]
    fn requires_a_bus_id() {
        assert!(DeviceInfo::new("  ", vec!["/dev/video0".into()], "cam").is_err());
    }

    #[test]
    fn capture_path_is_first_path() {
        let d = DeviceInfo::new(
            "usb-1",
            vec!["/dev/video2".into(), "/dev/video3".into()],
            "cam",
        )
        .unwrap();
        assert_eq!(d.capture_path(), Path::new("/dev/video2"));
    }

    #[test]
    fn file_stem_stays_inside_directory() {
        let d = DeviceInfo::new("platform:a/b c", vec!["/dev/video0".into()], "cam").unwrap();
        assert_eq!(d.file_stem(), "platform:a_b_c");
    }
}
