use std::fs;
use std::path::{Path, PathBuf};

use crate::models::error::MonitorError;
use crate::models::session::SessionManifest;

/// File name of the manifest inside a session directory.
pub const MANIFEST_FILE_NAME: &str = "session.json";

pub fn manifest_path(session_dir: &Path) -> PathBuf {
    session_dir.join(MANIFEST_FILE_NAME)
}

/// Write the session manifest as a JSON sidecar in `session_dir`.
pub fn write_manifest(manifest: &SessionManifest, session_dir: &Path) -> Result<(), MonitorError> {
    let json = serde_json::to_string_pretty(manifest)
        .map_err(|e| MonitorError::StorageError(format!("failed to serialize manifest: {}", e)))?;
    fs::write(manifest_path(session_dir), json)
        .map_err(|e| MonitorError::StorageError(format!("failed to write manifest: {}", e)))?;
    Ok(())
}

/// Read a session manifest back from `session_dir`.
pub fn read_manifest(session_dir: &Path) -> Result<SessionManifest, MonitorError> {
    let json = fs::read_to_string(manifest_path(session_dir))
        .map_err(|e| MonitorError::StorageError(format!("failed to read manifest: {}", e)))?;
    let manifest: SessionManifest = serde_json::from_str(&json)
        .map_err(|e| MonitorError::StorageError(format!("failed to parse manifest: {}", e)))?;
    Ok(manifest)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::device::DeviceInfo;
    use crate::models::session::RecordingSession;
    use chrono::NaiveDate;

    #[test]
    fn manifest_lists_each_output_file_once() {
        let dir = std::env::temp_dir().join(format!("multicam_manifest_{}", uuid::Uuid::new_v4()));
        fs::create_dir_all(&dir).unwrap();

        let start = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap().and_hms_opt(3, 4, 5).unwrap();
        let end = start + chrono::Duration::seconds(30);
        let cam = DeviceInfo::new("usb-1", vec!["/dev/video0".into()], "C920").unwrap();

        let mut session = RecordingSession::new(dir.clone(), start);
        session.record_stream(&cam, &dir.join("usb-1.avi"));
        session.record_stream(&cam, &dir.join("usb-1.avi"));
        session.record_stream(&cam, &dir.join("usb-1_1.avi"));

        write_manifest(&session.manifest(end), &dir).unwrap();
        let manifest = read_manifest(&dir).unwrap();

        assert_eq!(manifest.streams.len(), 2);
        assert!(manifest.streams.iter().all(|s| s.bus_id == "usb-1"));
        assert_eq!(manifest.streams[1].output_file, dir.join("usb-1_1.avi"));
        assert_eq!(manifest.started_at, start);
        assert_eq!(manifest.ended_at, end);

        let raw = fs::read_to_string(manifest_path(&dir)).unwrap();
        assert!(raw.contains("\"started_at\": \"2024-01-02T03:04:05\""));
        assert!(raw.contains("\"ended_at\": \"2024-01-02T03:04:35\""));

        let _ = fs::remove_dir_all(&dir);
    }
}
