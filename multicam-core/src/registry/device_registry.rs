use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::models::device::DeviceInfo;
use crate::models::error::MonitorError;
use crate::models::state::StreamHealth;
use crate::supervisor::stream::{StreamSettings, StreamSupervisor};
use crate::traits::capture_backend::CaptureBackend;

/// Set difference between two snapshots, keyed by bus identifier.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Reconciliation {
    pub added: Vec<DeviceInfo>,
    pub removed: Vec<DeviceInfo>,
}

impl Reconciliation {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty()
    }
}

/// Compare two snapshots by bus identifier.
///
/// A bus id present in both snapshots but reporting different device paths
/// was unplugged and plugged back between the two polls; it shows up in both
/// `removed` (old value) and `added` (new value).
pub fn reconcile(previous: &[DeviceInfo], next: &[DeviceInfo]) -> Reconciliation {
    let previous_by_id = first_by_bus_id(previous);
    let next_by_id = first_by_bus_id(next);

    let mut seen = HashSet::new();
    let added = next
        .iter()
        .filter(|d| seen.insert(d.bus_id().to_string()))
        .filter(|d| match previous_by_id.get(d.bus_id()) {
            Some(old) => !old.same_nodes(d),
            None => true,
        })
        .cloned()
        .collect();

    let mut seen = HashSet::new();
    let removed = previous
        .iter()
        .filter(|d| seen.insert(d.bus_id().to_string()))
        .filter(|d| match next_by_id.get(d.bus_id()) {
            Some(new) => !d.same_nodes(new),
            None => true,
        })
        .cloned()
        .collect();

    Reconciliation { added, removed }
}

fn first_by_bus_id(devices: &[DeviceInfo]) -> HashMap<&str, &DeviceInfo> {
    let mut by_id = HashMap::new();
    for device in devices {
        by_id.entry(device.bus_id()).or_insert(device);
    }
    by_id
}

/// A stream that began writing during a registry update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StartedStream {
    pub device: DeviceInfo,
    pub output_path: PathBuf,
}

/// What one `apply` call changed.
#[derive(Debug, Default)]
pub struct RegistryUpdate {
    pub added: Vec<DeviceInfo>,
    pub removed: Vec<DeviceInfo>,
    /// Added devices started immediately because a session was active.
    pub started: Vec<StartedStream>,
    pub failures: Vec<MonitorError>,
}

/// Exclusive owner of all stream supervisors, keyed by bus identifier.
///
/// The only place supervisors are created or destroyed. A removed device's
/// supervisor is force-stopped and dropped; a device that comes back gets a
/// brand new supervisor.
pub struct DeviceRegistry<B: CaptureBackend> {
    backend: Arc<B>,
    settings: StreamSettings,
    supervisors: HashMap<String, StreamSupervisor<B>>,
    snapshot: Vec<DeviceInfo>,
}

impl<B: CaptureBackend> DeviceRegistry<B> {
    pub fn new(backend: Arc<B>, settings: StreamSettings) -> Self {
        Self {
            backend,
            settings,
            supervisors: HashMap::new(),
            snapshot: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.supervisors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.supervisors.is_empty()
    }

    pub fn contains(&self, bus_id: &str) -> bool {
        self.supervisors.contains_key(bus_id)
    }

    pub fn get(&self, bus_id: &str) -> Option<&StreamSupervisor<B>> {
        self.supervisors.get(bus_id)
    }

    /// Bus identifiers currently tracked, sorted.
    pub fn bus_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.supervisors.keys().cloned().collect();
        ids.sort();
        ids
    }

    pub fn supervisors_mut(&mut self) -> impl Iterator<Item = &mut StreamSupervisor<B>> {
        self.supervisors.values_mut()
    }

    pub fn running_count(&self) -> usize {
        self.supervisors.values().filter(|s| s.is_running()).count()
    }

    /// Reconcile against a fresh snapshot.
    ///
    /// Removals are handled first. New devices join IDLE, and are started
    /// straight away only when `active_session` is given (a RECORDING phase is
    /// in progress).
    pub fn apply(&mut self, snapshot: Vec<DeviceInfo>, active_session: Option<&Path>) -> RegistryUpdate {
        let diff = reconcile(&self.snapshot, &snapshot);
        let mut update = RegistryUpdate::default();

        for device in diff.removed {
            log::error!(
                "Device removed: {} ({}). This should not happen!",
                device.bus_id(),
                device.capture_path().display()
            );
            if let Some(mut supervisor) = self.supervisors.remove(device.bus_id()) {
                if let Err(e) = supervisor.stop() {
                    log::error!("{}", e);
                    update.failures.push(e);
                }
            }
            update.removed.push(device);
        }

        for device in diff.added {
            log::info!(
                "Device added: {} ({}, {})",
                device.bus_id(),
                device.name(),
                device.capture_path().display()
            );
            let mut supervisor =
                StreamSupervisor::new(device.clone(), self.settings, Arc::clone(&self.backend));

            if let Some(directory) = active_session {
                match supervisor.start(directory) {
                    Ok(output_path) => update.started.push(StartedStream {
                        device: device.clone(),
                        output_path,
                    }),
                    Err(e) => {
                        log::error!("{}", e);
                        update.failures.push(e);
                    }
                }
            }

            self.supervisors.insert(device.bus_id().to_string(), supervisor);
            update.added.push(device);
        }

        self.snapshot = snapshot;
        update
    }

    /// Poll every supervisor's process; returns the bus ids whose process died.
    pub fn check_health(&mut self) -> Vec<(String, String)> {
        self.supervisors
            .values_mut()
            .filter_map(|s| match s.poll_health() {
                StreamHealth::Exited(status) => Some((s.bus_id().to_string(), status)),
                _ => None,
            })
            .collect()
    }

    /// Stop every supervisor. Errors are logged and returned; all are attempted.
    pub fn stop_all(&mut self) -> Vec<MonitorError> {
        let mut failures = Vec::new();
        for supervisor in self.supervisors.values_mut() {
            if let Err(e) = supervisor.stop() {
                log::error!("{}", e);
                failures.push(e);
            }
        }
        failures
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{cam, temp_root, FakeBackend};
    use std::fs;
    use std::time::Duration;

    fn registry(backend: &Arc<FakeBackend>) -> DeviceRegistry<FakeBackend> {
        DeviceRegistry::new(
            Arc::clone(backend),
            StreamSettings {
                width: 1280,
                framerate: 15,
                stop_grace: Duration::from_millis(10),
            },
        )
    }

    fn ids(devices: &[DeviceInfo]) -> Vec<&str> {
        devices.iter().map(DeviceInfo::bus_id).collect()
    }

    #[test]
    fn reconcile_computes_set_difference() {
        let diff = reconcile(&[cam("a"), cam("b")], &[cam("b"), cam("c")]);
        assert_eq!(ids(&diff.added), vec!["c"]);
        assert_eq!(ids(&diff.removed), vec!["a"]);
    }

    #[test]
    fn reconcile_treats_new_paths_as_replug() {
        let moved = DeviceInfo::new("a", vec!["/dev/video9".into()], "Test Camera").unwrap();
        let diff = reconcile(&[cam("a"), cam("b")], &[moved, cam("b")]);

        assert_eq!(ids(&diff.removed), vec!["a"]);
        assert_eq!(ids(&diff.added), vec!["a"]);
        assert_eq!(diff.removed[0].capture_path(), Path::new("/dev/video-a"));
        assert_eq!(diff.added[0].capture_path(), Path::new("/dev/video9"));
    }

    #[test]
    fn reconcile_unchanged_device_is_no_change() {
        assert!(reconcile(&[cam("a")], &[cam("a")]).is_empty());
    }

    #[test]
    fn reconcile_collapses_duplicate_bus_ids() {
        let diff = reconcile(&[], &[cam("a"), cam("a")]);
        assert_eq!(ids(&diff.added), vec!["a"]);
    }

    #[test]
    fn tracked_set_follows_latest_snapshot() {
        let backend = Arc::new(FakeBackend::new());
        let mut reg = registry(&backend);

        let snapshots = vec![
            vec![cam("a")],
            vec![cam("a"), cam("b"), cam("c")],
            vec![cam("c")],
            vec![],
            vec![cam("b"), cam("d")],
        ];
        for snapshot in snapshots {
            let mut expected: Vec<String> =
                snapshot.iter().map(|d| d.bus_id().to_string()).collect();
            expected.sort();
            reg.apply(snapshot, None);
            assert_eq!(reg.bus_ids(), expected);
        }
    }

    #[test]
    fn added_device_joins_idle_without_session() {
        let backend = Arc::new(FakeBackend::new());
        let mut reg = registry(&backend);

        let update = reg.apply(vec![cam("a")], None);

        assert_eq!(ids(&update.added), vec!["a"]);
        assert!(update.started.is_empty());
        assert!(reg.get("a").unwrap().state().is_idle());
        assert!(backend.starts().is_empty());
    }

    #[test]
    fn added_device_starts_into_active_session() {
        let root = temp_root("reg_active");
        fs::create_dir_all(&root).unwrap();
        let backend = Arc::new(FakeBackend::new());
        let mut reg = registry(&backend);

        let update = reg.apply(vec![cam("a")], Some(&root));

        assert_eq!(update.started.len(), 1);
        assert_eq!(update.started[0].output_path, root.join("a.avi"));
        assert!(reg.get("a").unwrap().is_running());

        let _ = fs::remove_dir_all(&root);
    }

    #[test]
    fn existing_running_devices_are_not_restarted() {
        let root = temp_root("reg_no_double");
        fs::create_dir_all(&root).unwrap();
        let backend = Arc::new(FakeBackend::new());
        let mut reg = registry(&backend);

        reg.apply(vec![cam("a")], Some(&root));
        reg.apply(vec![cam("a"), cam("b")], Some(&root));

        assert_eq!(backend.starts_for("a").len(), 1);
        assert_eq!(backend.starts_for("b").len(), 1);
        assert_eq!(backend.live_count(), 2);

        let _ = fs::remove_dir_all(&root);
    }

    #[test]
    fn removed_device_is_stopped_and_evicted() {
        let root = temp_root("reg_remove");
        fs::create_dir_all(&root).unwrap();
        let backend = Arc::new(FakeBackend::new());
        let mut reg = registry(&backend);

        reg.apply(vec![cam("a"), cam("b")], Some(&root));
        let update = reg.apply(vec![cam("b")], Some(&root));

        assert_eq!(ids(&update.removed), vec!["a"]);
        assert!(!reg.contains("a"));
        assert_eq!(backend.live_for("a"), 0);
        assert_eq!(backend.live_for("b"), 1);

        let _ = fs::remove_dir_all(&root);
    }

    #[test]
    fn reattach_creates_new_supervisor() {
        let backend = Arc::new(FakeBackend::new());
        let mut reg = registry(&backend);

        reg.apply(vec![cam("a")], None);
        let first = reg.get("a").unwrap().id();

        reg.apply(vec![], None);
        reg.apply(vec![cam("a")], None);
        let second = reg.get("a").unwrap().id();

        assert_ne!(first, second);
    }

    #[test]
    fn replug_between_polls_gets_new_supervisor_on_new_node() {
        let root = temp_root("reg_replug");
        fs::create_dir_all(&root).unwrap();
        let backend = Arc::new(FakeBackend::new());
        let mut reg = registry(&backend);

        reg.apply(vec![cam("a")], Some(&root));
        let first = reg.get("a").unwrap().id();

        let moved = DeviceInfo::new("a", vec!["/dev/video9".into()], "Test Camera").unwrap();
        let update = reg.apply(vec![moved], Some(&root));

        assert_eq!(ids(&update.removed), vec!["a"]);
        assert_eq!(ids(&update.added), vec!["a"]);
        let sup = reg.get("a").unwrap();
        assert_ne!(sup.id(), first);
        assert_eq!(sup.device().capture_path(), Path::new("/dev/video9"));
        assert_eq!(backend.live_for("a"), 1);
        let starts = backend.starts_for("a");
        assert_eq!(starts.last().unwrap().device_path, PathBuf::from("/dev/video9"));

        let _ = fs::remove_dir_all(&root);
    }

    #[test]
    fn reattach_in_same_session_keeps_earlier_file() {
        let root = temp_root("reg_reattach_file");
        fs::create_dir_all(&root).unwrap();
        let backend = Arc::new(FakeBackend::new());
        let mut reg = registry(&backend);

        reg.apply(vec![cam("a")], Some(&root));
        fs::write(root.join("a.avi"), vec![1u8; 4096]).unwrap();
        reg.apply(vec![], Some(&root));
        let update = reg.apply(vec![cam("a")], Some(&root));

        assert_eq!(update.started[0].output_path, root.join("a_1.avi"));
        assert_eq!(fs::metadata(root.join("a.avi")).unwrap().len(), 4096);

        let _ = fs::remove_dir_all(&root);
    }

    #[test]
    fn launch_failure_is_reported_and_device_stays_tracked() {
        let root = temp_root("reg_fail");
        fs::create_dir_all(&root).unwrap();
        let backend = Arc::new(FakeBackend::new());
        backend.fail_launches_for("a");
        let mut reg = registry(&backend);

        let update = reg.apply(vec![cam("a"), cam("b")], Some(&root));

        assert_eq!(update.failures.len(), 1);
        assert_eq!(update.failures[0].bus_id(), Some("a"));
        assert!(reg.contains("a"));
        assert!(reg.get("a").unwrap().state().is_idle());
        assert!(reg.get("b").unwrap().is_running());

        let _ = fs::remove_dir_all(&root);
    }

    #[test]
    fn check_health_reports_dead_processes() {
        let root = temp_root("reg_health");
        fs::create_dir_all(&root).unwrap();
        let backend = Arc::new(FakeBackend::new());
        let mut reg = registry(&backend);

        reg.apply(vec![cam("a"), cam("b")], Some(&root));
        backend.crash("b");

        let dead = reg.check_health();
        assert_eq!(dead.len(), 1);
        assert_eq!(dead[0].0, "b");
        assert_eq!(reg.running_count(), 1);

        let _ = fs::remove_dir_all(&root);
    }

    #[test]
    fn stop_all_leaves_no_live_process() {
        let root = temp_root("reg_stop_all");
        fs::create_dir_all(&root).unwrap();
        let backend = Arc::new(FakeBackend::new());
        let mut reg = registry(&backend);

        reg.apply(vec![cam("a"), cam("b"), cam("c")], Some(&root));
        assert!(reg.stop_all().is_empty());

        assert_eq!(reg.running_count(), 0);
        assert_eq!(backend.live_count(), 0);
        assert_eq!(reg.len(), 3);

        let _ = fs::remove_dir_all(&root);
    }
}
