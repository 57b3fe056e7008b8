//! In-memory stand-ins for the external collaborators, shared by unit tests.

use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use chrono::{NaiveDate, NaiveDateTime};
use parking_lot::Mutex;

use crate::models::device::DeviceInfo;
use crate::models::error::MonitorError;
use crate::traits::capture_backend::{CaptureBackend, CaptureParams};
use crate::traits::clock::Clock;
use crate::traits::device_enumerator::DeviceEnumerator;
use crate::traits::free_space::FreeSpaceProbe;

pub fn cam(bus_id: &str) -> DeviceInfo {
    DeviceInfo::new(bus_id, vec![PathBuf::from(format!("/dev/video-{}", bus_id))], "Test Camera")
        .unwrap()
}

pub fn temp_root(name: &str) -> PathBuf {
    std::env::temp_dir().join(format!("multicam_test_{}_{}", name, uuid::Uuid::new_v4()))
}

#[derive(Default)]
struct BackendState {
    next_pid: u32,
    live: HashMap<u32, CaptureParams>,
    starts: Vec<CaptureParams>,
    stops: Vec<String>,
    failing: HashSet<String>,
    crashed: HashSet<u32>,
}

/// Capture backend that tracks "processes" in memory and touches output files.
#[derive(Default)]
pub struct FakeBackend {
    state: Mutex<BackendState>,
}

#[derive(Debug)]
pub struct FakeHandle {
    pid: u32,
}

impl FakeBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_launches_for(&self, bus_id: &str) {
        self.state.lock().failing.insert(bus_id.to_string());
    }

    pub fn allow_launches_for(&self, bus_id: &str) {
        self.state.lock().failing.remove(bus_id);
    }

    /// Make the live process for `bus_id` exit on its own.
    pub fn crash(&self, bus_id: &str) {
        let mut s = self.state.lock();
        let pids: Vec<u32> = s
            .live
            .iter()
            .filter(|(_, p)| p.bus_id == bus_id)
            .map(|(pid, _)| *pid)
            .collect();
        s.crashed.extend(pids);
    }

    pub fn live_count(&self) -> usize {
        self.state.lock().live.len()
    }

    pub fn live_for(&self, bus_id: &str) -> usize {
        self.state.lock().live.values().filter(|p| p.bus_id == bus_id).count()
    }

    pub fn starts(&self) -> Vec<CaptureParams> {
        self.state.lock().starts.clone()
    }

    pub fn starts_for(&self, bus_id: &str) -> Vec<CaptureParams> {
        self.starts().into_iter().filter(|p| p.bus_id == bus_id).collect()
    }

    pub fn stops(&self) -> Vec<String> {
        self.state.lock().stops.clone()
    }
}

impl CaptureBackend for FakeBackend {
    type Handle = FakeHandle;

    fn name(&self) -> &str {
        "fake"
    }

    fn file_extension(&self) -> &str {
        "avi"
    }

    fn start(&self, params: &CaptureParams) -> Result<FakeHandle, MonitorError> {
        let mut s = self.state.lock();
        if s.failing.contains(&params.bus_id) {
            return Err(MonitorError::LaunchFailed {
                bus_id: params.bus_id.clone(),
                reason: "device busy".into(),
            });
        }
        fs::write(&params.output_path, b"").map_err(|e| MonitorError::LaunchFailed {
            bus_id: params.bus_id.clone(),
            reason: e.to_string(),
        })?;
        s.next_pid += 1;
        let pid = s.next_pid;
        s.live.insert(pid, params.clone());
        s.starts.push(params.clone());
        Ok(FakeHandle { pid })
    }

    fn stop(&self, handle: FakeHandle, _grace: Duration) -> Result<(), MonitorError> {
        let mut s = self.state.lock();
        if let Some(params) = s.live.remove(&handle.pid) {
            s.stops.push(params.bus_id);
        }
        s.crashed.remove(&handle.pid);
        Ok(())
    }

    fn exit_status(&self, handle: &mut FakeHandle) -> Option<String> {
        let mut s = self.state.lock();
        if s.crashed.remove(&handle.pid) {
            s.live.remove(&handle.pid);
            return Some("exit status: 1".into());
        }
        None
    }
}

/// Enumerator returning whatever snapshot the test last set.
#[derive(Default)]
pub struct FakeEnumerator {
    devices: Mutex<Vec<DeviceInfo>>,
    failing: Mutex<bool>,
}

impl FakeEnumerator {
    pub fn with(devices: Vec<DeviceInfo>) -> Self {
        Self {
            devices: Mutex::new(devices),
            failing: Mutex::new(false),
        }
    }

    pub fn set(&self, devices: Vec<DeviceInfo>) {
        *self.devices.lock() = devices;
    }

    pub fn set_failing(&self, failing: bool) {
        *self.failing.lock() = failing;
    }
}

impl DeviceEnumerator for FakeEnumerator {
    fn enumerate(&self) -> Result<Vec<DeviceInfo>, MonitorError> {
        if *self.failing.lock() {
            return Err(MonitorError::EnumerationFailed("bus busy".into()));
        }
        Ok(self.devices.lock().clone())
    }
}

/// Free-space probe with an adjustable reading.
pub struct FakeProbe {
    free_mb: Mutex<Result<u64, MonitorError>>,
}

impl FakeProbe {
    pub fn with_free_mb(free_mb: u64) -> Self {
        Self {
            free_mb: Mutex::new(Ok(free_mb)),
        }
    }

    pub fn set_free_mb(&self, free_mb: u64) {
        *self.free_mb.lock() = Ok(free_mb);
    }

    pub fn set_error(&self, error: MonitorError) {
        *self.free_mb.lock() = Err(error);
    }
}

impl FreeSpaceProbe for FakeProbe {
    fn free_space_mb(&self, _path: &Path) -> Result<u64, MonitorError> {
        self.free_mb.lock().clone()
    }
}

/// Clock that only moves when the test advances it.
pub struct ManualClock {
    base: Instant,
    wall_base: NaiveDateTime,
    offset: Mutex<Duration>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self {
            base: Instant::now(),
            wall_base: NaiveDate::from_ymd_opt(2024, 6, 1)
                .unwrap()
                .and_hms_opt(8, 0, 0)
                .unwrap(),
            offset: Mutex::new(Duration::ZERO),
        }
    }

    pub fn advance(&self, by: Duration) {
        *self.offset.lock() += by;
    }

    pub fn advance_secs(&self, secs: u64) {
        self.advance(Duration::from_secs(secs));
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        self.base + *self.offset.lock()
    }

    fn local_time(&self) -> NaiveDateTime {
        let offset = *self.offset.lock();
        self.wall_base
            + chrono::Duration::from_std(offset).unwrap_or_else(|_| chrono::Duration::zero())
    }
}
