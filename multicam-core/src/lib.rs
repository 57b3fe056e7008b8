//! # multicam-core
//!
//! Platform-agnostic core of the multi-camera recorder.
//!
//! Keeps one capture process per attached camera, cycles all of them between
//! fixed-length RECORDING and IDLE phases, and shuts everything down when the
//! disk fills up. Platform backends (device enumeration, the capture tool,
//! free-space lookup) implement the traits in `traits/` and plug into the
//! generic `Monitor`.
//!
//! ## Architecture
//!
//! ```text
//! multicam-core (this crate)
//! ├── traits/      ← DeviceEnumerator, CaptureBackend, FreeSpaceProbe, Clock
//! ├── models/      ← MonitorError, DeviceInfo, MonitorConfiguration, Phase, RecordingSession
//! ├── supervisor/  ← StreamSupervisor (one capture process per device)
//! ├── registry/    ← DeviceRegistry (snapshot reconciliation, owns supervisors)
//! ├── scheduler/   ← RecordingScheduler (RECORDING / IDLE phase machine)
//! ├── guard/       ← DiskGuard
//! ├── monitor/     ← Monitor (the polling loop)
//! └── storage/     ← session directories, session.json manifest
//! ```

pub mod guard;
pub mod models;
pub mod monitor;
pub mod registry;
pub mod scheduler;
pub mod storage;
pub mod supervisor;
pub mod traits;

#[cfg(test)]
mod testing;

// Re-export key types at crate root for convenience.
pub use guard::disk::{DiskGuard, DiskStatus};
pub use models::config::MonitorConfiguration;
pub use models::device::DeviceInfo;
pub use models::error::MonitorError;
pub use models::session::{RecordingSession, SessionManifest, SessionStream};
pub use models::state::{Phase, SchedulerState, StreamHealth, StreamState};
pub use monitor::monitor_loop::{Monitor, MonitorOptions, ShutdownReason, TickReport};
pub use registry::device_registry::{reconcile, DeviceRegistry, Reconciliation, RegistryUpdate};
pub use scheduler::recording::{PhaseEdge, RecordingScheduler};
pub use storage::session_dir::{ensure_directory, session_name, SessionDirectories};
pub use supervisor::stream::{StreamSettings, StreamSupervisor};
pub use traits::capture_backend::{CaptureBackend, CaptureParams};
pub use traits::clock::{Clock, SystemClock};
pub use traits::device_enumerator::DeviceEnumerator;
pub use traits::free_space::FreeSpaceProbe;
