use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use crate::guard::disk::{DiskGuard, DiskStatus};
use crate::models::config::MonitorConfiguration;
use crate::models::error::MonitorError;
use crate::registry::device_registry::{DeviceRegistry, RegistryUpdate};
use crate::scheduler::recording::{PhaseEdge, RecordingScheduler};
use crate::storage::session_dir::SessionDirectories;
use crate::supervisor::stream::StreamSettings;
use crate::traits::capture_backend::CaptureBackend;
use crate::traits::clock::Clock;
use crate::traits::device_enumerator::DeviceEnumerator;
use crate::traits::free_space::FreeSpaceProbe;

/// Runtime knobs that are not part of the recording configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonitorOptions {
    /// Root under which session directories are created.
    pub video_root: PathBuf,
    pub tick_interval: Duration,
    pub disk_check_interval: Duration,
}

impl Default for MonitorOptions {
    fn default() -> Self {
        Self {
            video_root: PathBuf::from("videos"),
            tick_interval: Duration::from_millis(100),
            disk_check_interval: Duration::from_secs(1),
        }
    }
}

/// Why `run` returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownReason {
    DiskExhausted { free_mb: u64, threshold_mb: u64 },
    Interrupted,
}

/// Everything one tick did, in the order it did it.
#[derive(Debug)]
pub struct TickReport {
    /// `None` when enumeration failed and reconciliation was skipped.
    pub update: Option<RegistryUpdate>,
    /// Bus ids (and exit status) of capture processes that died on their own.
    pub exited: Vec<(String, String)>,
    pub edge: Option<PhaseEdge>,
    pub disk: DiskStatus,
}

/// Top-level driver: one cooperative polling loop owning every component.
///
/// Each tick runs, in order:
/// ```text
/// enumerate ─▶ registry.apply ─▶ health poll ─▶ scheduler.tick ─▶ disk guard
/// ```
/// so a device evicted this tick is never handed a start or stop afterwards.
pub struct Monitor<E, B, P, C>
where
    E: DeviceEnumerator,
    B: CaptureBackend,
    P: FreeSpaceProbe,
    C: Clock,
{
    enumerator: E,
    registry: DeviceRegistry<B>,
    scheduler: RecordingScheduler,
    guard: DiskGuard<P>,
    clock: C,
    tick_interval: Duration,
    streams_live: bool,
}

impl<E, B, P, C> Monitor<E, B, P, C>
where
    E: DeviceEnumerator,
    B: CaptureBackend,
    P: FreeSpaceProbe,
    C: Clock,
{
    pub fn new(
        config: &MonitorConfiguration,
        options: MonitorOptions,
        enumerator: E,
        backend: Arc<B>,
        probe: P,
        clock: C,
    ) -> Self {
        let settings = StreamSettings {
            width: config.resolution_width,
            framerate: config.framerate,
            stop_grace: config.stop_grace_period(),
        };
        let scheduler = RecordingScheduler::new(
            clock.now(),
            config.recording_duration(),
            config.idle_duration(),
            SessionDirectories::new(&options.video_root),
        );
        let guard = DiskGuard::new(
            probe,
            &options.video_root,
            config.disk_threshold_mb,
            options.disk_check_interval,
        );
        Self {
            enumerator,
            registry: DeviceRegistry::new(backend, settings),
            scheduler,
            guard,
            clock,
            tick_interval: options.tick_interval,
            streams_live: false,
        }
    }

    pub fn registry(&self) -> &DeviceRegistry<B> {
        &self.registry
    }

    pub fn scheduler(&self) -> &RecordingScheduler {
        &self.scheduler
    }

    /// Take the first snapshot and enter the initial RECORDING phase.
    pub fn start(&mut self) -> Result<PhaseEdge, MonitorError> {
        let snapshot = self.enumerator.enumerate()?;
        self.registry.apply(snapshot, None);
        self.streams_live = true;
        let edge = self
            .scheduler
            .begin(self.clock.now(), self.clock.local_time(), &mut self.registry);
        Ok(edge)
    }

    /// One pass of the loop.
    pub fn tick(&mut self) -> TickReport {
        let update = match self.enumerator.enumerate() {
            Ok(snapshot) => {
                let active = self.scheduler.active_session_dir().map(PathBuf::from);
                let update = self.registry.apply(snapshot, active.as_deref());
                self.scheduler.record_started(&update.started);
                Some(update)
            }
            Err(e) => {
                log::warn!("Skipping reconciliation this tick: {}", e);
                None
            }
        };

        let exited = self.registry.check_health();

        let edge = self
            .scheduler
            .tick(self.clock.now(), self.clock.local_time(), &mut self.registry);

        let disk = self.guard.poll(self.clock.now());

        TickReport {
            update,
            exited,
            edge,
            disk,
        }
    }

    /// Run until the disk guard trips or `interrupted` is set. Every stream is
    /// stopped before this returns.
    pub fn run(&mut self, interrupted: &AtomicBool) -> Result<ShutdownReason, MonitorError> {
        self.start()?;

        let reason = loop {
            if interrupted.load(Ordering::SeqCst) {
                log::info!("Interrupted");
                break ShutdownReason::Interrupted;
            }

            let tick_start = self.clock.now();
            let report = self.tick();
            if let DiskStatus::Exhausted {
                free_mb,
                threshold_mb,
            } = report.disk
            {
                log::warn!("Out of disk space. Goodbye!");
                break ShutdownReason::DiskExhausted {
                    free_mb,
                    threshold_mb,
                };
            }

            let spent = self.clock.now().saturating_duration_since(tick_start);
            thread::sleep(self.tick_interval.saturating_sub(spent));
        };

        self.shutdown();
        Ok(reason)
    }

    /// Stop every stream and close the open session. Safe to call repeatedly.
    pub fn shutdown(&mut self) {
        if !self.streams_live {
            return;
        }
        self.streams_live = false;
        let failures = self
            .scheduler
            .shutdown(self.clock.local_time(), &mut self.registry);
        if !failures.is_empty() {
            log::error!("{} failure(s) while shutting down", failures.len());
        }
    }
}

impl<E, B, P, C> Drop for Monitor<E, B, P, C>
where
    E: DeviceEnumerator,
    B: CaptureBackend,
    P: FreeSpaceProbe,
    C: Clock,
{
    fn drop(&mut self) {
        self.shutdown();
    }
}
