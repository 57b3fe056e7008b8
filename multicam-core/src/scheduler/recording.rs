use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use chrono::NaiveDateTime;

use crate::models::error::MonitorError;
use crate::models::session::RecordingSession;
use crate::models::state::{Phase, SchedulerState};
use crate::registry::device_registry::{DeviceRegistry, StartedStream};
use crate::storage::manifest;
use crate::storage::session_dir::SessionDirectories;
use crate::traits::capture_backend::CaptureBackend;

/// What happened on a phase edge.
#[derive(Debug)]
pub struct PhaseEdge {
    /// Phase that was entered.
    pub phase: Phase,
    /// Session directory created on RECORDING entry.
    pub session_dir: Option<PathBuf>,
    /// Streams started (RECORDING) or stopped (IDLE).
    pub streams: usize,
    pub failures: Vec<MonitorError>,
}

/// Two-phase RECORDING / IDLE timer driving every supervisor in lockstep.
///
/// State transitions (checked once per tick, deadline based):
/// ```text
///            elapsed >= recording_duration
/// RECORDING ───────────────────────────────▶ IDLE      stop all
///     ▲                                       │
///     └───────────────────────────────────────┘
///            elapsed >= idle_duration                  new session dir, start all
/// ```
///
/// The scheduler never creates or destroys supervisors; it only starts and
/// stops whatever the registry holds when an edge fires.
pub struct RecordingScheduler {
    state: SchedulerState,
    directories: SessionDirectories,
    session: Option<RecordingSession>,
}

impl RecordingScheduler {
    pub fn new(
        now: Instant,
        recording_duration: Duration,
        idle_duration: Duration,
        directories: SessionDirectories,
    ) -> Self {
        Self {
            state: SchedulerState::new(now, recording_duration, idle_duration),
            directories,
            session: None,
        }
    }

    pub fn state(&self) -> &SchedulerState {
        &self.state
    }

    pub fn phase(&self) -> Phase {
        self.state.phase
    }

    /// Directory new devices should record into, if a session is in progress.
    pub fn active_session_dir(&self) -> Option<&Path> {
        self.session.as_ref().map(|s| s.directory.as_path())
    }

    /// Enter the initial RECORDING phase.
    pub fn begin<B: CaptureBackend>(
        &mut self,
        now: Instant,
        wall: NaiveDateTime,
        registry: &mut DeviceRegistry<B>,
    ) -> PhaseEdge {
        self.state.phase = Phase::Recording;
        self.state.phase_start = now;
        self.enter_recording(wall, registry)
    }

    /// Fire at most one phase edge if the current phase's deadline has passed.
    pub fn tick<B: CaptureBackend>(
        &mut self,
        now: Instant,
        wall: NaiveDateTime,
        registry: &mut DeviceRegistry<B>,
    ) -> Option<PhaseEdge> {
        if !self.state.is_due(now) {
            return None;
        }
        let edge = match self.state.advance(now) {
            Phase::Idle => self.enter_idle(wall, registry),
            Phase::Recording => self.enter_recording(wall, registry),
        };
        Some(edge)
    }

    /// Note streams the registry started into the current session.
    pub fn record_started(&mut self, started: &[StartedStream]) {
        if let Some(session) = self.session.as_mut() {
            for stream in started {
                session.record_stream(&stream.device, &stream.output_path);
            }
        }
    }

    /// Stop everything and close the current session, if any.
    pub fn shutdown<B: CaptureBackend>(
        &mut self,
        wall: NaiveDateTime,
        registry: &mut DeviceRegistry<B>,
    ) -> Vec<MonitorError> {
        log::info!("Stopping all streams");
        let mut failures = registry.stop_all();
        if let Err(e) = self.close_session(wall) {
            failures.push(e);
        }
        failures
    }

    fn enter_recording<B: CaptureBackend>(
        &mut self,
        wall: NaiveDateTime,
        registry: &mut DeviceRegistry<B>,
    ) -> PhaseEdge {
        log::info!(
            "Recording period starting now, which will end in {} seconds",
            self.state.recording_duration.as_secs()
        );

        let (directory, started_at) = match self.directories.create_next(wall) {
            Ok(created) => created,
            Err(e) => {
                log::error!("Cannot start session: {}", e);
                return PhaseEdge {
                    phase: Phase::Recording,
                    session_dir: None,
                    streams: 0,
                    failures: vec![e],
                };
            }
        };

        let mut session = RecordingSession::new(directory.clone(), started_at);
        let mut failures = Vec::new();
        for supervisor in registry.supervisors_mut() {
            match supervisor.start(&directory) {
                Ok(output) => session.record_stream(supervisor.device(), &output),
                Err(e) => {
                    log::error!("{}", e);
                    failures.push(e);
                }
            }
        }

        let streams = session.streams.len();
        self.session = Some(session);
        PhaseEdge {
            phase: Phase::Recording,
            session_dir: Some(directory),
            streams,
            failures,
        }
    }

    fn enter_idle<B: CaptureBackend>(
        &mut self,
        wall: NaiveDateTime,
        registry: &mut DeviceRegistry<B>,
    ) -> PhaseEdge {
        log::info!(
            "Record period is over, starting next recording in {} seconds",
            self.state.idle_duration.as_secs()
        );
        let streams = registry.running_count();
        let mut failures = registry.stop_all();
        if let Err(e) = self.close_session(wall) {
            failures.push(e);
        }
        PhaseEdge {
            phase: Phase::Idle,
            session_dir: None,
            streams,
            failures,
        }
    }

    fn close_session(&mut self, wall: NaiveDateTime) -> Result<(), MonitorError> {
        let Some(session) = self.session.take() else {
            return Ok(());
        };
        let result = manifest::write_manifest(&session.manifest(wall), &session.directory);
        if let Err(ref e) = result {
            log::warn!("Session {}: {}", session.name, e);
        }
        result
    }
}
