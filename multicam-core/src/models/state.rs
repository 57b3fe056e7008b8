use std::fmt;
use std::time::{Duration, Instant};

/// Lifecycle of a single stream supervisor.
///
/// ```text
/// idle ──start──▶ running ──stop / process exit──▶ idle
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamState {
    Idle,
    Running,
}

impl StreamState {
    pub fn is_idle(&self) -> bool {
        matches!(self, Self::Idle)
    }

    pub fn is_running(&self) -> bool {
        matches!(self, Self::Running)
    }
}

/// Result of polling a supervisor's capture process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamHealth {
    Idle,
    Running,
    /// The process exited without being asked to. The supervisor is IDLE again.
    Exited(String),
}

/// Scheduler phase. RECORDING is the initial phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Recording,
    Idle,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Recording => f.write_str("RECORDING"),
            Self::Idle => f.write_str("IDLE"),
        }
    }
}

/// The process-wide phase clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchedulerState {
    pub phase: Phase,
    pub phase_start: Instant,
    pub recording_duration: Duration,
    pub idle_duration: Duration,
}

impl SchedulerState {
    pub fn new(now: Instant, recording_duration: Duration, idle_duration: Duration) -> Self {
        Self {
            phase: Phase::Recording,
            phase_start: now,
            recording_duration,
            idle_duration,
        }
    }

    /// Configured length of the current phase.
    pub fn phase_duration(&self) -> Duration {
        match self.phase {
            Phase::Recording => self.recording_duration,
            Phase::Idle => self.idle_duration,
        }
    }

    /// True once the current phase's deadline has been reached.
    pub fn is_due(&self, now: Instant) -> bool {
        now.saturating_duration_since(self.phase_start) >= self.phase_duration()
    }

    /// Time left until the current phase's deadline.
    pub fn remaining(&self, now: Instant) -> Duration {
        self.phase_duration()
            .saturating_sub(now.saturating_duration_since(self.phase_start))
    }

    /// Flip to the other phase, restarting the phase clock at `now`.
    pub fn advance(&mut self, now: Instant) -> Phase {
        self.phase = match self.phase {
            Phase::Recording => Phase::Idle,
            Phase::Idle => Phase::Recording,
        };
        self.phase_start = now;
        self.phase
    }
}
