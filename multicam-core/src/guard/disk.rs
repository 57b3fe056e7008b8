use std::path::PathBuf;
use std::time::{Duration, Instant};

use crate::traits::free_space::FreeSpaceProbe;

/// Outcome of a disk guard poll.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiskStatus {
    /// Not checked this tick (interval not yet elapsed).
    Skipped,
    /// The probe failed; treated as healthy.
    Unknown,
    Healthy { free_mb: u64 },
    Exhausted { free_mb: u64, threshold_mb: u64 },
}

/// Watches free space under the video root.
///
/// Tripping is fatal: the monitor loop stops every stream and exits. There is
/// no recovery path.
pub struct DiskGuard<P: FreeSpaceProbe> {
    probe: P,
    path: PathBuf,
    threshold_mb: u64,
    interval: Duration,
    last_check: Option<Instant>,
    /// Reading taken by the most recent `check`; `None` if the probe failed.
    last_free_mb: Option<u64>,
}

impl<P: FreeSpaceProbe> DiskGuard<P> {
    pub fn new(probe: P, path: impl Into<PathBuf>, threshold_mb: u64, interval: Duration) -> Self {
        Self {
            probe,
            path: path.into(),
            threshold_mb,
            interval,
            last_check: None,
            last_free_mb: None,
        }
    }

    /// True when free space is below `threshold_mb`. A failing probe never trips.
    pub fn check(&mut self, threshold_mb: u64) -> bool {
        self.last_free_mb = match self.probe.free_space_mb(&self.path) {
            Ok(free_mb) => Some(free_mb),
            Err(e) => {
                log::warn!("{}", e);
                None
            }
        };
        matches!(self.last_free_mb, Some(free_mb) if free_mb < threshold_mb)
    }

    /// `check` against the configured threshold, at most once per interval.
    pub fn poll(&mut self, now: Instant) -> DiskStatus {
        if let Some(last) = self.last_check {
            if now.saturating_duration_since(last) < self.interval {
                return DiskStatus::Skipped;
            }
        }
        self.last_check = Some(now);

        let exhausted = self.check(self.threshold_mb);
        match self.last_free_mb {
            Some(free_mb) if exhausted => {
                log::warn!(
                    "Out of disk space: {} MB free under {}, threshold {} MB",
                    free_mb,
                    self.path.display(),
                    self.threshold_mb
                );
                DiskStatus::Exhausted {
                    free_mb,
                    threshold_mb: self.threshold_mb,
                }
            }
            Some(free_mb) => {
                log::debug!("{} MB free under {}", free_mb, self.path.display());
                DiskStatus::Healthy { free_mb }
            }
            None => DiskStatus::Unknown,
        }
    }
}
