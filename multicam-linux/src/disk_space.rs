//! Free-space lookup through `sysinfo`.

use std::path::{Path, PathBuf};

use sysinfo::Disks;

use multicam_core::models::error::MonitorError;
use multicam_core::traits::free_space::FreeSpaceProbe;

const BYTES_PER_MB: u64 = 1024 * 1024;

/// Reads available space of the filesystem mounted closest to a path.
#[derive(Debug, Clone, Copy, Default)]
pub struct SysinfoDiskProbe;

impl SysinfoDiskProbe {
    pub fn new() -> Self {
        Self
    }
}

impl FreeSpaceProbe for SysinfoDiskProbe {
    fn free_space_mb(&self, path: &Path) -> Result<u64, MonitorError> {
        let path = existing_ancestor(path);
        let disks = Disks::new_with_refreshed_list();
        let mounts: Vec<(PathBuf, u64)> = disks
            .list()
            .iter()
            .map(|d| (d.mount_point().to_path_buf(), d.available_space()))
            .collect();

        available_for(&path, &mounts)
            .map(|bytes| bytes / BYTES_PER_MB)
            .ok_or_else(|| {
                MonitorError::DiskProbeFailed(format!(
                    "no mounted filesystem contains {}",
                    path.display()
                ))
            })
    }
}

/// Available bytes of the mount with the longest mount point containing `path`.
pub fn available_for(path: &Path, mounts: &[(PathBuf, u64)]) -> Option<u64> {
    mounts
        .iter()
        .filter(|(mount_point, _)| path.starts_with(mount_point))
        .max_by_key(|(mount_point, _)| mount_point.components().count())
        .map(|(_, available)| *available)
}

/// Canonical form of the deepest part of `path` that exists.
fn existing_ancestor(path: &Path) -> PathBuf {
    path.ancestors()
        .find_map(|p| p.canonicalize().ok())
        .unwrap_or_else(|| path.to_path_buf())
}
