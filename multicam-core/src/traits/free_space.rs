use std::path::Path;
use std::sync::Arc;

use crate::models::error::MonitorError;

/// Reports free space on the filesystem holding a path.
pub trait FreeSpaceProbe: Send + Sync {
    /// Free space in megabytes (MiB) available at `path`.
    fn free_space_mb(&self, path: &Path) -> Result<u64, MonitorError>;
}

impl<T: FreeSpaceProbe + ?Sized> FreeSpaceProbe for Arc<T> {
    fn free_space_mb(&self, path: &Path) -> Result<u64, MonitorError> {
        (**self).free_space_mb(path)
    }
}
