use std::sync::Arc;

use crate::models::device::DeviceInfo;
use crate::models::error::MonitorError;

/// Source of device snapshots.
///
/// Called once per monitor tick. Must be side-effect free and return the
/// complete set of attached devices every time.
pub trait DeviceEnumerator: Send + Sync {
    fn enumerate(&self) -> Result<Vec<DeviceInfo>, MonitorError>;
}

impl<T: DeviceEnumerator + ?Sized> DeviceEnumerator for Arc<T> {
    fn enumerate(&self) -> Result<Vec<DeviceInfo>, MonitorError> {
        (**self).enumerate()
    }
}
