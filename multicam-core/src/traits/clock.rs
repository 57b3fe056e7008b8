use std::sync::Arc;
use std::time::Instant;

use chrono::{Local, NaiveDateTime};

/// Time source for the monitor loop.
///
/// Phase deadlines use the monotonic clock; session names use local wall time.
pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;
    fn local_time(&self) -> NaiveDateTime;
}

/// The real clocks.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }

    fn local_time(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }
}

impl<T: Clock + ?Sized> Clock for Arc<T> {
    fn now(&self) -> Instant {
        (**self).now()
    }

    fn local_time(&self) -> NaiveDateTime {
        (**self).local_time()
    }
}
