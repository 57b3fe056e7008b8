//! # multicam-linux
//!
//! Linux backends for multicam-core.
//!
//! Provides:
//! - `V4l2CtlEnumerator`: camera enumeration via `v4l2-ctl --list-devices`
//! - `GstLaunchBackend`: one `gst-launch-1.0` MJPEG/AVI pipeline per camera
//! - `SysinfoDiskProbe`: free space of the filesystem holding the video root
//! - `process`: SIGINT-then-SIGKILL child termination
//!
//! ## Platform Requirements
//! - `v4l-utils` (for `v4l2-ctl`)
//! - GStreamer 1.x with the good plugins (`v4l2src`, `avimux`)
//!
//! ## Usage
//! ```ignore
//! use std::sync::Arc;
//! use multicam_core::{Monitor, MonitorOptions, SystemClock};
//! use multicam_linux::{GstLaunchBackend, SysinfoDiskProbe, V4l2CtlEnumerator};
//!
//! let monitor = Monitor::new(
//!     &config,
//!     MonitorOptions::default(),
//!     V4l2CtlEnumerator::new().with_bus_prefix("usb-"),
//!     Arc::new(GstLaunchBackend::new()),
//!     SysinfoDiskProbe::new(),
//!     SystemClock,
//! );
//! ```

pub mod disk_space;
#[cfg(unix)]
pub mod gstreamer_backend;
#[cfg(unix)]
pub mod process;
#[cfg(target_os = "linux")]
pub mod v4l2_enumerator;

pub use disk_space::SysinfoDiskProbe;
#[cfg(unix)]
pub use gstreamer_backend::{GstLaunchBackend, GstProcess};
#[cfg(target_os = "linux")]
pub use v4l2_enumerator::V4l2CtlEnumerator;
