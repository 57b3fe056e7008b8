//! Child process termination with a grace period.
//!
//! Signals are delivered through the `kill` utility so no FFI is needed. A
//! process that ignores the signal past its grace period is killed with
//! `Child::kill` (SIGKILL) and reaped.

use std::fmt;
use std::io;
use std::process::{Child, Command, ExitStatus, Stdio};
use std::thread;
use std::time::{Duration, Instant};

const POLL_INTERVAL: Duration = Duration::from_millis(20);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Signal {
    Interrupt,
    Terminate,
}

impl Signal {
    fn as_arg(&self) -> &'static str {
        match self {
            Self::Interrupt => "-INT",
            Self::Terminate => "-TERM",
        }
    }
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Interrupt => f.write_str("SIGINT"),
            Self::Terminate => f.write_str("SIGTERM"),
        }
    }
}

/// Send `signal` to `pid`.
pub fn send_signal(pid: u32, signal: Signal) -> io::Result<()> {
    let status = Command::new("kill")
        .arg(signal.as_arg())
        .arg(pid.to_string())
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()?;
    if status.success() {
        Ok(())
    } else {
        Err(io::Error::new(
            io::ErrorKind::Other,
            format!("kill {} {} failed ({})", signal.as_arg(), pid, status),
        ))
    }
}

/// Stop `child`: send `signal`, wait up to `grace`, then SIGKILL.
///
/// The child has exited and been reaped when this returns `Ok`.
pub fn terminate(child: &mut Child, signal: Signal, grace: Duration) -> io::Result<ExitStatus> {
    match wait_after_signal(child, signal, grace) {
        Ok(Some(status)) => Ok(status),
        Ok(None) => {
            log::warn!(
                "Process {} still running {:?} after {}, killing",
                child.id(),
                grace,
                signal
            );
            kill_and_reap(child)
        }
        Err(e) => {
            log::warn!("Waiting on process {} failed: {}, killing", child.id(), e);
            kill_and_reap(child)
        }
    }
}

fn wait_after_signal(
    child: &mut Child,
    signal: Signal,
    grace: Duration,
) -> io::Result<Option<ExitStatus>> {
    if let Some(status) = child.try_wait()? {
        return Ok(Some(status));
    }
    if grace.is_zero() {
        return Ok(None);
    }
    if let Err(e) = send_signal(child.id(), signal) {
        log::warn!("{}", e);
        return Ok(None);
    }

    let deadline = Instant::now() + grace;
    loop {
        if let Some(status) = child.try_wait()? {
            return Ok(Some(status));
        }
        let now = Instant::now();
        if now >= deadline {
            return Ok(None);
        }
        thread::sleep(POLL_INTERVAL.min(deadline - now));
    }
}

fn kill_and_reap(child: &mut Child) -> io::Result<ExitStatus> {
    match child.kill() {
        Ok(()) => {}
        // Already exited; wait below reaps it.
        Err(e) if e.kind() == io::ErrorKind::InvalidInput => {}
        Err(e) => return Err(e),
    }
    child.wait()
}
