//! Detachment from the controlling terminal.

use nix::unistd::{fork, getppid, setsid, ForkResult, Pid};
use std::fs::{File, OpenOptions};
use std::os::unix::io::AsRawFd;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::error::DaemonError;

/// Ensure the current process runs detached. Must be idempotent.
pub trait Detacher {
    fn ensure_detached(&self) -> Result<(), DaemonError>;
}

/// Stay attached; used with `--foreground` and in tests.
#[derive(Debug, Default, Clone, Copy)]
pub struct Foreground;

impl Detacher for Foreground {
    fn ensure_detached(&self) -> Result<(), DaemonError> {
        Ok(())
    }
}

/// Classic double fork with `setsid` in between.
///
/// The launching process and the intermediate child both exit 0, so the
/// surviving grandchild is reparented to init and can never reacquire a
/// controlling terminal. Afterwards stdin reads from `/dev/null` and
/// stdout/stderr go to the log sink.
///
/// Must run before any other thread is started.
#[derive(Debug)]
pub struct ForkDetacher {
    log_sink: File,
    done: AtomicBool,
}

impl ForkDetacher {
    pub fn new(log_sink: File) -> Self {
        Self {
            log_sink,
            done: AtomicBool::new(false),
        }
    }

    fn redirect_stdio(&self) -> Result<(), DaemonError> {
        let devnull = OpenOptions::new()
            .read(true)
            .open("/dev/null")
            .map_err(|e| DaemonError::Detach(format!("open /dev/null: {e}")))?;
        let log_fd = self.log_sink.as_raw_fd();

        unsafe {
            if libc::dup2(devnull.as_raw_fd(), 0) < 0 {
                return Err(DaemonError::Detach("failed to redirect stdin".to_string()));
            }
            if libc::dup2(log_fd, 1) < 0 {
                return Err(DaemonError::Detach("failed to redirect stdout".to_string()));
            }
            if libc::dup2(log_fd, 2) < 0 {
                return Err(DaemonError::Detach("failed to redirect stderr".to_string()));
            }
        }
        Ok(())
    }
}

impl Detacher for ForkDetacher {
    fn ensure_detached(&self) -> Result<(), DaemonError> {
        if self.done.load(Ordering::SeqCst) || getppid() == Pid::from_raw(1) {
            tracing::debug!("Already detached");
            return Ok(());
        }

        tracing::info!("Detaching from controlling terminal");

        match unsafe { fork() }.map_err(|e| DaemonError::Detach(format!("first fork: {e}")))? {
            ForkResult::Parent { .. } => std::process::exit(0),
            ForkResult::Child => {}
        }

        setsid().map_err(|e| DaemonError::Detach(format!("setsid: {e}")))?;

        match unsafe { fork() }.map_err(|e| DaemonError::Detach(format!("second fork: {e}")))? {
            ForkResult::Parent { .. } => std::process::exit(0),
            ForkResult::Child => {}
        }

        self.redirect_stdio()?;
        self.done.store(true, Ordering::SeqCst);
        tracing::info!(pid = std::process::id(), "Detached");
        Ok(())
    }
}
