//! Cooperative cancellation and the signal bridge that fires it.
//!
//! A [`CancellationToken`] starts armed and transitions exactly once to
//! cancelled. The bridge is the only writer; the spawner and the session
//! loop only read or wait on it.

use nix::sys::signal::{SigSet, Signal};
use std::io;
use std::sync::{Arc, Condvar, Mutex, MutexGuard};
use std::thread;
use std::time::{Duration, Instant};

use crate::error::DaemonError;

#[derive(Debug, Default)]
struct Inner {
    cancelled: Mutex<bool>,
    changed: Condvar,
}

/// Single-shot, edge-triggered cancellation flag shared by reference.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    inner: Arc<Inner>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, bool> {
        // The guarded value is a plain bool, so a poisoned lock is still consistent.
        self.inner
            .cancelled
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Fire the token. Returns `true` only for the call that performed the transition.
    pub fn cancel(&self) -> bool {
        let mut cancelled = self.lock();
        if *cancelled {
            return false;
        }
        *cancelled = true;
        self.inner.changed.notify_all();
        true
    }

    pub fn is_cancelled(&self) -> bool {
        *self.lock()
    }

    /// Block until the token fires.
    pub fn wait(&self) {
        let mut cancelled = self.lock();
        while !*cancelled {
            cancelled = self
                .inner
                .changed
                .wait(cancelled)
                .unwrap_or_else(|poisoned| poisoned.into_inner());
        }
    }

    /// Block until the token fires or `timeout` elapses. Returns whether it fired.
    pub fn wait_timeout(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        let mut cancelled = self.lock();
        while !*cancelled {
            let now = Instant::now();
            if now >= deadline {
                return false;
            }
            let (guard, _) = self
                .inner
                .changed
                .wait_timeout(cancelled, deadline - now)
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            cancelled = guard;
        }
        true
    }
}

/// Translates external termination requests into a token cancellation.
pub trait SignalBridge {
    fn arm(&self, token: &CancellationToken) -> Result<(), DaemonError>;
}

/// Arms SIGINT and SIGTERM, and nothing else.
///
/// Both signals are blocked in the calling thread and a dedicated thread
/// collects them with `sigwait`. Threads started afterwards inherit the
/// mask, so arming must happen before the spawner starts any task.
/// Every other signal, SIGHUP included, keeps its default disposition.
#[derive(Debug, Default, Clone, Copy)]
pub struct TerminationSignals;

impl TerminationSignals {
    fn signal_set() -> SigSet {
        let mut set = SigSet::empty();
        set.add(Signal::SIGINT);
        set.add(Signal::SIGTERM);
        set
    }
}

impl SignalBridge for TerminationSignals {
    fn arm(&self, token: &CancellationToken) -> Result<(), DaemonError> {
        let set = Self::signal_set();
        set.thread_block()
            .map_err(|e| DaemonError::Signal(io::Error::from(e)))?;

        let token = token.clone();
        thread::Builder::new()
            .name("signal-bridge".to_string())
            .spawn(move || loop {
                match set.wait() {
                    Ok(signal) => {
                        if token.cancel() {
                            tracing::info!(%signal, "Termination signal received, stopping");
                        } else {
                            tracing::debug!(%signal, "Already stopping, signal ignored");
                        }
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, "sigwait failed");
                        return;
                    }
                }
            })
            .map_err(DaemonError::Signal)?;

        tracing::debug!("SIGINT and SIGTERM armed");
        Ok(())
    }
}

/// Bridge that never fires; cancellation comes from elsewhere.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoSignals;

impl SignalBridge for NoSignals {
    fn arm(&self, _token: &CancellationToken) -> Result<(), DaemonError> {
        Ok(())
    }
}
