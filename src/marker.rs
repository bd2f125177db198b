//! Instance marker: a PID file at a well-known path.
//!
//! Exclusivity is advisory. `acquire` overwrites whatever is there, so two
//! instances started concurrently would both believe they hold the marker.
//! Replace the plain write with an exclusive lock if strict single-instance
//! behavior is ever required.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::error::DaemonError;
use crate::process::is_process_alive;

/// What the marker says about a running instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkerStatus {
    /// No marker, or an unreadable one
    NotRunning,
    /// Marker names a live process
    Running(u32),
    /// Marker names a process that no longer exists
    Stale(u32),
}

#[derive(Debug, Clone)]
pub struct InstanceMarker {
    path: PathBuf,
}

impl InstanceMarker {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Record the current process ID, creating parent directories as needed.
    ///
    /// An existing marker is overwritten; exclusivity is advisory.
    ///
    /// # Returns
    /// A [`MarkerGuard`] that erases the marker when dropped, or
    /// [`DaemonError::Marker`] if the directory or file could not be written
    pub fn acquire(&self) -> Result<MarkerGuard<'_>, DaemonError> {
        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir).map_err(|e| DaemonError::marker(dir, e))?;
        }

        fs::write(&self.path, std::process::id().to_string())
            .map_err(|e| DaemonError::marker(&self.path, e))?;

        tracing::debug!(path = %self.path.display(), "Instance marker written");
        Ok(MarkerGuard { marker: self })
    }

    /// Best-effort removal. A marker that is already gone is not an error;
    /// anything else is logged and ignored.
    pub fn release(&self) {
        match fs::remove_file(&self.path) {
            Ok(()) => tracing::debug!(path = %self.path.display(), "Instance marker removed"),
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "Failed to remove instance marker")
            }
        }
    }

    /// Read the recorded PID, if the marker exists and parses.
    pub fn read_pid(&self) -> Option<u32> {
        fs::read_to_string(&self.path)
            .ok()
            .and_then(|s| s.trim().parse::<u32>().ok())
    }

    /// Inspect the marker. A stale marker is removed as a side effect.
    pub fn status(&self) -> MarkerStatus {
        match self.read_pid() {
            None => MarkerStatus::NotRunning,
            Some(pid) if is_process_alive(pid) => MarkerStatus::Running(pid),
            Some(pid) => {
                self.release();
                MarkerStatus::Stale(pid)
            }
        }
    }
}

/// Held for the lifetime of the session; releases the marker on drop.
#[derive(Debug)]
pub struct MarkerGuard<'a> {
    marker: &'a InstanceMarker,
}

impl Drop for MarkerGuard<'_> {
    fn drop(&mut self) {
        self.marker.release();
    }
}
