//! Error types shared by the daemon's preflight and lifecycle stages.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that abort a daemon session.
///
/// Every variant is fatal: the session stops before (or instead of)
/// spawning any child process. Per-task launch failures never surface here.
#[derive(Debug, Error)]
pub enum DaemonError {
    #[error("must run with root privileges (re-run with sudo)")]
    NotPrivileged,

    #[error("RLIMIT_NPROC too low ({observed}, need {required}). Run: ulimit -u {recommended}")]
    InsufficientLimit {
        observed: u64,
        required: u64,
        recommended: u64,
    },

    #[error("failed to query RLIMIT_NPROC: {0}")]
    LimitQuery(#[source] nix::Error),

    #[error("instance marker {path}: {source}")]
    Marker {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to detach from controlling session: {0}")]
    Detach(String),

    #[error("failed to install signal handler: {0}")]
    Signal(#[source] io::Error),

    #[error("invalid configuration: {0}")]
    Config(String),
}

impl DaemonError {
    pub(crate) fn marker(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Marker {
            path: path.into(),
            source,
        }
    }
}
