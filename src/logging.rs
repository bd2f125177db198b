//! Log sink setup.
//!
//! The sink is a single append-only file opened once at startup and held
//! for the life of the process. After detachment the same file also
//! receives stdout and stderr.

use anyhow::{anyhow, Context, Result};
use std::fs::{self, File, OpenOptions};
use std::path::Path;
use std::sync::Mutex;
use tracing_subscriber::EnvFilter;

const DEFAULT_FILTER: &str = "info";

/// Open (or create) the log file for appending.
pub fn open_sink(path: &Path) -> Result<File> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create log directory {}", dir.display()))?;
    }
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("Failed to open log file {}", path.display()))
}

/// Install the global subscriber writing plain-text lines to `sink`.
///
/// The filter comes from `RUST_LOG`, defaulting to `info`.
pub fn init(sink: &File) -> Result<()> {
    let writer = sink.try_clone().context("Failed to clone log file handle")?;
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_ansi(false)
        .with_target(false)
        .with_writer(Mutex::new(writer))
        .try_init()
        .map_err(|e| anyhow!("Failed to install log subscriber: {e}"))
}
