//! Stop command - ask a running instance to shut down gracefully.

use anyhow::{bail, Context, Result};
use colored::Colorize;
use std::path::Path;
use std::thread;
use std::time::{Duration, Instant};

use crate::marker::{InstanceMarker, MarkerStatus};
use crate::process::{is_process_alive, terminate};

const STOP_TIMEOUT: Duration = Duration::from_secs(10);
const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Execute the stop command
pub fn execute(pid_file: &Path) -> Result<()> {
    let marker = InstanceMarker::new(pid_file);

    let pid = match marker.status() {
        MarkerStatus::Running(pid) => pid,
        MarkerStatus::NotRunning | MarkerStatus::Stale(_) => {
            println!("{} Daemon is not running", "─".dimmed());
            return Ok(());
        }
    };

    println!("{} Stopping daemon (pid {pid})...", "→".cyan().bold());
    terminate(pid).with_context(|| format!("Failed to signal pid {pid}"))?;

    if !wait_for_exit(pid, STOP_TIMEOUT) {
        bail!(
            "Daemon did not exit within {} seconds. Try: kill -9 {pid}",
            STOP_TIMEOUT.as_secs()
        );
    }

    println!("{} Daemon stopped", "✓".green().bold());
    Ok(())
}

fn wait_for_exit(pid: u32, timeout: Duration) -> bool {
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if !is_process_alive(pid) {
            return true;
        }
        thread::sleep(POLL_INTERVAL);
    }
    !is_process_alive(pid)
}
