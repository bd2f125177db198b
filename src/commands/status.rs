//! Status command - report whether an instance is running.

use anyhow::Result;
use colored::Colorize;
use std::path::Path;

use crate::marker::{InstanceMarker, MarkerStatus};

/// Execute the status command
pub fn execute(pid_file: &Path) -> Result<()> {
    let status = InstanceMarker::new(pid_file).status();
    println!("{}", describe(status));
    Ok(())
}

fn describe(status: MarkerStatus) -> String {
    match status {
        MarkerStatus::Running(pid) => format!("{} Running (pid {pid})", "●".green().bold()),
        MarkerStatus::NotRunning => format!("{} Not running", "─".dimmed()),
        MarkerStatus::Stale(pid) => format!(
            "{} Not running {}",
            "─".dimmed(),
            format!("(removed stale marker for pid {pid})").dimmed()
        ),
    }
}
