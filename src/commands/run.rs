//! Run command - start a daemon session.

use anyhow::{Context, Result};
use std::path::PathBuf;

use crate::config::{ConfigOverrides, DaemonConfig};
use crate::daemon::{ForkDetacher, Session, SessionOutcome};
use crate::logging;

/// Execute the run command.
/// Usage: churnd run [--config <file>] [--count <n>] [--max-parallel <n>] [--foreground]
pub fn execute(
    config_path: Option<PathBuf>,
    overrides: ConfigOverrides,
    foreground: bool,
) -> Result<()> {
    let config = DaemonConfig::resolve(config_path.as_deref(), overrides)?;

    let sink = logging::open_sink(&config.log_file)?;
    logging::init(&sink)?;

    let mut session = Session::new(config);
    if !foreground {
        let stdio_sink = sink.try_clone().context("Failed to clone log file handle")?;
        session = session.with_detacher(ForkDetacher::new(stdio_sink));
    }

    match session.run() {
        Ok(SessionOutcome::Completed { issued }) => {
            tracing::info!(issued, "Session complete");
            Ok(())
        }
        Ok(SessionOutcome::Cancelled { issued }) => {
            tracing::info!(issued, "Session cancelled before all children were issued");
            Ok(())
        }
        Err(e) => {
            tracing::error!(error = %e, "Fatal");
            Err(e.into())
        }
    }
}
