//! Process launch seam.

use std::io;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

/// Starts one external process. The caller never waits on it.
pub trait ProcessLauncher: Send + Sync {
    fn launch(&self) -> io::Result<()>;
}

/// Runs a fixed no-op program with all stdio pointed at `/dev/null`.
///
/// The child is deliberately not reaped: it lingers as a defunct entry in
/// the process table until the daemon exits and init collects it.
#[derive(Debug, Clone)]
pub struct CommandLauncher {
    program: PathBuf,
}

impl CommandLauncher {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    pub fn program(&self) -> &Path {
        &self.program
    }
}

impl ProcessLauncher for CommandLauncher {
    fn launch(&self) -> io::Result<()> {
        let child = Command::new(&self.program)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()?;
        tracing::trace!(pid = child.id(), "Child started");
        Ok(())
    }
}
