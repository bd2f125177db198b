//! Daemon configuration.
//!
//! Defaults are compiled in. An optional TOML file may override any subset
//! of fields, and CLI flags override both. The configuration is fixed once
//! the session starts.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::DaemonError;
use crate::spawner::SpawnPlan;

pub const DEFAULT_CHILD_COUNT: usize = 1000;
pub const DEFAULT_MAX_PARALLEL: usize = 50;
pub const DEFAULT_PROGRAM: &str = "/usr/bin/true";
pub const DEFAULT_SETTLE_DELAY_MS: u64 = 10;
pub const DEFAULT_PID_FILE: &str = "/tmp/churnd.pid";
pub const DEFAULT_LOG_FILE: &str = "/tmp/churnd.log";

/// Multiplier applied to the child count when suggesting a new process limit.
pub const LIMIT_HEADROOM_FACTOR: u64 = 2;

/// Configuration parameters for a daemon session.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DaemonConfig {
    /// Total number of child processes to start over the run
    pub child_count: usize,
    /// Maximum children in flight at once
    pub max_parallel: usize,
    /// No-op executable each child runs
    pub program: PathBuf,
    /// How long a slot stays held after its child starts
    pub settle_delay_ms: u64,
    /// Instance marker location
    pub pid_file: PathBuf,
    /// Append-only log sink
    pub log_file: PathBuf,
}

impl Default for DaemonConfig {
    fn default() -> Self {
        Self {
            child_count: DEFAULT_CHILD_COUNT,
            max_parallel: DEFAULT_MAX_PARALLEL,
            program: PathBuf::from(DEFAULT_PROGRAM),
            settle_delay_ms: DEFAULT_SETTLE_DELAY_MS,
            pid_file: PathBuf::from(DEFAULT_PID_FILE),
            log_file: PathBuf::from(DEFAULT_LOG_FILE),
        }
    }
}

/// Values supplied on the command line. `None` keeps the configured value.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub child_count: Option<usize>,
    pub max_parallel: Option<usize>,
    pub program: Option<PathBuf>,
    pub settle_delay_ms: Option<u64>,
    pub pid_file: Option<PathBuf>,
    pub log_file: Option<PathBuf>,
}

impl DaemonConfig {
    /// Load configuration from a TOML file. Missing fields keep their defaults.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        Self::from_toml(&content)
            .with_context(|| format!("Failed to parse config file {}", path.display()))
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Resolve the effective configuration: file (if any), then CLI overrides.
    pub fn resolve(file: Option<&Path>, overrides: ConfigOverrides) -> Result<Self> {
        let base = match file {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        let config = base.with_overrides(overrides);
        config.validate()?;
        Ok(config)
    }

    pub fn with_overrides(mut self, overrides: ConfigOverrides) -> Self {
        if let Some(count) = overrides.child_count {
            self.child_count = count;
        }
        if let Some(max) = overrides.max_parallel {
            self.max_parallel = max;
        }
        if let Some(program) = overrides.program {
            self.program = program;
        }
        if let Some(ms) = overrides.settle_delay_ms {
            self.settle_delay_ms = ms;
        }
        if let Some(pid_file) = overrides.pid_file {
            self.pid_file = pid_file;
        }
        if let Some(log_file) = overrides.log_file {
            self.log_file = log_file;
        }
        self
    }

    pub fn validate(&self) -> Result<(), DaemonError> {
        if self.max_parallel == 0 {
            return Err(DaemonError::Config(
                "max_parallel must be at least 1".to_string(),
            ));
        }
        if self.program.as_os_str().is_empty() {
            return Err(DaemonError::Config("program must not be empty".to_string()));
        }
        if self.pid_file.file_name().is_none() {
            return Err(DaemonError::Config(format!(
                "pid_file {} does not name a file",
                self.pid_file.display()
            )));
        }
        Ok(())
    }

    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }

    pub fn spawn_plan(&self) -> SpawnPlan {
        SpawnPlan {
            total: self.child_count,
            max_parallel: self.max_parallel,
            settle_delay: self.settle_delay(),
        }
    }
}
