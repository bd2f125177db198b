//! Daemon session: preflight, detach, mark, arm, spawn, idle, teardown.

use std::fmt;

use crate::cancel::{CancellationToken, SignalBridge, TerminationSignals};
use crate::config::DaemonConfig;
use crate::error::DaemonError;
use crate::limits::{check_limits, LimitProbe, RlimitProbe};
use crate::marker::InstanceMarker;
use crate::privilege::{ensure_elevated, EffectiveUid, PrivilegeProbe};
use crate::spawner::{self, CommandLauncher, ProcessLauncher};

use super::detach::{Detacher, Foreground};

/// Lifecycle phases, in the order a session moves through them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Init,
    LimitChecked,
    Detached,
    Marked,
    Armed,
    Spawning,
    Draining,
    Terminating,
    Exited,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Phase::Init => "init",
            Phase::LimitChecked => "limit-checked",
            Phase::Detached => "detached",
            Phase::Marked => "marked",
            Phase::Armed => "armed",
            Phase::Spawning => "spawning",
            Phase::Draining => "draining",
            Phase::Terminating => "terminating",
            Phase::Exited => "exited",
        };
        f.write_str(name)
    }
}

/// How a session that got past preflight ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionOutcome {
    /// Every planned child was issued; the session then idled until signalled.
    Completed { issued: usize },
    /// Cancellation cut issuance short.
    Cancelled { issued: usize },
}

/// One running instance of the daemon.
///
/// Collaborators default to the real host implementations, except
/// detachment, which defaults to [`Foreground`].
pub struct Session {
    config: DaemonConfig,
    token: CancellationToken,
    privilege: Box<dyn PrivilegeProbe + Send>,
    limits: Box<dyn LimitProbe + Send>,
    detacher: Box<dyn Detacher + Send>,
    signals: Box<dyn SignalBridge + Send>,
    launcher: Box<dyn ProcessLauncher>,
}

impl Session {
    pub fn new(config: DaemonConfig) -> Self {
        let launcher = CommandLauncher::new(config.program.clone());
        Self {
            config,
            token: CancellationToken::new(),
            privilege: Box::new(EffectiveUid),
            limits: Box::new(RlimitProbe),
            detacher: Box::new(Foreground),
            signals: Box::new(TerminationSignals),
            launcher: Box::new(launcher),
        }
    }

    pub fn with_privilege(mut self, probe: impl PrivilegeProbe + Send + 'static) -> Self {
        self.privilege = Box::new(probe);
        self
    }

    pub fn with_limits(mut self, probe: impl LimitProbe + Send + 'static) -> Self {
        self.limits = Box::new(probe);
        self
    }

    pub fn with_detacher(mut self, detacher: impl Detacher + Send + 'static) -> Self {
        self.detacher = Box::new(detacher);
        self
    }

    pub fn with_signals(mut self, bridge: impl SignalBridge + Send + 'static) -> Self {
        self.signals = Box::new(bridge);
        self
    }

    pub fn with_launcher(mut self, launcher: impl ProcessLauncher + 'static) -> Self {
        self.launcher = Box::new(launcher);
        self
    }

    /// Handle to the session's cancellation token.
    pub fn token(&self) -> CancellationToken {
        self.token.clone()
    }

    pub fn config(&self) -> &DaemonConfig {
        &self.config
    }

    /// Drive the session to exit.
    ///
    /// Runs preflight (config, privilege, process limit), detaches, writes
    /// the instance marker, arms the signal bridge and spawns. A completed
    /// run then idles until the token fires. Once the marker is written it
    /// is released on every path out.
    ///
    /// # Returns
    /// * `Ok(SessionOutcome::Completed)` - Every child was issued and a
    ///   termination request ended the idle phase
    /// * `Ok(SessionOutcome::Cancelled)` - Cancellation cut issuance short
    /// * `Err(_)` - A preflight, detach, marker or signal setup failure;
    ///   no child was issued
    pub fn run(self) -> Result<SessionOutcome, DaemonError> {
        enter(Phase::Init);
        self.config.validate()?;
        ensure_elevated(self.privilege.as_ref())?;

        check_limits(self.limits.as_ref(), self.config.child_count as u64)?;
        enter(Phase::LimitChecked);

        self.detacher.ensure_detached()?;
        enter(Phase::Detached);

        let marker = InstanceMarker::new(&self.config.pid_file);
        let guard = marker.acquire()?;
        tracing::info!(
            pid = std::process::id(),
            marker = %marker.path().display(),
            "Instance marker acquired"
        );
        enter(Phase::Marked);

        self.signals.arm(&self.token)?;
        enter(Phase::Armed);

        enter(Phase::Spawning);
        let plan = self.config.spawn_plan();
        tracing::info!(
            total = plan.total,
            max_parallel = plan.max_parallel,
            settle_ms = self.config.settle_delay_ms,
            program = %self.config.program.display(),
            "Spawning children"
        );
        let report = spawner::run(&self.token, self.launcher.as_ref(), &plan);
        tracing::info!(issued = report.issued, cancelled = report.cancelled, "Spawning finished");

        enter(Phase::Draining);
        let outcome = if report.cancelled {
            SessionOutcome::Cancelled {
                issued: report.issued,
            }
        } else {
            if !self.token.is_cancelled() {
                tracing::info!("All children issued, waiting for termination signal");
            }
            self.token.wait();
            SessionOutcome::Completed {
                issued: report.issued,
            }
        };

        enter(Phase::Terminating);
        tracing::info!("Shutting down");
        drop(guard);
        enter(Phase::Exited);

        Ok(outcome)
    }
}

fn enter(phase: Phase) {
    tracing::debug!(%phase, "Session phase");
}
