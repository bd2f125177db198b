//! Bounded spawner: starts a fixed number of short-lived children while
//! never holding more than `max_parallel` slots at once.
//!
//! Issuance is sequential. For each planned child the loop waits for either
//! a free slot or cancellation; cancellation stops issuance but never
//! touches children already started. Every started task holds its slot for
//! the settle delay, and `run` returns only after all slots are back.

mod gate;
mod launcher;

use std::thread;
use std::time::Duration;

use crate::cancel::CancellationToken;

pub use gate::{Gate, Permit};
pub use launcher::{CommandLauncher, ProcessLauncher};

/// Budget for one spawner run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpawnPlan {
    pub total: usize,
    pub max_parallel: usize,
    pub settle_delay: Duration,
}

/// Summary of a finished run, for logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpawnReport {
    /// Child tasks started
    pub issued: usize,
    /// Whether issuance stopped early because the token fired
    pub cancelled: bool,
}

/// Run the plan to completion or cancellation, then drain.
///
/// Launch failures are absorbed per task; a failed launch still holds its
/// slot for the settle delay. A plan with `max_parallel == 0` issues nothing.
///
/// # Arguments
/// * `token` - Checked before every issuance; firing it stops new children
/// * `launcher` - Starts one child per call
/// * `plan` - Total children, concurrency cap and settle delay
///
/// # Returns
/// A [`SpawnReport`] with the number of tasks started. By the time it is
/// returned every slot has been released and no further launch will happen.
pub fn run(
    token: &CancellationToken,
    launcher: &dyn ProcessLauncher,
    plan: &SpawnPlan,
) -> SpawnReport {
    if plan.max_parallel == 0 {
        tracing::warn!("Spawn plan has no concurrency slots, nothing to do");
        return SpawnReport {
            issued: 0,
            cancelled: token.is_cancelled(),
        };
    }

    let gate = Gate::new(plan.max_parallel);
    let settle_delay = plan.settle_delay;
    let mut issued = 0;
    let mut cancelled = false;

    // Leaving the scope joins every task, which is the drain.
    thread::scope(|scope| {
        for index in 0..plan.total {
            let Some(permit) = gate.acquire(token) else {
                cancelled = true;
                tracing::info!(
                    issued = index,
                    total = plan.total,
                    "Cancellation observed, no further children"
                );
                break;
            };

            let spawned = thread::Builder::new()
                .name(format!("child-task-{index}"))
                .spawn_scoped(scope, move || child_task(launcher, permit, settle_delay));
            match spawned {
                Ok(_) => issued += 1,
                // The closure, and with it the permit, is dropped on failure.
                Err(e) => tracing::debug!(index, error = %e, "Failed to start child task thread"),
            }
        }
        tracing::debug!(issued, "Issuance finished, draining in-flight children");
    });

    SpawnReport { issued, cancelled }
}

fn child_task(launcher: &dyn ProcessLauncher, permit: Permit<'_>, settle_delay: Duration) {
    if let Err(e) = launcher.launch() {
        tracing::debug!(error = %e, "Child launch failed");
    }
    thread::sleep(settle_delay);
    drop(permit);
}
