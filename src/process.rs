//! Process liveness and signalling helpers.

use nix::errno::Errno;
use nix::sys::signal::{kill, Signal};
use nix::unistd::Pid;

fn to_pid(pid: u32) -> Option<Pid> {
    i32::try_from(pid).ok().filter(|p| *p > 0).map(Pid::from_raw)
}

/// Check whether a process with the given PID exists.
///
/// Sends the null signal. `EPERM` means the process exists but belongs to
/// someone else, so it counts as alive.
///
/// # Arguments
/// * `pid` - The process ID to check
///
/// # Returns
/// * `true` - The process exists (regardless of signal permission)
/// * `false` - The process doesn't exist, or the PID is 0 (our own process
///   group) or does not fit in `i32`
pub fn is_process_alive(pid: u32) -> bool {
    let Some(pid) = to_pid(pid) else {
        return false;
    };

    match kill(pid, None) {
        Ok(()) => true,
        Err(Errno::EPERM) => true,
        Err(_) => false,
    }
}

/// Ask a process to shut down gracefully with SIGTERM.
pub fn terminate(pid: u32) -> nix::Result<()> {
    let pid = to_pid(pid).ok_or(Errno::ESRCH)?;
    kill(pid, Signal::SIGTERM)
}
