//! Elevated-privilege check.

use nix::unistd::geteuid;

use crate::error::DaemonError;

pub trait PrivilegeProbe {
    fn is_elevated(&self) -> bool;
}

/// Elevated means an effective uid of 0.
#[derive(Debug, Default, Clone, Copy)]
pub struct EffectiveUid;

impl PrivilegeProbe for EffectiveUid {
    fn is_elevated(&self) -> bool {
        geteuid().is_root()
    }
}

pub fn ensure_elevated<P: PrivilegeProbe + ?Sized>(probe: &P) -> Result<(), DaemonError> {
    if probe.is_elevated() {
        Ok(())
    } else {
        Err(DaemonError::NotPrivileged)
    }
}
