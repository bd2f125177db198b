//! Preflight check of the per-user process limit.

use nix::sys::resource::{getrlimit, Resource};

use crate::config::LIMIT_HEADROOM_FACTOR;
use crate::error::DaemonError;

/// Source of the soft cap on processes owned by the invoking user.
pub trait LimitProbe {
    fn soft_process_limit(&self) -> Result<u64, DaemonError>;
}

/// Reads `RLIMIT_NPROC` from the kernel.
#[derive(Debug, Default, Clone, Copy)]
pub struct RlimitProbe;

impl LimitProbe for RlimitProbe {
    fn soft_process_limit(&self) -> Result<u64, DaemonError> {
        let (soft, _hard) = getrlimit(Resource::RLIMIT_NPROC).map_err(DaemonError::LimitQuery)?;
        if soft == libc::RLIM_INFINITY {
            return Ok(u64::MAX);
        }
        Ok(u64::from(soft))
    }
}

/// A fixed limit, for hosts where the cap is already known.
#[derive(Debug, Clone, Copy)]
pub struct FixedLimit(pub u64);

impl LimitProbe for FixedLimit {
    fn soft_process_limit(&self) -> Result<u64, DaemonError> {
        Ok(self.0)
    }
}

/// Verify the soft per-user process limit can absorb a run.
///
/// Reads the limit through `probe` and never changes it. The error carries
/// a suggested new limit of `required` times [`LIMIT_HEADROOM_FACTOR`].
///
/// # Arguments
/// * `probe` - Source of the soft `RLIMIT_NPROC` value
/// * `required` - Number of children the run will start
///
/// # Returns
/// `Ok(())` if the observed limit is at least `required`,
/// [`DaemonError::InsufficientLimit`] if it is lower, or
/// [`DaemonError::LimitQuery`] if the limit could not be read
pub fn check_limits<P: LimitProbe + ?Sized>(probe: &P, required: u64) -> Result<(), DaemonError> {
    let observed = probe.soft_process_limit()?;
    if observed < required {
        return Err(DaemonError::InsufficientLimit {
            observed,
            required,
            recommended: required.saturating_mul(LIMIT_HEADROOM_FACTOR),
        });
    }
    Ok(())
}
