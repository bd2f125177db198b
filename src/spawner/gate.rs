//! Counting gate that bounds in-flight child tasks.

use std::sync::{Condvar, Mutex, MutexGuard};
use std::time::Duration;

use crate::cancel::CancellationToken;

/// How often a blocked `acquire` re-checks the cancellation token.
pub(crate) const CANCEL_POLL_INTERVAL: Duration = Duration::from_millis(5);

/// Slots are only taken through [`Gate::acquire`] and only returned by
/// dropping the [`Permit`] it hands out.
#[derive(Debug)]
pub struct Gate {
    available: Mutex<usize>,
    released: Condvar,
}

impl Gate {
    pub fn new(slots: usize) -> Self {
        Self {
            available: Mutex::new(slots),
            released: Condvar::new(),
        }
    }

    fn lock(&self) -> MutexGuard<'_, usize> {
        self.available
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn available(&self) -> usize {
        *self.lock()
    }

    /// Wait for a free slot, giving up as soon as `token` fires.
    ///
    /// Cancellation wins ties: a cancelled token yields `None` even if a
    /// slot is free.
    pub fn acquire(&self, token: &CancellationToken) -> Option<Permit<'_>> {
        let mut available = self.lock();
        loop {
            if token.is_cancelled() {
                return None;
            }
            if *available > 0 {
                *available -= 1;
                return Some(Permit { gate: self });
            }
            let (guard, _) = self
                .released
                .wait_timeout(available, CANCEL_POLL_INTERVAL)
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            available = guard;
        }
    }

    fn release(&self) {
        *self.lock() += 1;
        self.released.notify_one();
    }
}

/// One occupied slot. Dropping it frees the slot.
#[derive(Debug)]
pub struct Permit<'a> {
    gate: &'a Gate,
}

impl Drop for Permit<'_> {
    fn drop(&mut self) {
        self.gate.release();
    }
}
