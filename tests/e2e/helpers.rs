//! Test helpers for E2E tests

use churnd::privilege::PrivilegeProbe;
use churnd::spawner::ProcessLauncher;
use churnd::CancellationToken;
use std::io;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

/// Privilege probe with a fixed answer
pub struct FixedPrivilege(pub bool);

impl PrivilegeProbe for FixedPrivilege {
    fn is_elevated(&self) -> bool {
        self.0
    }
}

#[derive(Default)]
struct Counters {
    calls: AtomicUsize,
    active: AtomicUsize,
    peak: AtomicUsize,
    starts: Mutex<Vec<Instant>>,
}

/// Launcher that records invocations and peak overlap instead of forking.
///
/// Optionally fires a cancellation token on the Nth invocation.
#[derive(Clone, Default)]
pub struct RecordingLauncher {
    counters: Arc<Counters>,
    hold: Duration,
    cancel_at: Option<(usize, CancellationToken)>,
}

impl RecordingLauncher {
    pub fn new(hold: Duration) -> Self {
        Self {
            hold,
            ..Default::default()
        }
    }

    pub fn cancel_on(mut self, nth: usize, token: CancellationToken) -> Self {
        self.cancel_at = Some((nth, token));
        self
    }

    pub fn calls(&self) -> usize {
        self.counters.calls.load(Ordering::SeqCst)
    }

    pub fn peak(&self) -> usize {
        self.counters.peak.load(Ordering::SeqCst)
    }

    /// Peak number of slots provably held at once.
    ///
    /// A slot is taken before `launch` and kept for at least `hold` plus the
    /// settle delay, so every launch that started less than `window` before
    /// another one was still holding its slot at that moment.
    pub fn peak_held(&self, window: Duration) -> usize {
        let mut starts = self
            .counters
            .starts
            .lock()
            .expect("starts lock poisoned")
            .clone();
        starts.sort();
        max_within(&starts, window)
    }
}

/// Largest number of sorted instants that fall in any half-open window
/// `(t - window, t]`.
pub fn max_within(sorted: &[Instant], window: Duration) -> usize {
    let mut oldest = 0;
    let mut peak = 0;
    for (newest, at) in sorted.iter().enumerate() {
        while at.duration_since(sorted[oldest]) >= window {
            oldest += 1;
        }
        peak = peak.max(newest - oldest + 1);
    }
    peak
}

impl ProcessLauncher for RecordingLauncher {
    fn launch(&self) -> io::Result<()> {
        self.counters
            .starts
            .lock()
            .expect("starts lock poisoned")
            .push(Instant::now());
        let call = self.counters.calls.fetch_add(1, Ordering::SeqCst) + 1;
        let active = self.counters.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.counters.peak.fetch_max(active, Ordering::SeqCst);

        if let Some((nth, token)) = &self.cancel_at {
            if call == *nth {
                token.cancel();
            }
        }

        thread::sleep(self.hold);
        self.counters.active.fetch_sub(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Poll `condition` until it holds or `timeout` elapses.
pub fn wait_until(timeout: Duration, condition: impl Fn() -> bool) -> bool {
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if condition() {
            return true;
        }
        thread::sleep(Duration::from_millis(2));
    }
    condition()
}
