//! Bounded spawner scenarios

use super::helpers::{max_within, RecordingLauncher};
use churnd::limits::{check_limits, FixedLimit};
use churnd::spawner::{self, SpawnPlan, SpawnReport};
use churnd::{CancellationToken, DaemonError};
use std::time::{Duration, Instant};

#[test]
fn test_ten_children_two_at_a_time() {
    let token = CancellationToken::new();
    let launcher = RecordingLauncher::new(Duration::from_millis(3));
    let plan = SpawnPlan {
        total: 10,
        max_parallel: 2,
        settle_delay: Duration::from_millis(10),
    };

    let report = spawner::run(&token, &launcher, &plan);

    assert_eq!(report, SpawnReport { issued: 10, cancelled: false });
    assert_eq!(launcher.calls(), 10);
    assert!(launcher.peak() <= 2, "peak {} exceeded cap", launcher.peak());
    let held = launcher.peak_held(Duration::from_millis(13));
    assert!(held <= 2, "{held} slots held at once");
}

#[test]
fn test_slots_stay_held_through_settle_delay() {
    let token = CancellationToken::new();
    let launcher = RecordingLauncher::new(Duration::ZERO);
    let settle_delay = Duration::from_millis(20);
    let plan = SpawnPlan {
        total: 30,
        max_parallel: 3,
        settle_delay,
    };

    spawner::run(&token, &launcher, &plan);

    assert_eq!(launcher.calls(), 30);
    let held = launcher.peak_held(settle_delay);
    assert!(held <= 3, "{held} slots held at once with cap 3");
}

#[test]
fn test_cancel_after_fifth_launch_stops_promptly() {
    let token = CancellationToken::new();
    let launcher =
        RecordingLauncher::new(Duration::from_millis(1)).cancel_on(5, token.clone());
    let plan = SpawnPlan {
        total: 1000,
        max_parallel: 50,
        settle_delay: Duration::from_millis(10),
    };

    let start = Instant::now();
    let report = spawner::run(&token, &launcher, &plan);

    assert!(report.cancelled);
    let calls = launcher.calls();
    assert!((5..=55).contains(&calls), "unexpected call count {calls}");
    assert_eq!(report.issued, calls);
    assert!(start.elapsed() < Duration::from_secs(5));
}

#[test]
fn test_no_launch_after_run_returns() {
    let token = CancellationToken::new();
    let launcher =
        RecordingLauncher::new(Duration::from_millis(1)).cancel_on(3, token.clone());
    let plan = SpawnPlan {
        total: 200,
        max_parallel: 8,
        settle_delay: Duration::from_millis(5),
    };

    spawner::run(&token, &launcher, &plan);
    let after_return = launcher.calls();
    std::thread::sleep(Duration::from_millis(50));

    // Drain means nothing is left running behind our back.
    assert_eq!(launcher.calls(), after_return);
}

#[test]
fn test_cap_equal_to_total() {
    let token = CancellationToken::new();
    let launcher = RecordingLauncher::new(Duration::from_millis(5));
    let plan = SpawnPlan {
        total: 8,
        max_parallel: 8,
        settle_delay: Duration::from_millis(1),
    };

    spawner::run(&token, &launcher, &plan);

    assert_eq!(launcher.calls(), 8);
    assert!(launcher.peak() <= 8);
}

#[test]
fn test_insufficient_limit_reports_both_counts() {
    let err = check_limits(&FixedLimit(500), 1000).unwrap_err();
    assert!(matches!(
        err,
        DaemonError::InsufficientLimit {
            observed: 500,
            required: 1000,
            ..
        }
    ));
}

#[test]
fn test_max_within_counts_overlapping_window() {
    let base = Instant::now();
    let at = |ms| base + Duration::from_millis(ms);
    let starts = [at(0), at(1), at(2), at(30), at(31)];

    assert_eq!(max_within(&starts, Duration::from_millis(10)), 3);
    assert_eq!(max_within(&starts, Duration::from_millis(2)), 2);
    assert_eq!(max_within(&starts, Duration::from_millis(100)), 5);
}
