//! Full session lifecycle with fake collaborators

use super::helpers::{wait_until, FixedPrivilege, RecordingLauncher};
use churnd::cancel::NoSignals;
use churnd::daemon::{Foreground, Session, SessionOutcome};
use churnd::limits::FixedLimit;
use churnd::{DaemonConfig, DaemonError};
use std::path::Path;
use std::thread;
use std::time::Duration;
use tempfile::TempDir;

fn config(dir: &Path, count: usize, max_parallel: usize) -> DaemonConfig {
    DaemonConfig {
        child_count: count,
        max_parallel,
        settle_delay_ms: 1,
        pid_file: dir.join("state").join("churnd.pid"),
        log_file: dir.join("churnd.log"),
        ..Default::default()
    }
}

fn session(config: DaemonConfig, launcher: RecordingLauncher) -> Session {
    Session::new(config)
        .with_privilege(FixedPrivilege(true))
        .with_limits(FixedLimit(u64::MAX))
        .with_detacher(Foreground)
        .with_signals(NoSignals)
        .with_launcher(launcher)
}

#[test]
fn test_low_limit_aborts_before_any_launch() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let config = config(temp_dir.path(), 1000, 50);
    let pid_file = config.pid_file.clone();
    let launcher = RecordingLauncher::default();

    let err = session(config, launcher.clone())
        .with_limits(FixedLimit(500))
        .run()
        .unwrap_err();

    match err {
        DaemonError::InsufficientLimit {
            observed, required, ..
        } => {
            assert_eq!(observed, 500);
            assert_eq!(required, 1000);
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(launcher.calls(), 0);
    assert!(!pid_file.exists());
}

#[test]
fn test_unprivileged_aborts_before_any_launch() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let launcher = RecordingLauncher::default();

    let err = session(config(temp_dir.path(), 10, 2), launcher.clone())
        .with_privilege(FixedPrivilege(false))
        .run()
        .unwrap_err();

    assert!(matches!(err, DaemonError::NotPrivileged));
    assert_eq!(launcher.calls(), 0);
}

#[test]
fn test_signal_mid_run_drains_and_releases_marker() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let config = config(temp_dir.path(), 1000, 50);
    let pid_file = config.pid_file.clone();

    let session_builder = Session::new(config.clone());
    let token = session_builder.token();
    let launcher =
        RecordingLauncher::new(Duration::from_millis(1)).cancel_on(5, token.clone());
    let session = session_builder
        .with_privilege(FixedPrivilege(true))
        .with_limits(FixedLimit(u64::MAX))
        .with_signals(NoSignals)
        .with_launcher(launcher.clone());

    let outcome = session.run().expect("session failed");

    match outcome {
        SessionOutcome::Cancelled { issued } => {
            assert!((5..=55).contains(&issued), "unexpected issued {issued}");
            assert_eq!(issued, launcher.calls());
        }
        other => panic!("expected cancellation, got {other:?}"),
    }
    assert!(!pid_file.exists());
}

#[test]
fn test_completed_run_idles_until_signal() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let config = config(temp_dir.path(), 10, 2);
    let pid_file = config.pid_file.clone();
    let launcher = RecordingLauncher::new(Duration::from_millis(1));

    let session = session(config, launcher.clone());
    let token = session.token();
    let handle = thread::spawn(move || session.run());

    assert!(wait_until(Duration::from_secs(5), || launcher.calls() == 10));
    assert!(wait_until(Duration::from_secs(1), || pid_file.exists()));
    thread::sleep(Duration::from_millis(30));
    assert!(!handle.is_finished(), "session exited without a signal");
    assert!(pid_file.exists());

    token.cancel();
    let outcome = handle.join().unwrap().expect("session failed");

    assert_eq!(outcome, SessionOutcome::Completed { issued: 10 });
    assert!(launcher.peak() <= 2);
    assert!(!pid_file.exists());
}
