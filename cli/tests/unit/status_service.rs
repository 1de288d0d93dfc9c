//! Handler status observation against a fake guest.

#![allow(clippy::unwrap_used)]

use std::path::Path;
use std::time::Duration;

use extcheck_cli::application::services::extension_status::{
    read_status, wait_for_extension_status,
};
use extcheck_cli::domain::poll::{PollConfig, PollOutcome};
use extcheck_cli::domain::status::StatusObservation;
use extcheck_common::OverallState;

use crate::helpers::{ext_path, handler_status, status_path};
use crate::mocks::FakeHost;

fn poll() -> PollConfig {
    PollConfig::new(Duration::from_secs(1), Duration::from_secs(3)).unwrap()
}

#[tokio::test]
async fn test_read_status_missing_status_dir() {
    let host = FakeHost::new().with_dir(&ext_path());
    let obs = read_status(&host, Path::new(&ext_path())).await;
    assert_eq!(obs, StatusObservation::Missing);
}

#[tokio::test]
async fn test_read_status_uses_highest_sequence() {
    let host = FakeHost::new()
        .with_file(&status_path(0), &handler_status("transitioning", "enabling"))
        .with_file(&status_path(2), &handler_status("success", "enabled"))
        .with_file(&status_path(1), &handler_status("error", "old failure"));

    let obs = read_status(&host, Path::new(&ext_path())).await;

    let StatusObservation::Succeeded(summary) = &obs else {
        panic!("expected success, got {obs:?}");
    };
    assert_eq!(summary.file, "2.status");
    assert_eq!(summary.message, "enabled");
    assert_eq!(summary.proxy_agent_version.as_deref(), Some("1.0.20"));
    assert_eq!(summary.proxy_agent_state, Some(OverallState::Success));
    assert!(summary.stopped_modules.is_empty());
}

#[tokio::test]
async fn test_read_status_garbage_is_unreadable() {
    let host = FakeHost::new().with_file(&status_path(0), "{not json");
    let obs = read_status(&host, Path::new(&ext_path())).await;
    assert!(matches!(obs, StatusObservation::Unreadable(_)), "{obs:?}");
}

#[tokio::test(start_paused = true)]
async fn test_wait_stops_on_error_state() {
    let host = FakeHost::new().with_file(&status_path(0), &handler_status("error", "enable failed"));

    let result = wait_for_extension_status(&host, Path::new(&ext_path()), &poll(), None).await;

    assert_eq!(result.outcome, PollOutcome::Succeeded);
    assert_eq!(result.attempts, 1);
    assert!(!result.last_observed.is_success());
    assert!(matches!(result.last_observed, StatusObservation::Failed(_)));
}

#[tokio::test(start_paused = true)]
async fn test_wait_times_out_while_transitioning() {
    let host = FakeHost::new()
        .with_file(&status_path(0), &handler_status("transitioning", "enabling"));

    let result = wait_for_extension_status(&host, Path::new(&ext_path()), &poll(), None).await;

    assert_eq!(result.outcome, PollOutcome::TimedOut);
    assert_eq!(result.attempts, 3);
    assert!(matches!(result.last_observed, StatusObservation::Pending(_)));
}
