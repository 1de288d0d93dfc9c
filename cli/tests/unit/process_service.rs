//! Companion process checks against a fake process table.

#![allow(clippy::unwrap_used)]

use std::time::Duration;

use extcheck_cli::application::services::process::{kill_all, wait_for_process};
use extcheck_cli::domain::poll::{PollConfig, PollOutcome};
use tokio_util::sync::CancellationToken;

use crate::mocks::FakeHost;

const AGENT: &str = "azure-proxy-agent";

fn poll() -> PollConfig {
    PollConfig::new(Duration::from_secs(5), Duration::from_secs(20)).unwrap()
}

#[tokio::test(start_paused = true)]
async fn test_wait_for_running_process() {
    let host = FakeHost::new().with_pids(AGENT, &[812]);
    let result = wait_for_process(&host, AGENT, &poll(), None).await;
    assert_eq!(result.outcome, PollOutcome::Succeeded);
    assert_eq!(result.last_observed, vec![812]);
}

#[tokio::test(start_paused = true)]
async fn test_wait_times_out_without_process() {
    let host = FakeHost::new();
    let result = wait_for_process(&host, AGENT, &poll(), None).await;
    assert_eq!(result.outcome, PollOutcome::TimedOut);
    assert!(result.last_observed.is_empty());
    assert_eq!(result.attempts, 4);
}

#[tokio::test(start_paused = true)]
async fn test_wait_cancelled_keeps_last_observation() {
    let host = FakeHost::new();
    let cancel = CancellationToken::new();
    cancel.cancel();

    let result = wait_for_process(&host, AGENT, &poll(), Some(&cancel)).await;

    assert_eq!(result.outcome, PollOutcome::Cancelled);
    assert_eq!(result.attempts, 1);
    assert!(result.last_observed.is_empty());
}

#[tokio::test]
async fn test_kill_all_kills_every_instance() {
    let host = FakeHost::new().with_pids(AGENT, &[812, 913]);

    let killed = kill_all(&host, AGENT).await;

    assert_eq!(killed, vec![812, 913]);
    assert_eq!(*host.killed.lock().unwrap(), vec![812, 913]);
}

#[tokio::test]
async fn test_kill_all_without_process_is_empty() {
    let host = FakeHost::new();
    assert!(kill_all(&host, AGENT).await.is_empty());
}
