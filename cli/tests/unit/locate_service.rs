//! Extension directory discovery against a fake guest.

#![allow(clippy::unwrap_used)]

use std::path::Path;
use std::time::Duration;

use extcheck_cli::application::services::locate::{
    extension_path, locate_extension_dir, wait_for_extension_dir,
};
use extcheck_cli::domain::poll::{PollConfig, PollOutcome};

use crate::helpers::{EXT_DIR, PREFIX, WAAGENT};
use crate::mocks::FakeHost;

fn poll(interval: u64, timeout: u64) -> PollConfig {
    PollConfig::new(Duration::from_secs(interval), Duration::from_secs(timeout)).unwrap()
}

#[tokio::test]
async fn test_locate_picks_highest_version() {
    let host = FakeHost::new()
        .with_dir(&format!("{WAAGENT}/{PREFIX}-1.0.9"))
        .with_dir(&format!("{WAAGENT}/{PREFIX}-1.0.20"))
        .with_dir(&format!("{WAAGENT}/Microsoft.Azure.Extensions.CustomScript-2.1.10"));

    let dir = locate_extension_dir(&host, Path::new(WAAGENT), PREFIX)
        .await
        .unwrap()
        .unwrap();

    assert_eq!(dir.name, EXT_DIR);
    assert_eq!(dir.version.as_deref(), Some("1.0.20"));
}

#[tokio::test]
async fn test_locate_ignores_package_zips() {
    let host = FakeHost::new().with_file(&format!("{WAAGENT}/{EXT_DIR}.zip"), "PK");

    let dir = locate_extension_dir(&host, Path::new(WAAGENT), PREFIX)
        .await
        .unwrap();

    assert!(dir.is_none());
}

#[tokio::test]
async fn test_locate_missing_waagent_dir_is_none() {
    let host = FakeHost::new();
    let dir = locate_extension_dir(&host, Path::new(WAAGENT), PREFIX)
        .await
        .unwrap();
    assert!(dir.is_none());
}

#[tokio::test(start_paused = true)]
async fn test_wait_times_out_when_extension_never_appears() {
    let host = FakeHost::new().with_dir(WAAGENT);

    let result =
        wait_for_extension_dir(&host, Path::new(WAAGENT), PREFIX, &poll(5, 15), None).await;

    assert_eq!(result.outcome, PollOutcome::TimedOut);
    assert!(result.last_observed.is_none());
    assert_eq!(result.attempts, 3);
}

#[tokio::test(start_paused = true)]
async fn test_wait_returns_on_first_observation() {
    let host = FakeHost::new().with_dir(&format!("{WAAGENT}/{EXT_DIR}"));

    let result =
        wait_for_extension_dir(&host, Path::new(WAAGENT), PREFIX, &poll(5, 15), None).await;

    assert_eq!(result.outcome, PollOutcome::Succeeded);
    assert_eq!(result.attempts, 1);
    assert_eq!(result.elapsed, Duration::ZERO);
}

#[test]
fn test_extension_path_joins_name() {
    let host_dir = extcheck_cli::domain::extension::ExtensionDir {
        name: EXT_DIR.to_string(),
        version: Some("1.0.20".to_string()),
    };
    assert_eq!(
        extension_path(Path::new(WAAGENT), &host_dir),
        Path::new(WAAGENT).join(EXT_DIR)
    );
}
