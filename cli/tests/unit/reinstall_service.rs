//! Cleanup and re-triggered installation against a fake guest.

#![allow(clippy::unwrap_used)]

use std::path::{Path, PathBuf};
use std::time::Duration;

use extcheck_cli::application::services::locate::wait_for_named_extension_dir;
use extcheck_cli::application::services::reinstall::{ReinstallRequest, trigger_reinstall};
use extcheck_cli::domain::extension::ExtensionDir;
use extcheck_cli::domain::poll::{PollConfig, PollOutcome};

use crate::helpers::{EXT_DIR, PREFIX, WAAGENT, ext_path, handler_status, status_path};
use crate::mocks::{FakeHost, RecordingReporter};

const URL: &str = "https://example.blob.core.windows.net/pkg/ProxyAgent.zip?sig=secret";
const AGENT: &str = "azure-proxy-agent";

fn extension() -> ExtensionDir {
    ExtensionDir {
        name: EXT_DIR.to_string(),
        version: Some("1.0.20".to_string()),
    }
}

fn request<'a>(ext: &'a ExtensionDir, limit_bytes: u64) -> ReinstallRequest<'a> {
    ReinstallRequest {
        waagent_dir: Path::new(WAAGENT),
        extension: ext,
        process_name: AGENT,
        package_url: URL,
        limit_bytes,
    }
}

#[tokio::test]
async fn test_reinstall_stops_removes_and_stages_package() {
    let host = FakeHost::new()
        .with_file(&status_path(0), &handler_status("success", "enabled"))
        .with_pids(AGENT, &[812])
        .with_download(URL, b"PK\x03\x04zip");
    let reporter = RecordingReporter::default();
    let ext = extension();

    let summary = trigger_reinstall(&host, &request(&ext, 1024), &reporter)
        .await
        .unwrap();

    assert_eq!(summary.killed, vec![812]);
    assert_eq!(summary.removed_dir, PathBuf::from(ext_path()));
    assert_eq!(
        summary.package_path,
        Path::new(WAAGENT).join(format!("{EXT_DIR}.zip"))
    );
    assert_eq!(summary.bytes, 7);
    assert_eq!(summary.sha256.len(), 64);
    assert_eq!(*host.removed.lock().unwrap(), vec![PathBuf::from(ext_path())]);
    let written = host.written.lock().unwrap();
    assert_eq!(written.len(), 1);
    assert_eq!(written[0].1, b"PK\x03\x04zip");
}

#[tokio::test]
async fn test_reinstall_never_logs_sas_token() {
    let host = FakeHost::new().with_download(URL, b"PK");
    let reporter = RecordingReporter::default();
    let ext = extension();

    trigger_reinstall(&host, &request(&ext, 1024), &reporter)
        .await
        .unwrap();

    let messages = reporter.messages.lock().unwrap();
    assert!(messages.iter().all(|m| !m.contains("sig=secret")), "{messages:?}");
}

#[tokio::test]
async fn test_reinstall_without_process_only_warns() {
    let host = FakeHost::new().with_download(URL, b"PK");
    let reporter = RecordingReporter::default();
    let ext = extension();

    let summary = trigger_reinstall(&host, &request(&ext, 1024), &reporter)
        .await
        .unwrap();

    assert!(summary.killed.is_empty());
    assert!(reporter.warnings().iter().any(|w| w.contains(AGENT)));
}

#[tokio::test]
async fn test_reinstall_download_failure_is_error() {
    let host = FakeHost::new();
    let reporter = RecordingReporter::default();
    let ext = extension();

    let err = trigger_reinstall(&host, &request(&ext, 1024), &reporter)
        .await
        .unwrap_err();

    assert!(format!("{err:#}").contains("downloading"));
    assert!(host.written.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_reinstall_rejects_oversized_package() {
    let host = FakeHost::new().with_download(URL, &[0u8; 64]);
    let reporter = RecordingReporter::default();
    let ext = extension();

    let err = trigger_reinstall(&host, &request(&ext, 16), &reporter)
        .await
        .unwrap_err();

    assert!(format!("{err:#}").contains("exceeds"));
}

#[tokio::test]
async fn test_reinstall_rejects_empty_package() {
    let host = FakeHost::new().with_download(URL, b"");
    let reporter = RecordingReporter::default();
    let ext = extension();

    let err = trigger_reinstall(&host, &request(&ext, 16), &reporter)
        .await
        .unwrap_err();

    assert!(err.to_string().contains("empty"));
}

fn older_version_dir() -> String {
    format!("{WAAGENT}/{PREFIX}-1.0.9")
}

fn reinstall_poll() -> PollConfig {
    PollConfig::new(Duration::from_secs(1), Duration::from_secs(3)).unwrap()
}

#[tokio::test]
async fn test_reinstall_leaves_other_versions_alone() {
    let host = FakeHost::new()
        .with_file(&status_path(0), &handler_status("success", "enabled"))
        .with_file(
            &format!("{}/status/0.status", older_version_dir()),
            &handler_status("success", "old"),
        )
        .with_download(URL, b"PK");
    let reporter = RecordingReporter::default();
    let ext = extension();

    trigger_reinstall(&host, &request(&ext, 1024), &reporter)
        .await
        .unwrap();

    assert_eq!(*host.removed.lock().unwrap(), vec![PathBuf::from(ext_path())]);
}

#[tokio::test(start_paused = true)]
async fn test_wait_after_reinstall_ignores_older_version() {
    let host = FakeHost::new()
        .with_dir(&ext_path())
        .with_dir(&older_version_dir())
        .with_download(URL, b"PK");
    let reporter = RecordingReporter::default();
    let ext = extension();
    trigger_reinstall(&host, &request(&ext, 1024), &reporter)
        .await
        .unwrap();

    let result = wait_for_named_extension_dir(
        &host,
        Path::new(WAAGENT),
        PREFIX,
        &ext.name,
        &reinstall_poll(),
        None,
    )
    .await;

    assert_eq!(result.outcome, PollOutcome::TimedOut);
    assert!(result.last_observed.is_none());
    assert_eq!(result.attempts, 3);
}

#[tokio::test(start_paused = true)]
async fn test_wait_after_reinstall_sees_reextracted_directory() {
    let host = FakeHost::new()
        .with_dir(&ext_path())
        .with_dir(&older_version_dir())
        .with_download(URL, b"PK")
        .reextracting();
    let reporter = RecordingReporter::default();
    let ext = extension();
    trigger_reinstall(&host, &request(&ext, 1024), &reporter)
        .await
        .unwrap();

    let result = wait_for_named_extension_dir(
        &host,
        Path::new(WAAGENT),
        PREFIX,
        &ext.name,
        &reinstall_poll(),
        None,
    )
    .await;

    assert_eq!(result.outcome, PollOutcome::Succeeded);
    assert_eq!(result.last_observed.unwrap().name, EXT_DIR);
}
