//! Integration tests for the guest-facing commands against a temp directory
//! standing in for the guest agent library directory.

#![allow(clippy::expect_used)]

use std::path::Path;

use crate::cli_tests::extcheck;

const EXT_DIR: &str = "Microsoft.CPlat.ProxyAgent.ProxyAgentLinux-1.0.20";

const SUCCESS_STATUS: &str = r#"[{"version":"1.0","timestampUTC":"2024-05-01T10:00:00Z","status":{"name":"ProxyAgentLinux","operation":"Enable","status":"success","code":0,"formattedMessage":{"lang":"en-US","message":"enabled"}}}]"#;

/// Write a config pointing at `waagent` with one-second polls.
fn write_config(dir: &Path, waagent: &Path) -> std::path::PathBuf {
    let path = dir.join("config.yaml");
    let poll = "{ interval_secs: 1, timeout_secs: 1 }";
    let yaml = format!(
        "waagent_dir: {}\nprocess_name: extcheck-test-no-such-process\npoll:\n  locate: {poll}\n  status: {poll}\n  process: {poll}\n",
        waagent.display()
    );
    std::fs::write(&path, yaml).expect("write config");
    path
}

fn json_stdout(cmd: &mut assert_cmd::Command, code: i32) -> serde_json::Value {
    let output = cmd.assert().code(code).get_output().stdout.clone();
    serde_json::from_slice(&output).expect("valid JSON")
}

#[test]
fn test_locate_finds_extension_dir() {
    let dir = tempfile::tempdir().expect("tempdir");
    let waagent = dir.path().join("waagent");
    std::fs::create_dir_all(waagent.join(EXT_DIR)).expect("mkdir");
    std::fs::create_dir_all(waagent.join("Microsoft.CPlat.ProxyAgent.ProxyAgentLinux-1.0.9"))
        .expect("mkdir");
    let config = write_config(dir.path(), &waagent);

    let value = json_stdout(
        extcheck()
            .args(["--json", "locate", "--config"])
            .arg(&config),
        0,
    );

    assert_eq!(value["found"], true);
    assert_eq!(value["version"], "1.0.20");
    assert_eq!(value["outcome"], "succeeded");
}

#[test]
fn test_locate_times_out_without_extension() {
    let dir = tempfile::tempdir().expect("tempdir");
    let waagent = dir.path().join("waagent");
    std::fs::create_dir_all(&waagent).expect("mkdir");
    let config = write_config(dir.path(), &waagent);

    let value = json_stdout(
        extcheck()
            .args(["--json", "locate", "--config"])
            .arg(&config),
        1,
    );

    assert_eq!(value["found"], false);
    assert_eq!(value["outcome"], "timed out");
    assert_eq!(value["attempts"], 1);
}

#[test]
fn test_status_reads_latest_status_file() {
    let dir = tempfile::tempdir().expect("tempdir");
    let waagent = dir.path().join("waagent");
    let status_dir = waagent.join(EXT_DIR).join("status");
    std::fs::create_dir_all(&status_dir).expect("mkdir");
    std::fs::write(status_dir.join("0.status"), "[]").expect("write");
    std::fs::write(status_dir.join("1.status"), SUCCESS_STATUS).expect("write");
    let config = write_config(dir.path(), &waagent);

    let value = json_stdout(
        extcheck()
            .args(["--json", "status", "--config"])
            .arg(&config),
        0,
    );

    assert_eq!(value["observation"], "succeeded");
    assert_eq!(value["file"], "1.status");
    assert_eq!(value["message"], "enabled");
}

#[test]
fn test_check_process_missing_process_fails() {
    let dir = tempfile::tempdir().expect("tempdir");
    let config = write_config(dir.path(), &dir.path().join("waagent"));

    let value = json_stdout(
        extcheck()
            .args(["--json", "check-process", "--config"])
            .arg(&config),
        1,
    );

    assert_eq!(value["running"], false);
    assert_eq!(value["process"], "extcheck-test-no-such-process");
}

#[test]
fn test_reinstall_without_extension_reports_not_found() {
    let dir = tempfile::tempdir().expect("tempdir");
    let waagent = dir.path().join("waagent");
    std::fs::create_dir_all(&waagent).expect("mkdir");
    let config = write_config(dir.path(), &waagent);

    // "https://example.com/pkg.zip"
    let value = json_stdout(
        extcheck()
            .args(["--json", "reinstall", "--package-url", "aHR0cHM6Ly9leGFtcGxlLmNvbS9wa2cuemlw", "--config"])
            .arg(&config),
        1,
    );

    assert_eq!(value["code"], "EXTENSION_NOT_FOUND");
}
