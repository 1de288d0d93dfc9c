//! JSON output helpers.
//!
//! `JsonRenderer` prints one pretty JSON document per command on stdout;
//! `format_error` is the error object every `--json` code path uses when a
//! command fails.

use std::path::Path;

use anyhow::{Context, Result};
use serde_json::{Value, json};

use crate::application::services::package::PackageState;
use crate::application::services::reinstall::ReinstallSummary;
use crate::domain::config::ValidatorConfig;
use crate::domain::extension::ExtensionDir;
use crate::domain::poll::PollResult;
use crate::domain::report::ValidationReport;
use crate::domain::status::StatusObservation;

/// Format a JSON error object.
///
/// Output (pretty-printed):
/// ```json
/// {
///   "error": true,
///   "message": "...",
///   "code": "..."
/// }
/// ```
///
/// # Errors
///
/// Returns an error if JSON serialization fails (should not happen in
/// practice — `serde_json` only fails on non-finite floats and maps with
/// non-string keys, neither of which appear here).
pub fn format_error(message: &str, code: &str) -> Result<String> {
    let obj = json!({
        "error": true,
        "message": message,
        "code": code,
    });
    serde_json::to_string_pretty(&obj).context("JSON serialization failed")
}

/// Poll bookkeeping shared by every polled command.
#[must_use]
pub fn poll_fields<T>(result: &PollResult<T>) -> Value {
    json!({
        "outcome": result.outcome.as_str(),
        "attempts": result.attempts,
        "elapsedMs": u64::try_from(result.elapsed.as_millis()).unwrap_or(u64::MAX),
    })
}

/// Status observation as a JSON object.
#[must_use]
pub fn status_value(obs: &StatusObservation) -> Value {
    let kind = match obs {
        StatusObservation::Missing => "missing",
        StatusObservation::Unreadable(_) => "unreadable",
        StatusObservation::Pending(_) => "pending",
        StatusObservation::Succeeded(_) => "succeeded",
        StatusObservation::Failed(_) => "failed",
    };
    let mut value = json!({
        "observation": kind,
        "detail": obs.describe(),
    });
    if let (Some(s), Some(obj)) = (obs.summary(), value.as_object_mut()) {
        obj.insert("file".into(), json!(s.file));
        obj.insert("state".into(), json!(s.state.as_str()));
        obj.insert("operation".into(), json!(s.operation));
        obj.insert("code".into(), json!(s.code));
        obj.insert("message".into(), json!(s.message));
        obj.insert("proxyAgentVersion".into(), json!(s.proxy_agent_version));
        obj.insert("proxyAgentState".into(), json!(s.proxy_agent_state));
        obj.insert("stoppedModules".into(), json!(s.stopped_modules));
    }
    value
}

/// Merge `extra` into the poll bookkeeping object.
fn with_poll<T>(result: &PollResult<T>, extra: Value) -> Value {
    let mut value = poll_fields(result);
    if let (Some(obj), Value::Object(extra)) = (value.as_object_mut(), extra) {
        obj.extend(extra);
    }
    value
}

fn print(value: &Value) -> Result<()> {
    println!(
        "{}",
        serde_json::to_string_pretty(value).context("JSON serialization failed")?
    );
    Ok(())
}

/// Renders command results as JSON on stdout.
pub struct JsonRenderer;

impl JsonRenderer {
    /// Render the CLI version.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn render_version(version: &str) -> Result<()> {
        print(&json!({ "version": version }))
    }

    /// Render a validation report, including the overall verdict.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn render_report(report: &ValidationReport) -> Result<()> {
        println!("{}", report.to_json()?);
        Ok(())
    }

    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn render_locate(result: &PollResult<Option<ExtensionDir>>, waagent_dir: &Path) -> Result<()> {
        let dir = result.last_observed.as_ref();
        print(&with_poll(
            result,
            json!({
                "found": dir.is_some(),
                "path": dir.map(|d| waagent_dir.join(&d.name).display().to_string()),
                "version": dir.and_then(|d| d.version.clone()),
            }),
        ))
    }

    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn render_status(result: &PollResult<StatusObservation>) -> Result<()> {
        print(&with_poll(result, status_value(&result.last_observed)))
    }

    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn render_package(package: &str, result: &PollResult<PackageState>) -> Result<()> {
        print(&with_poll(
            result,
            json!({
                "package": package,
                "installed": result.last_observed.installed,
                "detail": result.last_observed.detail,
            }),
        ))
    }

    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn render_process(name: &str, result: &PollResult<Vec<u32>>) -> Result<()> {
        print(&with_poll(
            result,
            json!({
                "process": name,
                "running": !result.last_observed.is_empty(),
                "pids": result.last_observed,
            }),
        ))
    }

    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn render_reinstall(
        summary: &ReinstallSummary,
        status: Option<&PollResult<StatusObservation>>,
    ) -> Result<()> {
        print(&json!({
            "killed": summary.killed,
            "removedDir": summary.removed_dir.display().to_string(),
            "packagePath": summary.package_path.display().to_string(),
            "bytes": summary.bytes,
            "sha256": summary.sha256,
            "status": status.map(|r| with_poll(r, status_value(&r.last_observed))),
        }))
    }

    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn render_config(config: &ValidatorConfig, path: &Path) -> Result<()> {
        print(&json!({
            "path": path.display().to_string(),
            "config": config,
        }))
    }
}
