//! End-to-end validation of the extension install flow.
//!
//! Runs every step in order and records each one in a [`ValidationReport`].
//! A step that times out does not abort the run; steps that depend on a
//! missing extension directory are recorded as skipped.

use std::path::Path;

use anyhow::{Context, Result};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::application::ports::{FileSystem, GuestHost, HttpClient, ProgressReporter};
use crate::application::services::extension_status::wait_for_extension_status;
use crate::application::services::locate::{
    extension_path, wait_for_extension_dir, wait_for_named_extension_dir,
};
use crate::application::services::package::{detect_os, ensure_package};
use crate::application::services::process::wait_for_process;
use crate::application::services::reinstall::{ReinstallRequest, trigger_reinstall};
use crate::domain::config::ValidatorConfig;
use crate::domain::encoding::redact_url;
use crate::domain::extension::ExtensionDir;
use crate::domain::os::PackageManager;
use crate::domain::poll::{PollConfig, PollOutcome, PollResult};
use crate::domain::report::{Step, StepReport, ValidationReport};
use crate::domain::status::StatusObservation;

/// Caller choices for one validation run.
#[derive(Debug, Clone, Copy, Default)]
pub struct ValidateOptions<'a> {
    /// Decoded URL of the replacement package; the reinstall step runs only
    /// when this is set.
    pub package_url: Option<&'a str>,
    /// After staging the package, wait for the extension to come back.
    pub wait_reinstall: bool,
}

/// Poll configurations of every phase, validated up front.
struct PhasePolls {
    locate: PollConfig,
    status: PollConfig,
    package: PollConfig,
    process: PollConfig,
    reinstall: PollConfig,
}

impl PhasePolls {
    fn from_config(config: &ValidatorConfig) -> Result<Self> {
        let p = &config.poll;
        Ok(Self {
            locate: p.locate.to_poll_config()?,
            status: p.status.to_poll_config()?,
            package: p.package.to_poll_config()?,
            process: p.process.to_poll_config()?,
            reinstall: p.reinstall.to_poll_config()?,
        })
    }
}

fn record(report: &mut ValidationReport, reporter: &impl ProgressReporter, entry: StepReport) {
    if entry.succeeded {
        reporter.success(&format!("{}: {}", entry.step.label(), entry.detail));
    } else {
        reporter.warn(&format!("{}: {}", entry.step.label(), entry.detail));
    }
    info!(step = ?entry.step, succeeded = entry.succeeded, attempts = entry.attempts, "step finished");
    report.steps.push(entry);
}

/// Mark the report cancelled if the poll was cut short or the token fired
/// while the step was still succeeding.
fn note_cancel<T>(
    report: &mut ValidationReport,
    result: &PollResult<T>,
    cancel: &CancellationToken,
) -> bool {
    if result.outcome == PollOutcome::Cancelled || cancel.is_cancelled() {
        report.cancelled = true;
    }
    report.cancelled
}

/// Run the whole validation flow against `host`.
///
/// # Errors
///
/// Returns an error only for invalid poll settings; every host-side failure
/// is recorded in the report instead.
pub async fn run_validation(
    host: &impl GuestHost,
    config: &ValidatorConfig,
    opts: ValidateOptions<'_>,
    reporter: &impl ProgressReporter,
    cancel: &CancellationToken,
    timestamp: String,
) -> Result<ValidationReport> {
    let polls = PhasePolls::from_config(config)?;
    let waagent_dir = Path::new(&config.waagent_dir);
    let mut report = ValidationReport::new(timestamp);

    let os = match detect_os(host).await {
        Ok(os) => {
            report.os = Some(os.pretty_name.clone());
            Ok(os)
        }
        Err(e) => {
            warn!(error = %e, "cannot identify operating system");
            Err(e)
        }
    };

    // ── Extension directory ─────────────────────────────────────────────────
    reporter.step(&format!(
        "looking for {} under {}...",
        config.extension_prefix, config.waagent_dir
    ));
    let located = wait_for_extension_dir(
        host,
        waagent_dir,
        &config.extension_prefix,
        &polls.locate,
        Some(cancel),
    )
    .await;
    let extension: Option<ExtensionDir> = located.last_observed.clone();
    let detail = extension.as_ref().map_or_else(
        || "no matching directory".to_string(),
        |d| extension_path(waagent_dir, d).display().to_string(),
    );
    record(
        &mut report,
        reporter,
        StepReport::from_poll(Step::LocateExtension, &located, located.succeeded(), detail),
    );
    if let Some(dir) = &extension {
        report.extension_dir = Some(extension_path(waagent_dir, dir).display().to_string());
        report.extension_version.clone_from(&dir.version);
    }
    if note_cancel(&mut report, &located, cancel) {
        return Ok(report);
    }

    // ── Extension status ────────────────────────────────────────────────────
    if let Some(dir) = &extension {
        reporter.step("waiting for extension status...");
        let status = wait_for_extension_status(
            host,
            &extension_path(waagent_dir, dir),
            &polls.status,
            Some(cancel),
        )
        .await;
        if let Some(summary) = status.last_observed.summary() {
            report.proxy_agent_version.clone_from(&summary.proxy_agent_version);
            if !summary.stopped_modules.is_empty() {
                reporter.warn(&format!(
                    "proxy agent modules not running: {}",
                    summary.stopped_modules.join(", ")
                ));
            }
        }
        let ok = status.last_observed.is_success();
        let detail = status.last_observed.describe();
        record(
            &mut report,
            reporter,
            StepReport::from_poll(Step::ExtensionStatus, &status, ok, detail),
        );
        if note_cancel(&mut report, &status, cancel) {
            return Ok(report);
        }
    } else {
        record(
            &mut report,
            reporter,
            StepReport::skipped(Step::ExtensionStatus, "extension directory not found"),
        );
    }

    // ── Helper package ──────────────────────────────────────────────────────
    let pm = os.and_then(|os| PackageManager::detect(&os).map_err(anyhow::Error::from));
    match pm {
        Ok(pm) => {
            reporter.step(&format!(
                "ensuring {} is installed ({})...",
                config.helper_package,
                pm.name()
            ));
            let pkg = ensure_package(
                host,
                pm,
                &config.helper_package,
                config.use_sudo,
                &polls.package,
                Some(cancel),
            )
            .await;
            let detail = pkg.last_observed.detail.clone();
            record(
                &mut report,
                reporter,
                StepReport::from_poll(Step::HelperPackage, &pkg, pkg.succeeded(), detail),
            );
            if note_cancel(&mut report, &pkg, cancel) {
                return Ok(report);
            }
        }
        Err(e) => {
            record(
                &mut report,
                reporter,
                StepReport {
                    step: Step::HelperPackage,
                    succeeded: false,
                    attempts: 0,
                    elapsed_ms: 0,
                    detail: format!("{e:#}"),
                },
            );
            if cancel.is_cancelled() {
                report.cancelled = true;
                return Ok(report);
            }
        }
    }

    // ── Companion process ───────────────────────────────────────────────────
    reporter.step(&format!("checking {} is running...", config.process_name));
    let process = wait_for_process(host, &config.process_name, &polls.process, Some(cancel)).await;
    report.process_ids.clone_from(&process.last_observed);
    let detail = if process.last_observed.is_empty() {
        format!("{} not running", config.process_name)
    } else {
        format!("{} running (pid {:?})", config.process_name, process.last_observed)
    };
    record(
        &mut report,
        reporter,
        StepReport::from_poll(Step::CompanionProcess, &process, process.succeeded(), detail),
    );
    if note_cancel(&mut report, &process, cancel) {
        return Ok(report);
    }

    // ── Reinstall ───────────────────────────────────────────────────────────
    let Some(package_url) = opts.package_url else {
        info!("no replacement package URL, reinstall not requested");
        return Ok(report);
    };
    let Some(dir) = &extension else {
        record(
            &mut report,
            reporter,
            StepReport::skipped(Step::Reinstall, "extension directory not found"),
        );
        return Ok(report);
    };
    if cancel.is_cancelled() {
        report.cancelled = true;
        return Ok(report);
    }

    let entry = reinstall_step(
        host,
        config,
        dir,
        package_url,
        opts.wait_reinstall,
        &polls,
        reporter,
        cancel,
        &mut report,
    )
    .await;
    record(&mut report, reporter, entry);
    Ok(report)
}

#[allow(clippy::too_many_arguments)]
async fn reinstall_step(
    host: &impl GuestHost,
    config: &ValidatorConfig,
    dir: &ExtensionDir,
    package_url: &str,
    wait: bool,
    polls: &PhasePolls,
    reporter: &impl ProgressReporter,
    cancel: &CancellationToken,
    report: &mut ValidationReport,
) -> StepReport {
    let started = Instant::now();
    let waagent_dir = Path::new(&config.waagent_dir);
    let req = ReinstallRequest {
        waagent_dir,
        extension: dir,
        process_name: &config.process_name,
        package_url,
        limit_bytes: config.download_limit_mb.saturating_mul(1024 * 1024),
    };
    let elapsed_ms =
        |started: Instant| u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);

    let summary = match trigger_reinstall(host, &req, reporter).await {
        Ok(summary) => summary,
        Err(e) => {
            return StepReport {
                step: Step::Reinstall,
                succeeded: false,
                attempts: 1,
                elapsed_ms: elapsed_ms(started),
                detail: format!("{e:#}"),
            };
        }
    };
    report.downloaded_bytes = Some(summary.bytes);
    report.package_sha256 = Some(summary.sha256.clone());

    if !wait {
        return StepReport {
            step: Step::Reinstall,
            succeeded: true,
            attempts: 1,
            elapsed_ms: elapsed_ms(started),
            detail: format!("staged {}", summary.package_path.display()),
        };
    }

    reporter.step("waiting for the extension to be reinstalled...");
    let located = wait_for_named_extension_dir(
        host,
        waagent_dir,
        &config.extension_prefix,
        &dir.name,
        &polls.reinstall,
        Some(cancel),
    )
    .await;
    let Some(new_dir) = located.last_observed.clone() else {
        note_cancel(report, &located, cancel);
        return StepReport::from_poll(
            Step::Reinstall,
            &located,
            false,
            "extension directory did not reappear".to_string(),
        );
    };

    let status = wait_for_extension_status(
        host,
        &extension_path(waagent_dir, &new_dir),
        &polls.reinstall,
        Some(cancel),
    )
    .await;
    note_cancel(report, &status, cancel);
    let ok = matches!(status.last_observed, StatusObservation::Succeeded(_));
    StepReport {
        step: Step::Reinstall,
        succeeded: ok,
        attempts: located.attempts.saturating_add(status.attempts),
        elapsed_ms: elapsed_ms(started),
        detail: format!("{}: {}", new_dir.name, status.last_observed.describe()),
    }
}

/// Write the report to `path` and upload it to `upload_url`, when given.
///
/// Uploads use `PUT` with `x-ms-blob-type: BlockBlob` so a blob SAS URL
/// can be used directly.
///
/// # Errors
///
/// Returns an error if serialization, the write, or the upload fails.
pub async fn publish_report(
    host: &(impl FileSystem + HttpClient),
    report: &ValidationReport,
    path: Option<&Path>,
    upload_url: Option<&str>,
) -> Result<()> {
    let json = report.to_json()?;
    if let Some(path) = path {
        host.write_atomic(path, json.as_bytes())
            .await
            .with_context(|| format!("writing report to {}", path.display()))?;
        info!(path = %path.display(), "report written");
    }
    if let Some(url) = upload_url {
        host.put(
            url,
            &[("x-ms-blob-type", "BlockBlob"), ("Content-Type", "application/json")],
            json.into_bytes(),
        )
        .await
        .with_context(|| format!("uploading report to {}", redact_url(url)))?;
        info!(url = %redact_url(url), "report uploaded");
    }
    Ok(())
}
