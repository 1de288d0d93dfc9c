//! Cleanup and re-triggered installation.
//!
//! Stops the companion process, removes the extracted extension and drops a
//! replacement package where the guest agent expects the extension zip, so
//! the agent extracts and enables it again.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use sha2::{Digest, Sha256};
use tracing::info;

use crate::application::ports::{FileSystem, HttpClient, ProcessTable, ProgressReporter};
use crate::application::services::process::kill_all;
use crate::domain::encoding::{hex_encode, redact_url};
use crate::domain::extension::ExtensionDir;

/// Inputs of one reinstall.
pub struct ReinstallRequest<'a> {
    /// Guest agent library directory.
    pub waagent_dir: &'a Path,
    /// Extension being replaced.
    pub extension: &'a ExtensionDir,
    /// Companion process to stop first.
    pub process_name: &'a str,
    /// Decoded download URL of the replacement package.
    pub package_url: &'a str,
    /// Upper bound on the download size.
    pub limit_bytes: u64,
}

/// What a reinstall did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReinstallSummary {
    pub killed: Vec<u32>,
    pub removed_dir: PathBuf,
    pub package_path: PathBuf,
    pub bytes: u64,
    pub sha256: String,
}

/// Clean up the installed extension and stage the replacement package.
///
/// # Errors
///
/// Returns an error if the extension directory cannot be removed, or the
/// package cannot be downloaded or written. Failing to kill the companion
/// process is only a warning.
pub async fn trigger_reinstall(
    host: &(impl FileSystem + HttpClient + ProcessTable),
    req: &ReinstallRequest<'_>,
    reporter: &impl ProgressReporter,
) -> Result<ReinstallSummary> {
    reporter.step(&format!("stopping {}...", req.process_name));
    let killed = kill_all(host, req.process_name).await;
    if killed.is_empty() {
        reporter.warn(&format!("no running {} process to stop", req.process_name));
    } else {
        reporter.success(&format!("stopped {} (pid {killed:?})", req.process_name));
    }

    let removed_dir = req.waagent_dir.join(&req.extension.name);
    reporter.step(&format!("removing {}...", removed_dir.display()));
    host.remove_dir_all(&removed_dir)
        .await
        .with_context(|| format!("removing {}", removed_dir.display()))?;

    let url_for_logs = redact_url(req.package_url);
    reporter.step(&format!("downloading {url_for_logs}..."));
    let data = host
        .fetch(req.package_url, req.limit_bytes)
        .await
        .with_context(|| format!("downloading {url_for_logs}"))?;
    anyhow::ensure!(!data.is_empty(), "downloaded package from {url_for_logs} is empty");

    let sha256 = hex_encode(&Sha256::digest(&data));
    let package_path = req.waagent_dir.join(req.extension.package_file_name());
    host.write_atomic(&package_path, &data)
        .await
        .with_context(|| format!("writing {}", package_path.display()))?;

    let bytes = data.len() as u64;
    info!(path = %package_path.display(), bytes, sha256 = %sha256, "replacement package staged");
    reporter.success(&format!("staged {} ({bytes} bytes)", package_path.display()));

    Ok(ReinstallSummary {
        killed,
        removed_dir,
        package_path,
        bytes,
        sha256,
    })
}
