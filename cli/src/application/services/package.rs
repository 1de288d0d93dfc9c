//! OS detection and helper package installation.

use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::application::poll::poll_until;
use crate::application::ports::{CommandRunner, FileSystem};
use crate::domain::os::{
    CommandLine, OS_RELEASE_PATH, OsRelease, PackageManager, parse_hostnamectl, parse_os_release,
    validate_package_name,
};
use crate::domain::poll::{PollConfig, PollResult};

/// Package manager commands can be slow on a cold mirror.
const INSTALL_TIMEOUT: Duration = Duration::from_secs(300);

/// Identify the guest's distribution.
///
/// Reads `/etc/os-release` and falls back to `hostnamectl` when the file is
/// missing or unusable.
///
/// # Errors
///
/// Returns an error if neither source identifies the distribution.
pub async fn detect_os(host: &(impl CommandRunner + FileSystem)) -> Result<OsRelease> {
    match host.read_to_string(Path::new(OS_RELEASE_PATH)).await {
        Ok(Some(content)) => match parse_os_release(&content) {
            Ok(os) => return Ok(os),
            Err(e) => debug!(error = %e, "os-release unusable, trying hostnamectl"),
        },
        Ok(None) => debug!("no os-release file, trying hostnamectl"),
        Err(e) => debug!(error = %e, "cannot read os-release, trying hostnamectl"),
    }

    let output = host
        .run("hostnamectl", &[])
        .await
        .context("running hostnamectl")?;
    anyhow::ensure!(
        output.status.success(),
        "hostnamectl failed: {}",
        String::from_utf8_lossy(&output.stderr).trim()
    );
    Ok(parse_hostnamectl(&String::from_utf8_lossy(&output.stdout))?)
}

/// Query whether `package` is installed.
///
/// # Errors
///
/// Returns an error if the name is not a valid package name or the query
/// command cannot be run.
pub async fn is_installed(
    runner: &impl CommandRunner,
    pm: PackageManager,
    package: &str,
) -> Result<bool> {
    validate_package_name(package)?;
    let cmd = pm.query_command(package);
    let output = runner
        .run(&cmd.program, &cmd.arg_refs())
        .await
        .with_context(|| format!("running {cmd}"))?;
    Ok(pm.is_installed(
        output.status.success(),
        &String::from_utf8_lossy(&output.stdout),
    ))
}

async fn run_install_step(runner: &impl CommandRunner, cmd: &CommandLine) -> Result<()> {
    info!(command = %cmd, "running package manager");
    let output = runner
        .run_with_timeout(&cmd.program, &cmd.arg_refs(), INSTALL_TIMEOUT)
        .await
        .with_context(|| format!("running {cmd}"))?;
    anyhow::ensure!(
        output.status.success(),
        "{cmd} exited with {}: {}",
        output.status,
        String::from_utf8_lossy(&output.stderr).trim()
    );
    Ok(())
}

/// Install `package` non-interactively.
///
/// # Errors
///
/// Returns an error if the name is not a valid package name or the install
/// command fails. A failed metadata refresh is only logged.
pub async fn install(
    runner: &impl CommandRunner,
    pm: PackageManager,
    package: &str,
    use_sudo: bool,
) -> Result<()> {
    validate_package_name(package)?;
    if let Some(refresh) = pm.refresh_command() {
        if let Err(e) = run_install_step(runner, &refresh.with_sudo(use_sudo)).await {
            warn!(error = %e, "package metadata refresh failed");
        }
    }
    run_install_step(runner, &pm.install_command(package).with_sudo(use_sudo)).await
}

/// Package state after one observation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageState {
    pub installed: bool,
    pub detail: String,
}

async fn observe_package(
    runner: &impl CommandRunner,
    pm: PackageManager,
    package: &str,
    use_sudo: bool,
) -> PackageState {
    match is_installed(runner, pm, package).await {
        Ok(true) => {
            return PackageState {
                installed: true,
                detail: format!("{package} already installed"),
            };
        }
        Ok(false) => {}
        Err(e) => warn!(error = %e, package, "package query failed"),
    }

    if let Err(e) = install(runner, pm, package, use_sudo).await {
        return PackageState {
            installed: false,
            detail: format!("{e:#}"),
        };
    }

    match is_installed(runner, pm, package).await {
        Ok(true) => PackageState {
            installed: true,
            detail: format!("{package} installed with {}", pm.name()),
        },
        Ok(false) => PackageState {
            installed: false,
            detail: format!("{package} still missing after {} install", pm.name()),
        },
        Err(e) => PackageState {
            installed: false,
            detail: format!("{e:#}"),
        },
    }
}

/// Make sure `package` is installed, retrying the install on every attempt.
pub async fn ensure_package(
    runner: &impl CommandRunner,
    pm: PackageManager,
    package: &str,
    use_sudo: bool,
    poll: &PollConfig,
    cancel: Option<&CancellationToken>,
) -> PollResult<PackageState> {
    poll_until(
        || observe_package(runner, pm, package, use_sudo),
        |s| s.installed,
        poll,
        cancel,
    )
    .await
}
