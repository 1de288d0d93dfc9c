//! `extcheck ensure-package`

use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Args;

use crate::app::AppContext;
use crate::application::ports::ProgressReporter;
use crate::application::services::config_service;
use crate::application::services::package::{detect_os, ensure_package};
use crate::commands::verdict;
use crate::domain::os::{PackageManager, validate_package_name};

/// Arguments for the ensure-package command.
#[derive(Args)]
pub struct EnsurePackageArgs {
    /// Package to install (default: `helper_package` from config)
    pub name: Option<String>,
}

/// Install the package with the distribution's package manager if missing.
///
/// # Errors
///
/// Returns an error if the package name is invalid, or the OS cannot be
/// identified or has no supported package manager.
pub async fn run(app: &AppContext, args: EnsurePackageArgs) -> Result<ExitCode> {
    let config = config_service::load_config(&app.config_store)?;
    let poll = config.poll.package.to_poll_config()?;
    let package = args.name.unwrap_or_else(|| config.helper_package.clone());
    validate_package_name(&package)?;

    let os = detect_os(&app.host).await?;
    let pm = PackageManager::detect(&os).context("choosing a package manager")?;
    app.reporter()
        .step(&format!("ensuring {package} is installed ({}, {})...", pm.name(), os.pretty_name));

    let result = ensure_package(
        &app.host,
        pm,
        &package,
        config.use_sudo,
        &poll,
        Some(&app.cancel),
    )
    .await;
    app.renderer().render_package(&package, &result)?;
    Ok(verdict(result.succeeded()))
}
