//! `extcheck reinstall` — clean up and re-trigger the extension install.

use std::path::Path;
use std::process::ExitCode;

use anyhow::Result;
use clap::Args;

use crate::app::AppContext;
use crate::application::ports::ProgressReporter;
use crate::application::services::config_service;
use crate::application::services::extension_status::wait_for_extension_status;
use crate::application::services::locate::{
    extension_path, locate_extension_dir, wait_for_named_extension_dir,
};
use crate::application::services::reinstall::{ReinstallRequest, trigger_reinstall};
use crate::commands::verdict;
use crate::domain::encoding::decode_base64_url;
use crate::domain::error::HostError;
use crate::output::human::outcome_line;

/// Arguments for the reinstall command.
#[derive(Args)]
pub struct ReinstallArgs {
    /// Base64-encoded URL of the replacement extension package
    #[arg(long, value_name = "BASE64")]
    pub package_url: String,

    /// Wait for the guest agent to reinstall and report success
    #[arg(long)]
    pub wait: bool,
}

/// Run the reinstall command.
///
/// # Errors
///
/// Returns an error if the URL is invalid, no extension is installed, or
/// the replacement package cannot be staged.
pub async fn run(app: &AppContext, args: ReinstallArgs) -> Result<ExitCode> {
    let package_url = decode_base64_url(&args.package_url)?;
    let config = config_service::load_config(&app.config_store)?;
    let reinstall_poll = config.poll.reinstall.to_poll_config()?;
    let waagent_dir = Path::new(&config.waagent_dir);

    let dir = locate_extension_dir(&app.host, waagent_dir, &config.extension_prefix)
        .await?
        .ok_or_else(|| HostError::ExtensionNotFound(config.waagent_dir.clone()))?;

    let req = ReinstallRequest {
        waagent_dir,
        extension: &dir,
        process_name: &config.process_name,
        package_url: &package_url,
        limit_bytes: config.download_limit_mb.saturating_mul(1024 * 1024),
    };
    anyhow::ensure!(!app.cancel.is_cancelled(), "interrupted before reinstall");
    let reporter = app.reporter();
    let summary = trigger_reinstall(&app.host, &req, &reporter).await?;

    if !args.wait {
        app.renderer().render_reinstall(&summary, None)?;
        return Ok(ExitCode::SUCCESS);
    }

    reporter.step("waiting for the extension to be reinstalled...");
    let located = wait_for_named_extension_dir(
        &app.host,
        waagent_dir,
        &config.extension_prefix,
        &dir.name,
        &reinstall_poll,
        Some(&app.cancel),
    )
    .await;
    let Some(new_dir) = &located.last_observed else {
        reporter.warn(&format!(
            "extension directory did not reappear ({})",
            outcome_line(&located)
        ));
        app.renderer().render_reinstall(&summary, None)?;
        return Ok(ExitCode::FAILURE);
    };
    let status = wait_for_extension_status(
        &app.host,
        &extension_path(waagent_dir, new_dir),
        &reinstall_poll,
        Some(&app.cancel),
    )
    .await;
    app.renderer().render_reinstall(&summary, Some(&status))?;
    Ok(verdict(status.last_observed.is_success()))
}
