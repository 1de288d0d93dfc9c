//! `extcheck validate` — the full install validation flow.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use chrono::{SecondsFormat, Utc};
use clap::Args;
use tracing::info;

use crate::app::AppContext;
use crate::application::services::config_service;
use crate::application::services::validate::{ValidateOptions, publish_report, run_validation};
use crate::commands::verdict;
use crate::domain::encoding::decode_base64_url;

/// Arguments for the validate command.
#[derive(Args)]
pub struct ValidateArgs {
    /// Base64-encoded URL of a replacement extension package
    #[arg(long, value_name = "BASE64")]
    pub package_url: Option<String>,

    /// Write the JSON report to this file
    #[arg(long, value_name = "PATH")]
    pub report: Option<PathBuf>,

    /// Base64-encoded URL the JSON report is uploaded to (HTTP PUT)
    #[arg(long, value_name = "BASE64")]
    pub report_url: Option<String>,

    /// Do not reinstall even when a package URL is given
    #[arg(long)]
    pub skip_reinstall: bool,

    /// After reinstalling, wait for the extension to come back
    #[arg(long)]
    pub wait_reinstall: bool,
}

/// Run the validate command.
///
/// Exits 0 only when every step succeeded.
///
/// # Errors
///
/// Returns an error for invalid URLs or settings, or if the report cannot
/// be written or uploaded.
pub async fn run(app: &AppContext, args: ValidateArgs) -> Result<ExitCode> {
    // Decode before touching the guest so a bad argument fails fast.
    let package_url = args
        .package_url
        .as_deref()
        .map(decode_base64_url)
        .transpose()?;
    let report_url = args
        .report_url
        .as_deref()
        .map(decode_base64_url)
        .transpose()?;
    let config = config_service::load_config(&app.config_store)?;

    let package_url = if args.skip_reinstall {
        if package_url.is_some() {
            info!("reinstall skipped on request");
        }
        None
    } else {
        package_url
    };
    let opts = ValidateOptions {
        package_url: package_url.as_deref(),
        wait_reinstall: args.wait_reinstall,
    };
    let timestamp = Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true);
    let reporter = app.reporter();

    let report = run_validation(&app.host, &config, opts, &reporter, &app.cancel, timestamp).await?;
    app.renderer().render_report(&report)?;
    publish_report(
        &app.host,
        &report,
        args.report.as_deref(),
        report_url.as_deref(),
    )
    .await?;

    Ok(verdict(report.succeeded()))
}
