//! `extcheck check-process`

use std::process::ExitCode;

use anyhow::Result;
use clap::Args;

use crate::app::AppContext;
use crate::application::services::config_service;
use crate::application::services::process::wait_for_process;
use crate::commands::{finish_spinner, verdict, wait_spinner};

/// Arguments for the check-process command.
#[derive(Args)]
pub struct CheckProcessArgs {
    /// Process name (default: `process_name` from config)
    pub name: Option<String>,
}

/// Wait until the process runs and print its pids.
///
/// # Errors
///
/// Returns an error if the config or its poll settings are invalid.
pub async fn run(app: &AppContext, args: CheckProcessArgs) -> Result<ExitCode> {
    let config = config_service::load_config(&app.config_store)?;
    let poll = config.poll.process.to_poll_config()?;
    let name = args.name.unwrap_or_else(|| config.process_name.clone());

    let pb = wait_spinner(app, &format!("waiting for {name}..."));
    let result = wait_for_process(&app.host, &name, &poll, Some(&app.cancel)).await;
    finish_spinner(&pb, result.succeeded(), result.outcome.as_str());

    app.renderer().render_process(&name, &result)?;
    Ok(verdict(result.succeeded()))
}
