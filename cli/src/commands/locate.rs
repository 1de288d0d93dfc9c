//! `extcheck locate`

use std::path::Path;
use std::process::ExitCode;

use anyhow::Result;

use crate::app::AppContext;
use crate::application::services::config_service;
use crate::application::services::locate::wait_for_extension_dir;
use crate::commands::{finish_spinner, verdict, wait_spinner};

/// Wait for the extension directory and print it.
///
/// # Errors
///
/// Returns an error if the config or its poll settings are invalid.
pub async fn run(app: &AppContext) -> Result<ExitCode> {
    let config = config_service::load_config(&app.config_store)?;
    let poll = config.poll.locate.to_poll_config()?;
    let waagent_dir = Path::new(&config.waagent_dir);

    let pb = wait_spinner(app, &format!("looking for {}...", config.extension_prefix));
    let result = wait_for_extension_dir(
        &app.host,
        waagent_dir,
        &config.extension_prefix,
        &poll,
        Some(&app.cancel),
    )
    .await;
    let found = result.last_observed.is_some();
    finish_spinner(&pb, found, result.outcome.as_str());

    app.renderer().render_locate(&result, waagent_dir)?;
    Ok(verdict(found))
}
