//! `extcheck status`

use std::path::Path;
use std::process::ExitCode;

use anyhow::Result;

use crate::app::AppContext;
use crate::application::services::config_service;
use crate::application::services::extension_status::wait_for_extension_status;
use crate::application::services::locate::{extension_path, wait_for_extension_dir};
use crate::commands::{finish_spinner, verdict, wait_spinner};

/// Locate the extension, wait for its handler to finish and print the status.
///
/// # Errors
///
/// Returns an error if the config or its poll settings are invalid.
pub async fn run(app: &AppContext) -> Result<ExitCode> {
    let config = config_service::load_config(&app.config_store)?;
    let locate_poll = config.poll.locate.to_poll_config()?;
    let status_poll = config.poll.status.to_poll_config()?;
    let waagent_dir = Path::new(&config.waagent_dir);

    let located = wait_for_extension_dir(
        &app.host,
        waagent_dir,
        &config.extension_prefix,
        &locate_poll,
        Some(&app.cancel),
    )
    .await;
    let Some(dir) = &located.last_observed else {
        app.renderer().render_locate(&located, waagent_dir)?;
        return Ok(ExitCode::FAILURE);
    };

    let pb = wait_spinner(app, &format!("waiting for {} status...", dir.name));
    let result = wait_for_extension_status(
        &app.host,
        &extension_path(waagent_dir, dir),
        &status_poll,
        Some(&app.cancel),
    )
    .await;
    let ok = result.last_observed.is_success();
    finish_spinner(&pb, ok, result.outcome.as_str());

    app.renderer().render_status(&result)?;
    Ok(verdict(ok))
}
