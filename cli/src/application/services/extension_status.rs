//! Extension handler status observation.

use std::path::Path;

use tokio_util::sync::CancellationToken;

use crate::application::poll::poll_until;
use crate::application::ports::FileSystem;
use crate::domain::extension::{STATUS_DIR, select_status_file};
use crate::domain::poll::{PollConfig, PollResult};
use crate::domain::status::StatusObservation;

/// Read the newest status file of the extension at `ext_path`.
pub async fn read_status(fs: &impl FileSystem, ext_path: &Path) -> StatusObservation {
    let status_dir = ext_path.join(STATUS_DIR);
    let entries = match fs.list_dir(&status_dir).await {
        Ok(Some(entries)) => entries,
        Ok(None) => return StatusObservation::Missing,
        Err(e) => return StatusObservation::Unreadable(format!("{e:#}")),
    };
    let Some(file) = select_status_file(
        entries
            .iter()
            .filter(|e| !e.is_dir)
            .map(|e| e.name.as_str()),
    ) else {
        return StatusObservation::Missing;
    };
    match fs.read_to_string(&status_dir.join(&file)).await {
        Ok(Some(content)) => StatusObservation::from_content(&file, &content),
        Ok(None) => StatusObservation::Missing,
        Err(e) => StatusObservation::Unreadable(format!("{e:#}")),
    }
}

/// Poll until the handler reports a terminal state (`success` or `error`).
///
/// The poll outcome only says whether the handler finished; check
/// [`StatusObservation::is_success`] on the last observation for the verdict.
pub async fn wait_for_extension_status(
    fs: &impl FileSystem,
    ext_path: &Path,
    poll: &PollConfig,
    cancel: Option<&CancellationToken>,
) -> PollResult<StatusObservation> {
    poll_until(
        || read_status(fs, ext_path),
        StatusObservation::is_terminal,
        poll,
        cancel,
    )
    .await
}
