//! Extension directory discovery.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tokio_util::sync::CancellationToken;
use tracing::warn;

use crate::application::poll::poll_until;
use crate::application::ports::FileSystem;
use crate::domain::extension::{ExtensionDir, find_extension_dirs, select_extension_dir};
use crate::domain::poll::{PollConfig, PollResult};

/// Find the highest-versioned extension directory under `waagent_dir`.
///
/// Returns `Ok(None)` while the guest agent has not extracted the
/// extension yet, including when `waagent_dir` itself does not exist.
///
/// # Errors
///
/// Returns an error if the directory exists but cannot be listed.
pub async fn locate_extension_dir(
    fs: &impl FileSystem,
    waagent_dir: &Path,
    prefix: &str,
) -> Result<Option<ExtensionDir>> {
    let Some(entries) = fs
        .list_dir(waagent_dir)
        .await
        .with_context(|| format!("listing {}", waagent_dir.display()))?
    else {
        return Ok(None);
    };
    let names = entries.iter().filter(|e| e.is_dir).map(|e| e.name.as_str());
    Ok(select_extension_dir(names, prefix))
}

/// Poll until an extension directory appears.
///
/// Listing failures are logged and treated as "not found yet".
pub async fn wait_for_extension_dir(
    fs: &impl FileSystem,
    waagent_dir: &Path,
    prefix: &str,
    poll: &PollConfig,
    cancel: Option<&CancellationToken>,
) -> PollResult<Option<ExtensionDir>> {
    poll_until(
        || async move {
            locate_extension_dir(fs, waagent_dir, prefix)
                .await
                .unwrap_or_else(|e| {
                    warn!(error = %e, "cannot look for extension directory");
                    None
                })
        },
        Option::is_some,
        poll,
        cancel,
    )
    .await
}

/// Poll until the extension directory called `name` exists again.
///
/// Other versions of the extension sitting next to it do not count, so a
/// reinstall is only seen once the removed directory itself comes back.
pub async fn wait_for_named_extension_dir(
    fs: &impl FileSystem,
    waagent_dir: &Path,
    prefix: &str,
    name: &str,
    poll: &PollConfig,
    cancel: Option<&CancellationToken>,
) -> PollResult<Option<ExtensionDir>> {
    poll_until(
        || async move {
            match fs.list_dir(waagent_dir).await {
                Ok(entries) => find_extension_dirs(
                    entries
                        .iter()
                        .flatten()
                        .filter(|e| e.is_dir)
                        .map(|e| e.name.as_str()),
                    prefix,
                )
                .into_iter()
                .find(|d| d.name == name),
                Err(e) => {
                    warn!(error = %e, "cannot look for extension directory");
                    None
                }
            }
        },
        Option::is_some,
        poll,
        cancel,
    )
    .await
}

/// Absolute path of an extension directory.
#[must_use]
pub fn extension_path(waagent_dir: &Path, dir: &ExtensionDir) -> PathBuf {
    waagent_dir.join(&dir.name)
}
