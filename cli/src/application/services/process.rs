//! Companion process checks.

use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::application::poll::poll_until;
use crate::application::ports::ProcessTable;
use crate::domain::poll::{PollConfig, PollResult};

/// Poll until at least one process named `name` is running.
///
/// Lookup failures are logged and count as "not running".
pub async fn wait_for_process(
    table: &impl ProcessTable,
    name: &str,
    poll: &PollConfig,
    cancel: Option<&CancellationToken>,
) -> PollResult<Vec<u32>> {
    poll_until(
        || async move {
            table.pids_of(name).await.unwrap_or_else(|e| {
                warn!(error = %e, process = name, "process lookup failed");
                Vec::new()
            })
        },
        |pids| !pids.is_empty(),
        poll,
        cancel,
    )
    .await
}

/// Kill every process named `name`; returns the pids that were killed.
///
/// Individual kill failures are logged and skipped.
pub async fn kill_all(table: &impl ProcessTable, name: &str) -> Vec<u32> {
    let pids = match table.pids_of(name).await {
        Ok(pids) => pids,
        Err(e) => {
            warn!(error = %e, process = name, "process lookup failed");
            return Vec::new();
        }
    };
    let mut killed = Vec::with_capacity(pids.len());
    for pid in pids {
        match table.kill(pid).await {
            Ok(()) => {
                info!(pid, process = name, "killed process");
                killed.push(pid);
            }
            Err(e) => warn!(error = %e, pid, "kill failed"),
        }
    }
    killed
}
