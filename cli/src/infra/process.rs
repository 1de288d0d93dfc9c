//! Process table backed by `pidof` and `kill`.

use anyhow::{Context, Result};

use crate::application::ports::{CommandRunner, ProcessTable};

/// `ProcessTable` implemented on top of any `CommandRunner`.
pub struct CommandProcessTable<R> {
    runner: R,
}

impl<R: CommandRunner> CommandProcessTable<R> {
    #[must_use]
    pub fn new(runner: R) -> Self {
        Self { runner }
    }
}

/// Parse `pidof` output: whitespace-separated decimal pids.
///
/// # Errors
///
/// Returns an error if any token is not a pid.
pub fn parse_pidof(stdout: &str) -> Result<Vec<u32>> {
    stdout
        .split_whitespace()
        .map(|tok| {
            tok.parse::<u32>()
                .with_context(|| format!("unexpected pidof output: {tok:?}"))
        })
        .collect()
}

impl<R: CommandRunner> ProcessTable for CommandProcessTable<R> {
    async fn pids_of(&self, name: &str) -> Result<Vec<u32>> {
        let output = self.runner.run("pidof", &[name]).await?;
        // pidof exits 1 when nothing matches.
        match output.status.code() {
            Some(0) => parse_pidof(&String::from_utf8_lossy(&output.stdout)),
            Some(1) => Ok(Vec::new()),
            _ => anyhow::bail!(
                "pidof {name} failed: {}",
                String::from_utf8_lossy(&output.stderr).trim()
            ),
        }
    }

    async fn kill(&self, pid: u32) -> Result<()> {
        let pid_arg = pid.to_string();
        let output = self.runner.run("kill", &["-s", "KILL", &pid_arg]).await?;
        anyhow::ensure!(
            output.status.success(),
            "kill {pid} failed: {}",
            String::from_utf8_lossy(&output.stderr).trim()
        );
        Ok(())
    }
}
