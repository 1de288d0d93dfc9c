//! `LocalHost` — the guest VM this process runs on, as a `GuestHost`.

use std::path::Path;
use std::process::Output;
use std::time::Duration;

use anyhow::Result;

use crate::application::ports::{CommandRunner, DirEntry, FileSystem, HttpClient, ProcessTable};
use crate::infra::command_runner::TokioCommandRunner;
use crate::infra::fs::LocalFs;
use crate::infra::http::UreqHttpClient;
use crate::infra::process::CommandProcessTable;

/// Composite of the production port implementations.
pub struct LocalHost {
    runner: TokioCommandRunner,
    fs: LocalFs,
    http: UreqHttpClient,
    processes: CommandProcessTable<TokioCommandRunner>,
}

impl LocalHost {
    #[must_use]
    pub fn new() -> Self {
        Self {
            runner: TokioCommandRunner::default(),
            fs: LocalFs,
            http: UreqHttpClient::default(),
            processes: CommandProcessTable::new(TokioCommandRunner::default()),
        }
    }
}

impl Default for LocalHost {
    fn default() -> Self {
        Self::new()
    }
}

impl CommandRunner for LocalHost {
    async fn run(&self, program: &str, args: &[&str]) -> Result<Output> {
        self.runner.run(program, args).await
    }

    async fn run_with_timeout(
        &self,
        program: &str,
        args: &[&str],
        timeout: Duration,
    ) -> Result<Output> {
        self.runner.run_with_timeout(program, args, timeout).await
    }
}

impl FileSystem for LocalHost {
    async fn read_to_string(&self, path: &Path) -> Result<Option<String>> {
        self.fs.read_to_string(path).await
    }

    async fn list_dir(&self, path: &Path) -> Result<Option<Vec<DirEntry>>> {
        self.fs.list_dir(path).await
    }

    async fn remove_dir_all(&self, path: &Path) -> Result<()> {
        self.fs.remove_dir_all(path).await
    }

    async fn write_atomic(&self, path: &Path, contents: &[u8]) -> Result<()> {
        self.fs.write_atomic(path, contents).await
    }
}

impl HttpClient for LocalHost {
    async fn fetch(&self, url: &str, limit_bytes: u64) -> Result<Vec<u8>> {
        self.http.fetch(url, limit_bytes).await
    }

    async fn put(&self, url: &str, headers: &[(&str, &str)], body: Vec<u8>) -> Result<()> {
        self.http.put(url, headers, body).await
    }
}

impl ProcessTable for LocalHost {
    async fn pids_of(&self, name: &str) -> Result<Vec<u32>> {
        self.processes.pids_of(name).await
    }

    async fn kill(&self, pid: u32) -> Result<()> {
        self.processes.kill(pid).await
    }
}
