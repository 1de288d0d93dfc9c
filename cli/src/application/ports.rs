//! Port trait definitions for the Application layer.
//!
//! Ports are the interfaces (contracts) that infrastructure must fulfill.
//! This file imports only from `crate::domain` — never from `crate::infra`,
//! `crate::commands`, or `crate::output`.

use std::path::{Path, PathBuf};
use std::process::Output;
use std::time::Duration;

use anyhow::Result;

use crate::domain::config::ValidatorConfig;

// ── Command Runner Port ───────────────────────────────────────────────────────

/// Abstracts process execution so infrastructure can be swapped or mocked.
#[allow(async_fn_in_trait)]
pub trait CommandRunner {
    /// Run a program and capture its output.
    ///
    /// Implementations should delegate to `run_with_timeout` using the
    /// instance's configured default timeout.
    async fn run(&self, program: &str, args: &[&str]) -> Result<Output>;
    /// Run a program with a custom timeout override.
    ///
    /// # Errors
    ///
    /// Returns an error if the process cannot be spawned or exceeds `timeout`.
    /// On timeout, the child process must be killed (not left orphaned).
    async fn run_with_timeout(
        &self,
        program: &str,
        args: &[&str],
        timeout: Duration,
    ) -> Result<Output>;
}

// ── Filesystem Port ───────────────────────────────────────────────────────────

/// A directory entry as seen by [`FileSystem::list_dir`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirEntry {
    pub name: String,
    pub is_dir: bool,
}

/// Abstracts the guest filesystem.
///
/// "Not found" is a normal answer while the guest agent is still working, so
/// reads report it as `None` rather than as an error.
#[allow(async_fn_in_trait)]
pub trait FileSystem {
    /// Read a UTF-8 file, returning `None` if it does not exist.
    async fn read_to_string(&self, path: &Path) -> Result<Option<String>>;
    /// List a directory, returning `None` if it does not exist.
    async fn list_dir(&self, path: &Path) -> Result<Option<Vec<DirEntry>>>;
    /// Recursively remove a directory. Removing a missing directory succeeds.
    async fn remove_dir_all(&self, path: &Path) -> Result<()>;
    /// Replace `path` with `contents` without exposing a partial file.
    async fn write_atomic(&self, path: &Path, contents: &[u8]) -> Result<()>;
}

// ── HTTP Port ─────────────────────────────────────────────────────────────────

/// Abstracts HTTP transfers so services can be tested without a network.
#[allow(async_fn_in_trait)]
pub trait HttpClient {
    /// GET `url`, failing if the body exceeds `limit_bytes`.
    async fn fetch(&self, url: &str, limit_bytes: u64) -> Result<Vec<u8>>;
    /// PUT `body` to `url` with extra request headers.
    async fn put(&self, url: &str, headers: &[(&str, &str)], body: Vec<u8>) -> Result<()>;
}

// ── Process Port ──────────────────────────────────────────────────────────────

/// Abstracts process lookup and termination.
#[allow(async_fn_in_trait)]
pub trait ProcessTable {
    /// Process ids of every running process named `name`; empty if none.
    async fn pids_of(&self, name: &str) -> Result<Vec<u32>>;
    /// Send SIGKILL to `pid`.
    async fn kill(&self, pid: u32) -> Result<()>;
}

/// Composite trait — everything the validation flow touches on the guest.
pub trait GuestHost: CommandRunner + FileSystem + HttpClient + ProcessTable {}

/// Blanket implementation: any type implementing all four ports is a `GuestHost`.
impl<T> GuestHost for T where T: CommandRunner + FileSystem + HttpClient + ProcessTable {}

// ── Progress Reporting Port ───────────────────────────────────────────────────

/// Abstracts progress reporting so services can emit events without
/// depending on the Presentation layer. Sync trait — no async needed.
pub trait ProgressReporter {
    /// Emit an in-progress step message.
    fn step(&self, message: &str);
    /// Emit a success message.
    fn success(&self, message: &str);
    /// Emit a warning message.
    fn warn(&self, message: &str);
}

// ── Config Port ───────────────────────────────────────────────────────────────

/// Abstracts configuration persistence.
pub trait ConfigStore {
    /// Load the configuration, falling back to defaults if no file exists.
    fn load(&self) -> Result<ValidatorConfig>;
    /// Persist the configuration.
    fn save(&self, config: &ValidatorConfig) -> Result<()>;
    /// Location of the configuration file.
    fn path(&self) -> Result<PathBuf>;
}
