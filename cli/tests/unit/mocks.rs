//! Shared mock infrastructure for unit tests.
//!
//! `FakeHost` is an in-memory guest: a directory tree, a table of scripted
//! command outputs, a process table and canned downloads. Every call is
//! recorded so tests can assert on what a service did.

#![allow(dead_code, clippy::expect_used, clippy::unwrap_used)]

use std::collections::{HashMap, VecDeque};
use std::path::{Path, PathBuf};
use std::process::Output;
use std::sync::Mutex;
use std::time::Duration;

use anyhow::Result;
use extcheck_cli::application::ports::{
    CommandRunner, DirEntry, FileSystem, HttpClient, ProcessTable, ProgressReporter,
};

use crate::helpers::err_output;

/// One recorded upload.
#[derive(Debug, Clone)]
pub struct Upload {
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

/// Snapshot of a removed extension, restored when a package is staged.
#[derive(Debug, Default, Clone)]
struct Removed {
    dirs: Vec<(PathBuf, Vec<DirEntry>)>,
    files: Vec<(PathBuf, String)>,
    parent_entries: Vec<(PathBuf, DirEntry)>,
}

#[derive(Default)]
pub struct FakeHost {
    dirs: Mutex<HashMap<PathBuf, Vec<DirEntry>>>,
    files: Mutex<HashMap<PathBuf, String>>,
    responses: Mutex<HashMap<String, VecDeque<Output>>>,
    pids: Mutex<HashMap<String, Vec<u32>>>,
    downloads: Mutex<HashMap<String, Vec<u8>>>,
    reextract: bool,
    removed_snapshot: Mutex<Removed>,

    pub commands: Mutex<Vec<String>>,
    pub removed: Mutex<Vec<PathBuf>>,
    pub written: Mutex<Vec<(PathBuf, Vec<u8>)>>,
    pub killed: Mutex<Vec<u32>>,
    pub uploads: Mutex<Vec<Upload>>,
    pub list_calls: Mutex<u32>,
}

impl FakeHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a directory at `path`, registering it in its parent's listing.
    pub fn with_dir(self, path: &str) -> Self {
        self.add_dir(Path::new(path));
        self
    }

    /// Add a file, creating parent directories as needed.
    pub fn with_file(self, path: &str, content: &str) -> Self {
        self.add_file(Path::new(path), content);
        self
    }

    /// Script the output of a command line such as `"rpm -q jq"`.
    ///
    /// Outputs are consumed in order; the last one repeats.
    pub fn with_command(self, cmdline: &str, output: Output) -> Self {
        self.responses
            .lock()
            .unwrap()
            .entry(cmdline.to_string())
            .or_default()
            .push_back(output);
        self
    }

    pub fn with_pids(self, name: &str, pids: &[u32]) -> Self {
        self.pids.lock().unwrap().insert(name.to_string(), pids.to_vec());
        self
    }

    pub fn with_download(self, url: &str, body: &[u8]) -> Self {
        self.downloads.lock().unwrap().insert(url.to_string(), body.to_vec());
        self
    }

    /// Put a removed extension back when its package zip is written,
    /// the way the guest agent re-extracts it.
    pub fn reextracting(mut self) -> Self {
        self.reextract = true;
        self
    }

    pub fn add_dir(&self, path: &Path) {
        let mut dirs = self.dirs.lock().unwrap();
        let mut current = path.to_path_buf();
        loop {
            dirs.entry(current.clone()).or_default();
            let Some(parent) = current.parent().map(Path::to_path_buf) else {
                break;
            };
            let Some(name) = current.file_name().map(|n| n.to_string_lossy().into_owned()) else {
                break;
            };
            let siblings = dirs.entry(parent.clone()).or_default();
            if !siblings.iter().any(|e| e.name == name) {
                siblings.push(DirEntry { name, is_dir: true });
            }
            current = parent;
        }
    }

    pub fn add_file(&self, path: &Path, content: &str) {
        if let Some(parent) = path.parent() {
            self.add_dir(parent);
            let name = path.file_name().unwrap().to_string_lossy().into_owned();
            let mut dirs = self.dirs.lock().unwrap();
            let siblings = dirs.entry(parent.to_path_buf()).or_default();
            if !siblings.iter().any(|e| e.name == name) {
                siblings.push(DirEntry { name, is_dir: false });
            }
        }
        self.files
            .lock()
            .unwrap()
            .insert(path.to_path_buf(), content.to_string());
    }

    pub fn set_pids(&self, name: &str, pids: &[u32]) {
        self.pids.lock().unwrap().insert(name.to_string(), pids.to_vec());
    }

    pub fn commands(&self) -> Vec<String> {
        self.commands.lock().unwrap().clone()
    }

    fn restore_removed(&self) {
        let snapshot = std::mem::take(&mut *self.removed_snapshot.lock().unwrap());
        {
            let mut dirs = self.dirs.lock().unwrap();
            for (path, entries) in snapshot.dirs {
                dirs.insert(path, entries);
            }
            for (parent, entry) in snapshot.parent_entries {
                dirs.entry(parent).or_default().push(entry);
            }
        }
        let mut files = self.files.lock().unwrap();
        for (path, content) in snapshot.files {
            files.insert(path, content);
        }
    }
}

impl CommandRunner for FakeHost {
    async fn run(&self, program: &str, args: &[&str]) -> Result<Output> {
        self.run_with_timeout(program, args, Duration::from_secs(30))
            .await
    }

    async fn run_with_timeout(
        &self,
        program: &str,
        args: &[&str],
        _timeout: Duration,
    ) -> Result<Output> {
        let cmdline = std::iter::once(program)
            .chain(args.iter().copied())
            .collect::<Vec<_>>()
            .join(" ");
        self.commands.lock().unwrap().push(cmdline.clone());
        let mut responses = self.responses.lock().unwrap();
        let Some(queue) = responses.get_mut(&cmdline) else {
            return Ok(err_output(127, format!("{program}: command not found").as_bytes()));
        };
        let output = if queue.len() > 1 {
            queue.pop_front().unwrap()
        } else {
            queue.front().cloned().unwrap()
        };
        Ok(output)
    }
}

impl FileSystem for FakeHost {
    async fn read_to_string(&self, path: &Path) -> Result<Option<String>> {
        Ok(self.files.lock().unwrap().get(path).cloned())
    }

    async fn list_dir(&self, path: &Path) -> Result<Option<Vec<DirEntry>>> {
        *self.list_calls.lock().unwrap() += 1;
        Ok(self.dirs.lock().unwrap().get(path).cloned())
    }

    async fn remove_dir_all(&self, path: &Path) -> Result<()> {
        self.removed.lock().unwrap().push(path.to_path_buf());
        let mut snapshot = Removed::default();
        {
            let mut dirs = self.dirs.lock().unwrap();
            let doomed: Vec<PathBuf> = dirs.keys().filter(|p| p.starts_with(path)).cloned().collect();
            for p in doomed {
                let entries = dirs.remove(&p).unwrap_or_default();
                snapshot.dirs.push((p, entries));
            }
            if let (Some(parent), Some(name)) = (path.parent(), path.file_name()) {
                if let Some(siblings) = dirs.get_mut(parent) {
                    let name = name.to_string_lossy();
                    if let Some(pos) = siblings.iter().position(|e| e.name == name) {
                        let entry = siblings.remove(pos);
                        snapshot.parent_entries.push((parent.to_path_buf(), entry));
                    }
                }
            }
        }
        {
            let mut files = self.files.lock().unwrap();
            let doomed: Vec<PathBuf> = files.keys().filter(|p| p.starts_with(path)).cloned().collect();
            for p in doomed {
                let content = files.remove(&p).unwrap_or_default();
                snapshot.files.push((p, content));
            }
        }
        *self.removed_snapshot.lock().unwrap() = snapshot;
        Ok(())
    }

    async fn write_atomic(&self, path: &Path, contents: &[u8]) -> Result<()> {
        self.written
            .lock()
            .unwrap()
            .push((path.to_path_buf(), contents.to_vec()));
        self.add_file(path, &String::from_utf8_lossy(contents));
        if self.reextract {
            self.restore_removed();
        }
        Ok(())
    }
}

impl HttpClient for FakeHost {
    async fn fetch(&self, url: &str, limit_bytes: u64) -> Result<Vec<u8>> {
        let Some(body) = self.downloads.lock().unwrap().get(url).cloned() else {
            anyhow::bail!("status code 404");
        };
        anyhow::ensure!(
            body.len() as u64 <= limit_bytes,
            "response body exceeds the {limit_bytes} byte limit"
        );
        Ok(body)
    }

    async fn put(&self, url: &str, headers: &[(&str, &str)], body: Vec<u8>) -> Result<()> {
        self.uploads.lock().unwrap().push(Upload {
            url: url.to_string(),
            headers: headers
                .iter()
                .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
                .collect(),
            body,
        });
        Ok(())
    }
}

impl ProcessTable for FakeHost {
    async fn pids_of(&self, name: &str) -> Result<Vec<u32>> {
        Ok(self.pids.lock().unwrap().get(name).cloned().unwrap_or_default())
    }

    async fn kill(&self, pid: u32) -> Result<()> {
        self.killed.lock().unwrap().push(pid);
        let mut pids = self.pids.lock().unwrap();
        for list in pids.values_mut() {
            list.retain(|p| *p != pid);
        }
        Ok(())
    }
}

// ── Reporter ─────────────────────────────────────────────────────────────────

/// Reporter that records every message.
#[derive(Default)]
pub struct RecordingReporter {
    pub messages: Mutex<Vec<String>>,
}

impl RecordingReporter {
    pub fn warnings(&self) -> Vec<String> {
        self.messages
            .lock()
            .unwrap()
            .iter()
            .filter_map(|m| m.strip_prefix("warn: ").map(ToString::to_string))
            .collect()
    }
}

impl ProgressReporter for RecordingReporter {
    fn step(&self, message: &str) {
        self.messages.lock().unwrap().push(format!("step: {message}"));
    }
    fn success(&self, message: &str) {
        self.messages.lock().unwrap().push(format!("ok: {message}"));
    }
    fn warn(&self, message: &str) {
        self.messages.lock().unwrap().push(format!("warn: {message}"));
    }
}
