//! Filesystem infrastructure — implements the `FileSystem` port.

use std::io::{ErrorKind, Write as _};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::application::ports::{DirEntry, FileSystem};

/// Production filesystem. Blocking calls run on `spawn_blocking`.
#[derive(Debug, Default, Clone, Copy)]
pub struct LocalFs;

async fn blocking<T, F>(what: String, f: F) -> Result<T>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T> + Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .with_context(|| format!("spawn_blocking for {what}"))?
}

fn read_sync(path: &Path) -> Result<Option<String>> {
    match std::fs::read_to_string(path) {
        Ok(content) => Ok(Some(content)),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e).with_context(|| format!("reading {}", path.display())),
    }
}

fn list_sync(path: &Path) -> Result<Option<Vec<DirEntry>>> {
    let iter = match std::fs::read_dir(path) {
        Ok(iter) => iter,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e).with_context(|| format!("listing {}", path.display())),
    };
    let mut entries = Vec::new();
    for entry in iter {
        let entry = entry.with_context(|| format!("listing {}", path.display()))?;
        let is_dir = match entry.file_type() {
            // Follow links so a linked extension directory still matches.
            Ok(t) if t.is_symlink() => {
                std::fs::metadata(entry.path()).is_ok_and(|m| m.is_dir())
            }
            Ok(t) => t.is_dir(),
            Err(_) => false,
        };
        entries.push(DirEntry {
            name: entry.file_name().to_string_lossy().into_owned(),
            is_dir,
        });
    }
    Ok(Some(entries))
}

fn remove_sync(path: &Path) -> Result<()> {
    match std::fs::remove_dir_all(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e).with_context(|| format!("removing directory {}", path.display())),
    }
}

/// Atomic write: temp file in the target directory, fsync, then rename.
fn write_atomic_sync(path: &Path, contents: &[u8]) -> Result<()> {
    let parent = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    std::fs::create_dir_all(parent)
        .with_context(|| format!("creating directory {}", parent.display()))?;
    let mut tmp = tempfile::NamedTempFile::new_in(parent)
        .with_context(|| format!("creating temp file in {}", parent.display()))?;
    tmp.write_all(contents)
        .with_context(|| format!("writing temp file for {}", path.display()))?;
    tmp.as_file()
        .sync_all()
        .with_context(|| format!("syncing temp file for {}", path.display()))?;
    tmp.persist(path)
        .map_err(|e| e.error)
        .with_context(|| format!("renaming temp file to {}", path.display()))?;
    Ok(())
}

impl FileSystem for LocalFs {
    async fn read_to_string(&self, path: &Path) -> Result<Option<String>> {
        let path: PathBuf = path.to_path_buf();
        blocking(format!("read {}", path.display()), move || read_sync(&path)).await
    }

    async fn list_dir(&self, path: &Path) -> Result<Option<Vec<DirEntry>>> {
        let path: PathBuf = path.to_path_buf();
        blocking(format!("list {}", path.display()), move || list_sync(&path)).await
    }

    async fn remove_dir_all(&self, path: &Path) -> Result<()> {
        let path: PathBuf = path.to_path_buf();
        blocking(format!("remove {}", path.display()), move || remove_sync(&path)).await
    }

    async fn write_atomic(&self, path: &Path, contents: &[u8]) -> Result<()> {
        let path: PathBuf = path.to_path_buf();
        let contents = contents.to_vec();
        blocking(format!("write {}", path.display()), move || {
            write_atomic_sync(&path, &contents)
        })
        .await
    }
}
