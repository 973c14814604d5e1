// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Persistence medium for sync state.
//!
//! Each category of state (the offline queue, the clock state, the read
//! cache) is saved as one opaque blob under a fixed name. Saves replace the
//! whole blob, so a reader never observes a partial write.

use std::collections::{HashMap, HashSet};
use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

/// Blob holding the offline queue, one operation per line.
pub const QUEUE_BLOB: &str = "offline_queue.jsonl";

/// Blob holding the optimistic clock state.
pub const CLOCK_BLOB: &str = "clock_state.json";

/// Blob holding the read-through cache entries.
pub const CACHE_BLOB: &str = "read_cache.json";

const LOCK_FILE: &str = "state.lock";

/// Error type for store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid blob name: '{0}'")]
    InvalidName(String),

    #[error("state directory is locked by another process: {}", .0.display())]
    Locked(PathBuf),

    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Named blob storage.
pub trait Store: Send + Sync {
    /// Loads a blob, or `None` if it was never saved.
    fn load(&self, name: &str) -> StoreResult<Option<Vec<u8>>>;

    /// Durably replaces a blob.
    fn save(&self, name: &str, bytes: &[u8]) -> StoreResult<()>;
}

impl<S: Store + ?Sized> Store for Arc<S> {
    fn load(&self, name: &str) -> StoreResult<Option<Vec<u8>>> {
        (**self).load(name)
    }

    fn save(&self, name: &str, bytes: &[u8]) -> StoreResult<()> {
        (**self).save(name, bytes)
    }
}

fn validate_name(name: &str) -> StoreResult<()> {
    let valid = !name.is_empty()
        && !name.starts_with('.')
        && !name.contains(['/', '\\'])
        && name != LOCK_FILE;
    if valid {
        Ok(())
    } else {
        Err(StoreError::InvalidName(name.to_string()))
    }
}

/// Stores each blob as a file inside a state directory.
///
/// Saves write a sibling temp file, fsync it, then rename it over the
/// target.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    /// Opens (creating if needed) a state directory.
    pub fn open(dir: &Path) -> StoreResult<Self> {
        fs::create_dir_all(dir)?;
        Ok(FileStore {
            dir: dir.to_path_buf(),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Takes the exclusive advisory lock on the state directory.
    ///
    /// The lock is held until the returned guard is dropped.
    pub fn lock(&self) -> StoreResult<StateLock> {
        use fs2::FileExt;

        let path = self.dir.join(LOCK_FILE);
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&path)?;

        file.try_lock_exclusive()
            .map_err(|_| StoreError::Locked(self.dir.clone()))?;

        Ok(StateLock { _file: file })
    }

    fn path(&self, name: &str) -> StoreResult<PathBuf> {
        validate_name(name)?;
        Ok(self.dir.join(name))
    }
}

impl Store for FileStore {
    fn load(&self, name: &str) -> StoreResult<Option<Vec<u8>>> {
        let path = self.path(name)?;
        match fs::read(&path) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn save(&self, name: &str, bytes: &[u8]) -> StoreResult<()> {
        let path = self.path(name)?;
        let tmp = self.dir.join(format!(".{name}.tmp"));

        let mut file = File::create(&tmp)?;
        file.write_all(bytes)?;
        file.sync_all()?;
        drop(file);

        fs::rename(&tmp, &path)?;
        tracing::trace!(blob = name, bytes = bytes.len(), "saved");
        Ok(())
    }
}

/// Guard for the state directory lock.
#[derive(Debug)]
pub struct StateLock {
    _file: File,
}

/// In-memory store.
///
/// Clones share the same blobs, so reopening components over a clone
/// behaves like a process restart against the same disk.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Mutex<MemoryInner>>,
}

#[derive(Debug, Default)]
struct MemoryInner {
    blobs: HashMap<String, Vec<u8>>,
    fail_writes: bool,
    failing_blobs: HashSet<String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every subsequent save fail until reset.
    pub fn set_fail_writes(&self, fail: bool) {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .fail_writes = fail;
    }

    /// Makes saves to one blob fail, leaving the others writable.
    pub fn fail_writes_to(&self, name: &str) {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .failing_blobs
            .insert(name.to_string());
    }

    /// Returns a copy of a blob, for inspection.
    pub fn blob(&self, name: &str) -> Option<Vec<u8>> {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .blobs
            .get(name)
            .cloned()
    }
}

impl Store for MemoryStore {
    fn load(&self, name: &str) -> StoreResult<Option<Vec<u8>>> {
        validate_name(name)?;
        Ok(self.blob(name))
    }

    fn save(&self, name: &str, bytes: &[u8]) -> StoreResult<()> {
        validate_name(name)?;
        let mut inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        if inner.fail_writes || inner.failing_blobs.contains(name) {
            return Err(StoreError::Unavailable(format!("write to '{name}' refused")));
        }
        inner.blobs.insert(name.to_string(), bytes.to_vec());
        Ok(())
    }
}
