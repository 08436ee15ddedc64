// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Durable key-value storage.
//!
//! The pending queue persists itself as a single string value under one key.
//! [`FileStore`] keeps one file per key and replaces values atomically:
//! the new value is written to a temporary file, fsynced, then renamed over
//! the old one, so a crash leaves either the old or the new value.
//!
//! Several processes may share one store directory. [`KeyValueStore::lock`]
//! hands out an advisory `fs2` lock on `<key>.lock` so a read-modify-write of
//! a key can exclude every other process and thread.

use std::collections::HashMap;
use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use fs2::FileExt;

use crate::error::{Error, Result};

/// Minimal durable key-value store.
///
/// `set` must be durable before it returns.
pub trait KeyValueStore: Send + Sync {
    /// Returns the value stored under `key`, if any.
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// Stores `value` under `key`, replacing any previous value.
    fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Removes `key`. Removing a missing key is not an error.
    fn remove(&self, key: &str) -> Result<()>;

    /// Blocks until this caller holds the exclusive lock on `key`.
    ///
    /// The lock is released when the returned guard drops.
    fn lock(&self, key: &str) -> Result<KeyLock>;

    /// Takes the exclusive lock on `key` if nobody else holds it.
    fn try_lock(&self, key: &str) -> Result<Option<KeyLock>>;
}

/// Exclusive hold on a store key, released on drop.
#[derive(Debug)]
pub struct KeyLock {
    file: Option<File>,
}

impl KeyLock {
    /// A lock with no file behind it, for stores private to one process.
    pub fn unshared() -> Self {
        KeyLock { file: None }
    }
}

impl Drop for KeyLock {
    fn drop(&mut self) {
        if let Some(file) = &self.file {
            let _ = FileExt::unlock(file);
        }
    }
}

/// File-per-key store rooted at a directory.
#[derive(Debug)]
pub struct FileStore {
    dir: PathBuf,
}

const VALUE_EXT: &str = "value";
const TMP_EXT: &str = "tmp";
const LOCK_EXT: &str = "lock";

/// Distinguishes temp files of concurrent writers within one process.
static TMP_COUNTER: AtomicU64 = AtomicU64::new(0);

impl FileStore {
    /// Opens a store in `dir`, creating the directory if needed.
    pub fn open(dir: &Path) -> Result<Self> {
        fs::create_dir_all(dir)?;
        Ok(FileStore {
            dir: dir.to_path_buf(),
        })
    }

    fn value_path(&self, key: &str) -> Result<PathBuf> {
        validate_key(key)?;
        Ok(self.dir.join(format!("{key}.{VALUE_EXT}")))
    }

    /// Temp file unique to this process and call.
    fn tmp_path(&self, key: &str) -> PathBuf {
        let seq = TMP_COUNTER.fetch_add(1, Ordering::Relaxed);
        self.dir
            .join(format!("{key}.{}-{seq}.{TMP_EXT}", std::process::id()))
    }

    fn open_lock(&self, key: &str) -> Result<File> {
        validate_key(key)?;
        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(self.dir.join(format!("{key}.{LOCK_EXT}")))?;
        Ok(file)
    }

    /// Flushes the directory entry so a rename survives power loss.
    fn sync_dir(&self) {
        // Directories cannot be opened for sync on every platform.
        if let Ok(dir) = File::open(&self.dir) {
            let _ = dir.sync_all();
        }
    }
}

fn write_synced(path: &Path, value: &str) -> std::io::Result<()> {
    let mut file = OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(true)
        .open(path)?;
    file.write_all(value.as_bytes())?;
    file.sync_all()
}

fn validate_key(key: &str) -> Result<()> {
    let valid = !key.is_empty()
        && !key.starts_with('.')
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'));
    if valid {
        Ok(())
    } else {
        Err(Error::InvalidKey(key.to_string()))
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let path = self.value_path(key)?;
        match fs::read_to_string(&path) {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let path = self.value_path(key)?;
        let tmp_path = self.tmp_path(key);

        let written = write_synced(&tmp_path, value).and_then(|()| fs::rename(&tmp_path, &path));
        if let Err(e) = written {
            let _ = fs::remove_file(&tmp_path);
            return Err(e.into());
        }
        self.sync_dir();
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        let path = self.value_path(key)?;
        match fs::remove_file(&path) {
            Ok(()) => {
                self.sync_dir();
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    fn lock(&self, key: &str) -> Result<KeyLock> {
        let file = self.open_lock(key)?;
        file.lock_exclusive()?;
        Ok(KeyLock { file: Some(file) })
    }

    fn try_lock(&self, key: &str) -> Result<Option<KeyLock>> {
        let file = self.open_lock(key)?;
        match file.try_lock_exclusive() {
            Ok(()) => Ok(Some(KeyLock { file: Some(file) })),
            Err(e) if e.kind() == fs2::lock_contended_error().kind() => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

/// In-memory store. Not durable; used by tests and dry runs.
///
/// Its locks are [`KeyLock::unshared`]: callers in one process already
/// serialize through the queue and the sync engine.
#[derive(Debug, Default)]
pub struct MemoryStore {
    values: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let values = self.values.lock().unwrap_or_else(|e| e.into_inner());
        Ok(values.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut values = self.values.lock().unwrap_or_else(|e| e.into_inner());
        values.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        let mut values = self.values.lock().unwrap_or_else(|e| e.into_inner());
        values.remove(key);
        Ok(())
    }

    fn lock(&self, _key: &str) -> Result<KeyLock> {
        Ok(KeyLock::unshared())
    }

    fn try_lock(&self, _key: &str) -> Result<Option<KeyLock>> {
        Ok(Some(KeyLock::unshared()))
    }
}

#[cfg(test)]
#[path = "store_tests.rs"]
mod tests;
