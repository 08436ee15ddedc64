// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Single-instance lock for the background scheduler.

use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};

use fs2::FileExt;

use crate::error::{Error, Result};

/// Lock filename within the state directory.
const LOCK_NAME: &str = "geotrail.lock";

/// Get the lock file path for the given state directory.
pub fn lock_path(state_dir: &Path) -> PathBuf {
    state_dir.join(LOCK_NAME)
}

/// Acquire an exclusive lock on the lock file.
///
/// The lock is held until the returned file is dropped.
pub fn acquire(state_dir: &Path) -> Result<File> {
    let path = lock_path(state_dir);
    let file = OpenOptions::new()
        .read(true)
        .write(true)
        .create(true)
        .truncate(false)
        .open(&path)?;

    file.try_lock_exclusive()
        .map_err(|_| Error::AlreadyRunning(path.display().to_string()))?;

    Ok(file)
}

/// Checks whether another process holds the lock.
pub fn is_held(state_dir: &Path) -> bool {
    let Ok(file) = OpenOptions::new().read(true).open(lock_path(state_dir)) else {
        return false;
    };
    match FileExt::try_lock_shared(&file) {
        Ok(()) => {
            let _ = FileExt::unlock(&file);
            false
        }
        Err(_) => true,
    }
}

#[cfg(test)]
#[path = "lock_tests.rs"]
mod tests;
