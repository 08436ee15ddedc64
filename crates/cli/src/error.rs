// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use thiserror::Error;

use crate::capture::CaptureError;
use crate::sync::{SyncError, TransportError};

/// All possible errors that can occur in the gtrs library.
///
/// Errors provide user-friendly messages with hints for common issues.
#[derive(Debug, Error)]
pub enum Error {
    #[error("cannot determine state directory\n  hint: pass --state-dir or set GEOTRAIL_STATE_DIR")]
    NoStateDir,

    #[error("config error: {0}")]
    Config(String),

    #[error("no location provider configured\n  hint: add a [provider] section to {0}")]
    NoProvider(String),

    #[error("another geotrail instance is already running (lock: {0})")]
    AlreadyRunning(String),

    #[error("capture failed: {0}")]
    Capture(#[from] CaptureError),

    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    #[error(transparent)]
    Sync(#[from] SyncError),

    #[error(transparent)]
    Core(#[from] gt_core::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

/// A specialized Result type for gtrs operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
