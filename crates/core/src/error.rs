// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Error types for gt-core operations.

use thiserror::Error;

/// All possible errors that can occur in gt-core operations.
#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid coordinate: latitude {latitude}, longitude {longitude}\n  hint: latitude must be within [-90, 90] and longitude within [-180, 180]")]
    InvalidCoordinate { latitude: f64, longitude: f64 },

    #[error("invalid store key: '{0}'\n  hint: keys may only contain ASCII letters, digits, '_', '-' and '.'")]
    InvalidKey(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("corrupted data under '{key}': {reason}")]
    CorruptedData { key: String, reason: String },
}

/// A specialized Result type for gt-core operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
