// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! JSONL (JSON Lines) utilities.
//!
//! The pending queue is stored as a single JSONL value, one record per line.
//! Replay traces for the file-backed location provider use the same format.

use std::fs;
use std::path::Path;

use serde::{de::DeserializeOwned, Serialize};

use crate::error::{Error, Result};

/// Encodes records as JSON lines, each terminated by `\n`.
pub fn encode<T: Serialize>(records: &[T]) -> Result<String> {
    let mut out = String::new();
    for record in records {
        out.push_str(&serde_json::to_string(record)?);
        out.push('\n');
    }
    Ok(out)
}

/// Decodes JSON lines, skipping blank lines.
///
/// `source` names the value in error messages.
pub fn decode<T: DeserializeOwned>(source: &str, content: &str) -> Result<Vec<T>> {
    let mut records = Vec::new();
    for (index, line) in content.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let record = serde_json::from_str(line).map_err(|e| Error::CorruptedData {
            key: source.to_string(),
            reason: format!("line {}: {}", index + 1, e),
        })?;
        records.push(record);
    }
    Ok(records)
}

/// Reads all records from a JSONL file.
///
/// A missing file is an error; blank lines are skipped.
pub fn read_all<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>> {
    let content = fs::read_to_string(path)?;
    decode(&path.display().to_string(), &content)
}

#[cfg(test)]
#[path = "jsonl_tests.rs"]
mod tests;
