// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use std::io::Write;
use std::path::Path;

use gt_core::PendingQueue;

use crate::error::Result;
use crate::tracker::open_queue;

/// List pending records, oldest first.
pub fn run(state_dir: &Path, json: bool) -> Result<()> {
    let queue = open_queue(state_dir)?;
    run_impl(&queue, json, &mut std::io::stdout().lock())
}

pub(crate) fn run_impl(queue: &PendingQueue, json: bool, out: &mut dyn Write) -> Result<()> {
    let records = queue.drain()?;
    if json {
        writeln!(out, "{}", serde_json::to_string_pretty(&records)?)?;
    } else if records.is_empty() {
        writeln!(out, "no pending records")?;
    } else {
        for record in &records {
            writeln!(out, "{}", record)?;
        }
    }
    Ok(())
}

#[cfg(test)]
#[path = "pending_tests.rs"]
mod tests;
