// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use std::io::Write;
use std::path::Path;

use gt_core::PendingQueue;

use crate::error::Result;
use crate::tracker::open_queue;

/// Discard every pending record.
pub fn run(state_dir: &Path) -> Result<()> {
    let queue = open_queue(state_dir)?;
    run_impl(&queue, &mut std::io::stdout().lock())
}

pub(crate) fn run_impl(queue: &PendingQueue, out: &mut dyn Write) -> Result<()> {
    let discarded = queue.len()?;
    queue.clear()?;
    tracing::info!("cleared {} pending record(s)", discarded);
    writeln!(out, "cleared {} pending record(s)", discarded)?;
    Ok(())
}

#[cfg(test)]
#[path = "clear_tests.rs"]
mod tests;
