// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use std::io::Write;
use std::path::Path;

use crate::background::TaskReport;
use crate::config::Config;
use crate::error::Result;
use crate::scheduler::TaskScheduler;
use crate::tracker::{ForegroundReport, Tracker};

use super::block_on;

/// Capture one location in the foreground, or run one background invocation.
pub fn run(state_dir: &Path, background: bool) -> Result<()> {
    let config = Config::load(state_dir)?;
    let tracker = Tracker::from_config(&config, state_dir)?;
    let mut out = std::io::stdout().lock();

    if background {
        let scheduler = TaskScheduler::register(config.schedule.settings(), |sink| {
            tracker.background_adapter(sink)
        });
        let report = block_on(scheduler.run_once())?;
        write_task_report(&mut out, &report)?;
    } else {
        let report = block_on(tracker.capture_now())??;
        write_foreground_report(&mut out, &report)?;
    }
    Ok(())
}

pub(crate) fn write_foreground_report(out: &mut dyn Write, report: &ForegroundReport) -> Result<()> {
    writeln!(out, "captured {}", report.record)?;
    writeln!(out, "pending: {}", report.pending)?;
    writeln!(out, "sync: {}", report.sync)?;
    Ok(())
}

pub(crate) fn write_task_report(out: &mut dyn Write, report: &TaskReport) -> Result<()> {
    writeln!(
        out,
        "{}: {} ({}ms, last state: {})",
        report.task_id,
        report.outcome,
        report.elapsed.as_millis(),
        report.last_state
    )?;
    Ok(())
}

#[cfg(test)]
#[path = "capture_tests.rs"]
mod tests;
