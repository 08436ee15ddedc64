// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use std::io::Write;
use std::path::Path;
use std::time::Duration;

use gt_core::PendingQueue;

use crate::config::{Config, ProviderConfig};
use crate::connectivity::{ConnectivityOracle, TcpProbe};
use crate::error::Result;
use crate::lock;
use crate::tracker::open_queue;

use super::block_on;

/// Show queue, endpoint and scheduler status.
pub fn run(state_dir: &Path) -> Result<()> {
    let config = Config::load(state_dir)?;
    let queue = open_queue(state_dir)?;

    let reachable = match config.server_url()? {
        Some(url) => {
            let timeout = Duration::from_millis(config.connectivity.probe_timeout_ms);
            match TcpProbe::for_url(&url, timeout) {
                Some(probe) => Some(block_on(probe.is_reachable())?),
                None => Some(false),
            }
        }
        None => None,
    };

    let mut out = std::io::stdout().lock();
    run_impl(
        state_dir,
        &config,
        &queue,
        reachable,
        lock::is_held(state_dir),
        &mut out,
    )
}

pub(crate) fn run_impl(
    state_dir: &Path,
    config: &Config,
    queue: &PendingQueue,
    reachable: Option<bool>,
    scheduler_running: bool,
    out: &mut dyn Write,
) -> Result<()> {
    let records = queue.drain()?;

    writeln!(out, "State dir: {}", state_dir.display())?;
    writeln!(out, "Pending: {}", records.len())?;
    if let (Some(oldest), Some(newest)) = (records.first(), records.last()) {
        writeln!(out, "Oldest: {}", oldest.captured_at.to_rfc3339())?;
        writeln!(out, "Newest: {}", newest.captured_at.to_rfc3339())?;
    }

    match (&config.server.url, reachable) {
        (Some(url), Some(true)) => writeln!(out, "Endpoint: {} (reachable)", url)?,
        (Some(url), _) => writeln!(out, "Endpoint: {} (unreachable)", url)?,
        (None, _) => writeln!(out, "Endpoint: not configured")?,
    }

    let provider = match &config.provider {
        Some(ProviderConfig::Static { .. }) => "static".to_string(),
        Some(ProviderConfig::Replay { path, .. }) => format!("replay ({})", path.display()),
        None => "not configured".to_string(),
    };
    writeln!(out, "Provider: {}", provider)?;

    let scheduler = if scheduler_running {
        "running"
    } else {
        "stopped"
    };
    writeln!(out, "Scheduler: {}", scheduler)?;
    Ok(())
}

#[cfg(test)]
#[path = "status_tests.rs"]
mod tests;
