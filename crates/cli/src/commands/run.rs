// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Long-running background scheduler.
//!
//! 1. Takes the single-instance lock in the state directory
//! 2. Registers the background adapter with the scheduler
//! 3. Invokes it every `schedule.interval_secs` until Ctrl-C

use std::path::Path;

use tokio_util::sync::CancellationToken;

use crate::config::Config;
use crate::error::Result;
use crate::lock;
use crate::scheduler::TaskScheduler;
use crate::tracker::Tracker;

use super::block_on;
use super::capture::write_task_report;

pub fn run(state_dir: &Path, once: bool) -> Result<()> {
    let _lock = lock::acquire(state_dir)?;
    let config = Config::load(state_dir)?;
    let tracker = Tracker::from_config(&config, state_dir)?;
    let settings = config.schedule.settings();
    let scheduler = TaskScheduler::register(settings, |sink| tracker.background_adapter(sink));
    let _status_log = tracker
        .listeners()
        .subscribe(|status| tracing::debug!("status: {:?}", status));

    tracing::info!(
        "geotrail starting, state_dir={}, interval={}s, budget={}s",
        state_dir.display(),
        settings.interval.as_secs(),
        settings.budget.as_secs()
    );

    if once {
        let report = block_on(scheduler.run_once())?;
        write_task_report(&mut std::io::stdout().lock(), &report)?;
        return Ok(());
    }

    block_on(async {
        let cancel = CancellationToken::new();
        let interrupt = tokio::spawn({
            let cancel = cancel.clone();
            async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    tracing::info!("interrupt received, shutting down");
                    cancel.cancel();
                }
            }
        });
        scheduler.run(cancel).await;
        interrupt.abort();
    })?;

    tracing::info!("geotrail stopped");
    Ok(())
}
