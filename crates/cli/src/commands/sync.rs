// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use std::path::Path;

use crate::config::Config;
use crate::error::Result;
use crate::status::StatusRegistry;
use crate::tracker::{open_queue, sync_engine};

use super::block_on;

/// Deliver pending records without capturing.
pub fn run(state_dir: &Path) -> Result<()> {
    let config = Config::load(state_dir)?;
    let queue = open_queue(state_dir)?;
    let engine = sync_engine(&config, state_dir, queue, StatusRegistry::new())?;
    let outcome = block_on(engine.try_sync())??;
    println!("{}", outcome);
    Ok(())
}
