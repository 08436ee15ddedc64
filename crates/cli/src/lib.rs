// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! gtrs - background location capture, buffering and sync.
//!
//! This crate provides the functionality behind the `geotrail` CLI: capture a
//! location fix, append it to a durable on-disk queue, and deliver queued
//! records to an HTTP endpoint once the network is reachable.
//!
//! # Main Components
//!
//! - [`LocationCapture`] - single fixes with watch fallback and hard deadlines
//! - [`SyncEngine`] - ordered, stop-on-first-failure delivery of the queue
//! - [`BackgroundTaskAdapter`] - one OS background invocation under a budget
//! - [`Tracker`] - the long-lived context tying the pieces together
//! - [`Config`] - `<state_dir>/config.toml`
//!
//! ```rust,ignore
//! use gtrs::{Config, Tracker};
//!
//! let config = Config::load(&state_dir)?;
//! let tracker = Tracker::from_config(&config, &state_dir)?;
//! let report = tracker.capture_now().await?;
//! ```

mod cli;
mod commands;
mod env;
mod lock;
mod logging;

pub mod auth;
pub mod background;
pub mod capture;
pub mod config;
pub mod connectivity;
pub mod error;
pub mod geo;
pub mod scheduler;
pub mod status;
pub mod sync;
pub mod tracker;

#[cfg(test)]
mod test_helpers;

pub use background::{BackgroundTaskAdapter, TaskInvocation, TaskOutcome, TaskReport};
pub use capture::{CaptureError, CaptureSettings, LocationCapture};
pub use cli::{Cli, Command};
pub use config::Config;
pub use error::{Error, Result};
pub use scheduler::TaskScheduler;
pub use status::{LocationStatus, StatusRegistry};
pub use sync::{SyncEngine, SyncOutcome};
pub use tracker::Tracker;

/// Execute a CLI invocation. This is the main entry point for library users
/// and provides a testable way to run commands without process execution.
pub fn run(cli: Cli) -> Result<()> {
    let state_dir = config::resolve_state_dir(cli.state_dir.as_deref())?;
    std::fs::create_dir_all(&state_dir)?;

    match &cli.command {
        Command::Run { .. } => logging::init_file(&state_dir.join("geotrail.log"), "info"),
        _ => logging::init_stderr("warn"),
    }

    match cli.command {
        Command::Capture { background } => commands::capture::run(&state_dir, background),
        Command::Sync => commands::sync::run(&state_dir),
        Command::Status => commands::status::run(&state_dir),
        Command::Pending { json } => commands::pending::run(&state_dir, json),
        Command::Clear => commands::clear::run(&state_dir),
        Command::Run { once } => commands::run::run(&state_dir, once),
    }
}

#[cfg(test)]
#[path = "lib_tests.rs"]
mod tests;
