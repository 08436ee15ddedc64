// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "geotrail")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Capture device locations, buffer them durably and sync them to a server")]
#[command(
    long_about = "Capture device locations, buffer them durably and sync them to a server.\n\n\
    Records are appended to an on-disk queue before any network attempt and are\n\
    only removed once the server has acknowledged them."
)]
pub struct Cli {
    /// State directory holding config.toml, the pending queue and logs
    #[arg(long = "state-dir", global = true, value_name = "DIR")]
    pub state_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Capture one location, queue it and try to sync
    #[command(after_help = "\
Examples:
  geotrail capture                 Foreground capture with watch fallback
  geotrail capture --background    Run one background task invocation")]
    Capture {
        /// Run as a background task invocation (hard deadline, no fallback)
        #[arg(long)]
        background: bool,
    },

    /// Deliver pending records to the server
    Sync,

    /// Show queue, endpoint and scheduler status
    Status,

    /// List pending records, oldest first
    Pending {
        /// Print as a JSON array
        #[arg(long)]
        json: bool,
    },

    /// Discard every pending record
    Clear,

    /// Run the periodic background scheduler until interrupted
    Run {
        /// Invoke the background task once and exit
        #[arg(long)]
        once: bool,
    },
}

#[cfg(test)]
#[path = "../cli_tests/mod.rs"]
mod tests;
