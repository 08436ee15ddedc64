// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Tracing subscriber setup.
//!
//! `RUST_LOG` overrides the default level in both modes.

use std::fs;
use std::path::Path;

use tracing_subscriber::EnvFilter;

use crate::env::vars;

fn filter(default_level: &str) -> EnvFilter {
    EnvFilter::try_from_env(vars::RUST_LOG).unwrap_or_else(|_| EnvFilter::new(default_level))
}

/// Logs to stderr. Used by one-shot commands.
pub fn init_stderr(default_level: &str) {
    // A subscriber may already be installed (tests, repeated runs).
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter(default_level))
        .with_writer(std::io::stderr)
        .try_init();
}

/// Appends to `log_path`, falling back to stderr if it cannot be opened.
pub fn init_file(log_path: &Path, default_level: &str) {
    let filter = filter(default_level);

    if let Ok(file) = fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_path)
    {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(file)
            .with_ansi(false)
            .try_init();
    } else {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .try_init();
    }
}
