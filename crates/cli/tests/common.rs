// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

// Allow unused items: test helpers are shared across multiple test binaries,
// and not every test file uses every helper.
#![allow(dead_code)]
#![allow(unused_imports)]

use std::path::Path;

use assert_cmd::cargo::cargo_bin_cmd;
use assert_cmd::Command;

pub use predicates::prelude::*;
pub use tempfile::TempDir;

/// `geotrail` bound to `state_dir`, with the environment scrubbed.
pub fn geotrail(state_dir: &Path) -> Command {
    let mut cmd = cargo_bin_cmd!("geotrail");
    cmd.arg("--state-dir")
        .arg(state_dir)
        .env_remove("GEOTRAIL_STATE_DIR")
        .env_remove("GEOTRAIL_TOKEN")
        .env_remove("RUST_LOG");
    cmd
}

/// A state dir whose config uses a static provider and no server.
pub fn static_state() -> TempDir {
    let temp = TempDir::new().unwrap();
    write_config(
        temp.path(),
        "[provider]\nkind = \"static\"\nlatitude = 52.52\nlongitude = 13.405\n",
    );
    temp
}

pub fn write_config(state_dir: &Path, content: &str) {
    std::fs::write(state_dir.join("config.toml"), content).unwrap();
}

/// Runs `geotrail pending --json` and parses the records.
pub fn pending(state_dir: &Path) -> Vec<serde_json::Value> {
    let output = geotrail(state_dir)
        .args(["pending", "--json"])
        .output()
        .unwrap();
    assert!(output.status.success());
    serde_json::from_slice(&output.stdout).unwrap()
}
