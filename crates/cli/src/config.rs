// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Tracker configuration.
//!
//! Configuration is stored in `<state_dir>/config.toml`. Every section and
//! field is optional; a missing file means all defaults.
//!
//! ```toml
//! [server]
//! url = "https://example.com/api/locations"
//!
//! [provider]
//! kind = "static"
//! latitude = 52.52
//! longitude = 13.405
//! ```

use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::capture::CaptureSettings;
use crate::env;
use crate::error::{Error, Result};
use crate::scheduler::ScheduleSettings;

const CONFIG_FILE_NAME: &str = "config.toml";
const APP_DIR_NAME: &str = "geotrail";

/// Upper bound for every configured duration: one day.
const MAX_SECS: u64 = 86_400;
const MAX_MS: u64 = MAX_SECS * 1_000;

/// Configuration stored in `<state_dir>/config.toml`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub auth: AuthConfig,
    pub capture: CaptureConfig,
    pub schedule: ScheduleConfig,
    pub connectivity: ConnectivityConfig,
    /// Location source. Commands that capture fail without one.
    pub provider: Option<ProviderConfig>,
}

/// Remote sync endpoint.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ServerConfig {
    /// Records are POSTed here. Without a URL, records stay queued.
    #[serde(default)]
    pub url: Option<String>,
    /// Per-request timeout in seconds (default: 10).
    #[serde(default = "default_server_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            url: None,
            timeout_secs: default_server_timeout_secs(),
        }
    }
}

fn default_server_timeout_secs() -> u64 {
    10
}

/// Bearer token for the sync endpoint.
///
/// `token_file` wins over `token`; `GEOTRAIL_TOKEN` is used when neither is set.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct AuthConfig {
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default)]
    pub token_file: Option<PathBuf>,
}

/// Capture timings, in milliseconds.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CaptureConfig {
    #[serde(default = "default_foreground_timeout_ms")]
    pub foreground_timeout_ms: u64,
    #[serde(default = "default_max_cache_age_ms")]
    pub max_cache_age_ms: u64,
    #[serde(default = "default_background_deadline_ms")]
    pub background_deadline_ms: u64,
    #[serde(default = "default_watch_fallback")]
    pub watch_fallback: bool,
    #[serde(default = "default_fallback_timeout_ms")]
    pub fallback_timeout_ms: u64,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        CaptureConfig {
            foreground_timeout_ms: default_foreground_timeout_ms(),
            max_cache_age_ms: default_max_cache_age_ms(),
            background_deadline_ms: default_background_deadline_ms(),
            watch_fallback: default_watch_fallback(),
            fallback_timeout_ms: default_fallback_timeout_ms(),
        }
    }
}

impl CaptureConfig {
    pub fn settings(&self) -> CaptureSettings {
        CaptureSettings {
            fix_timeout: Duration::from_millis(self.foreground_timeout_ms),
            max_cache_age: Duration::from_millis(self.max_cache_age_ms),
            background_deadline: Duration::from_millis(self.background_deadline_ms),
            watch_fallback: self.watch_fallback,
            fallback_timeout: Duration::from_millis(self.fallback_timeout_ms),
        }
    }
}

fn default_foreground_timeout_ms() -> u64 {
    15_000
}

fn default_max_cache_age_ms() -> u64 {
    10_000
}

fn default_background_deadline_ms() -> u64 {
    20_000
}

fn default_watch_fallback() -> bool {
    true
}

fn default_fallback_timeout_ms() -> u64 {
    30_000
}

/// Background schedule for `geotrail run`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ScheduleConfig {
    /// Seconds between background runs (default: 900).
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,
    /// Wall-clock budget per run in seconds (default: 30).
    #[serde(default = "default_budget_secs")]
    pub budget_secs: u64,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        ScheduleConfig {
            interval_secs: default_interval_secs(),
            budget_secs: default_budget_secs(),
        }
    }
}

impl ScheduleConfig {
    pub fn settings(&self) -> ScheduleSettings {
        ScheduleSettings {
            interval: Duration::from_secs(self.interval_secs.max(1)),
            budget: Duration::from_secs(self.budget_secs),
        }
    }
}

fn default_interval_secs() -> u64 {
    900
}

fn default_budget_secs() -> u64 {
    30
}

/// Reachability probe.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ConnectivityConfig {
    #[serde(default = "default_probe_timeout_ms")]
    pub probe_timeout_ms: u64,
}

impl Default for ConnectivityConfig {
    fn default() -> Self {
        ConnectivityConfig {
            probe_timeout_ms: default_probe_timeout_ms(),
        }
    }
}

fn default_probe_timeout_ms() -> u64 {
    3_000
}

/// Location source.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ProviderConfig {
    /// Fixed coordinates.
    Static {
        latitude: f64,
        longitude: f64,
        #[serde(default)]
        accuracy_m: Option<f64>,
    },
    /// A JSONL trace of fixes. Relative paths resolve against the state dir.
    Replay {
        path: PathBuf,
        #[serde(default = "default_acquire_delay_ms")]
        acquire_delay_ms: u64,
        #[serde(default = "default_watch_interval_ms")]
        watch_interval_ms: u64,
    },
}

fn default_acquire_delay_ms() -> u64 {
    0
}

fn default_watch_interval_ms() -> u64 {
    1_000
}

impl Config {
    /// Path of the config file inside `state_dir`.
    pub fn path(state_dir: &Path) -> PathBuf {
        state_dir.join(CONFIG_FILE_NAME)
    }

    /// Loads configuration from `state_dir`. A missing file yields defaults.
    pub fn load(state_dir: &Path) -> Result<Self> {
        let config_path = Self::path(state_dir);
        let content = match fs::read_to_string(&config_path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Config::default()),
            Err(e) => return Err(Error::Config(format!("failed to read config: {}", e))),
        };
        let config: Config = toml::from_str(&content)
            .map_err(|e| Error::Config(format!("failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if let Some(url) = &self.server.url {
            let parsed = reqwest::Url::parse(url)
                .map_err(|e| Error::Config(format!("invalid server.url '{}': {}", url, e)))?;
            if !matches!(parsed.scheme(), "http" | "https") {
                return Err(Error::Config(format!(
                    "invalid server.url '{}': must be http:// or https://",
                    url
                )));
            }
        }
        check_range("server.timeout_secs", self.server.timeout_secs, 1, MAX_SECS)?;

        let capture = &self.capture;
        check_range("capture.foreground_timeout_ms", capture.foreground_timeout_ms, 1, MAX_MS)?;
        check_range("capture.max_cache_age_ms", capture.max_cache_age_ms, 0, MAX_MS)?;
        check_range("capture.background_deadline_ms", capture.background_deadline_ms, 1, MAX_MS)?;
        check_range("capture.fallback_timeout_ms", capture.fallback_timeout_ms, 1, MAX_MS)?;

        check_range("schedule.interval_secs", self.schedule.interval_secs, 0, MAX_SECS)?;
        check_range("schedule.budget_secs", self.schedule.budget_secs, 1, MAX_SECS)?;
        check_range("connectivity.probe_timeout_ms", self.connectivity.probe_timeout_ms, 1, MAX_MS)?;

        if let Some(ProviderConfig::Replay {
            acquire_delay_ms,
            watch_interval_ms,
            ..
        }) = &self.provider
        {
            check_range("provider.acquire_delay_ms", *acquire_delay_ms, 0, MAX_MS)?;
            check_range("provider.watch_interval_ms", *watch_interval_ms, 1, MAX_MS)?;
        }
        Ok(())
    }

    /// The sync endpoint, if one is configured.
    pub fn server_url(&self) -> Result<Option<reqwest::Url>> {
        self.server
            .url
            .as_deref()
            .map(|url| {
                reqwest::Url::parse(url)
                    .map_err(|e| Error::Config(format!("invalid server.url '{}': {}", url, e)))
            })
            .transpose()
    }
}

fn check_range(name: &str, value: u64, min: u64, max: u64) -> Result<()> {
    if (min..=max).contains(&value) {
        Ok(())
    } else {
        Err(Error::Config(format!(
            "{} must be between {} and {}, got {}",
            name, min, max, value
        )))
    }
}

/// Resolves the state directory.
///
/// Precedence: `explicit` (the `--state-dir` flag), `GEOTRAIL_STATE_DIR`,
/// `$XDG_STATE_HOME/geotrail`, `~/.local/state/geotrail`.
pub fn resolve_state_dir(explicit: Option<&Path>) -> Result<PathBuf> {
    state_dir_from(
        explicit,
        env::state_dir(),
        env::xdg_state_home(),
        dirs::home_dir(),
    )
    .ok_or(Error::NoStateDir)
}

fn state_dir_from(
    explicit: Option<&Path>,
    env_dir: Option<PathBuf>,
    xdg_state_home: Option<PathBuf>,
    home: Option<PathBuf>,
) -> Option<PathBuf> {
    explicit
        .map(Path::to_path_buf)
        .or(env_dir)
        .or_else(|| xdg_state_home.map(|d| d.join(APP_DIR_NAME)))
        .or_else(|| home.map(|h| h.join(".local").join("state").join(APP_DIR_NAME)))
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
