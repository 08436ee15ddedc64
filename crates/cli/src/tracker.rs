// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Tracker context: one long-lived set of capture, queue and sync components.
//!
//! The foreground flow and every background invocation share the same
//! [`LocationCapture`] (and so the same status listeners), the same
//! [`PendingQueue`] and the same [`SyncEngine`], which keeps at most one
//! sync in flight across both.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use gt_core::{
    CaptureMode, ClockSource, FileStore, KeyValueStore, LocationRecord, PendingQueue, SystemClock,
};

use crate::auth::{FileToken, StaticToken, TokenSource};
use crate::background::{BackgroundTaskAdapter, CompletionSink};
use crate::capture::{CaptureSettings, LocationCapture};
use crate::config::{Config, ProviderConfig};
use crate::connectivity::{ConnectivityOracle, Offline, TcpProbe};
use crate::env;
use crate::error::{Error, Result};
use crate::geo::{GeoProvider, ReplayProvider, StaticProvider};
use crate::status::{LocationStatus, StatusRegistry};
use crate::sync::{HttpTransport, NoEndpoint, SyncEngine, SyncOutcome, Transport};

/// Result of a foreground capture.
#[derive(Debug, Clone, PartialEq)]
pub struct ForegroundReport {
    pub record: LocationRecord,
    /// Queue length right after the record was appended.
    pub pending: usize,
    pub sync: SyncOutcome,
}

/// Owns the components shared by foreground and background flows.
pub struct Tracker {
    capture: Arc<LocationCapture>,
    queue: Arc<PendingQueue>,
    sync: Arc<SyncEngine>,
}

impl Tracker {
    pub fn new(
        provider: Arc<dyn GeoProvider>,
        clock: Arc<dyn ClockSource>,
        settings: CaptureSettings,
        store: Arc<dyn KeyValueStore>,
        transport: Arc<dyn Transport>,
        oracle: Arc<dyn ConnectivityOracle>,
    ) -> Self {
        let capture = Arc::new(LocationCapture::new(provider, clock, settings));
        let queue = Arc::new(PendingQueue::new(store));
        let sync = Arc::new(SyncEngine::new(
            Arc::clone(&queue),
            transport,
            oracle,
            capture.listeners().clone(),
        ));
        Tracker {
            capture,
            queue,
            sync,
        }
    }

    /// Wires a tracker from configuration rooted at `state_dir`.
    pub fn from_config(config: &Config, state_dir: &Path) -> Result<Self> {
        let provider = provider(config, state_dir)?;
        let store: Arc<dyn KeyValueStore> = Arc::new(FileStore::open(state_dir)?);
        let (transport, oracle) = endpoint(config, state_dir)?;
        Ok(Self::new(
            provider,
            Arc::new(SystemClock),
            config.capture.settings(),
            store,
            transport,
            oracle,
        ))
    }

    /// Captures in the foreground, stores the record, then tries to sync.
    ///
    /// The record is durable before any network attempt. A capture failure
    /// stores nothing.
    pub async fn capture_now(&self) -> Result<ForegroundReport> {
        let record = self.capture.capture(CaptureMode::Foreground).await?;
        self.queue.append(&record)?;
        let pending = self.queue.len()?;
        self.capture
            .listeners()
            .publish(&LocationStatus::Queued { pending });
        tracing::info!("queued {} ({} pending)", record, pending);

        let sync = self.sync.try_sync().await?;
        Ok(ForegroundReport {
            record,
            pending,
            sync,
        })
    }

    /// Builds a background adapter sharing this tracker's components.
    pub fn background_adapter(&self, completion: Arc<dyn CompletionSink>) -> BackgroundTaskAdapter {
        BackgroundTaskAdapter::new(
            Arc::clone(&self.capture),
            Arc::clone(&self.queue),
            Arc::clone(&self.sync),
            completion,
        )
    }

    pub fn listeners(&self) -> &StatusRegistry {
        self.capture.listeners()
    }

    pub fn queue(&self) -> &Arc<PendingQueue> {
        &self.queue
    }

    pub fn sync(&self) -> &Arc<SyncEngine> {
        &self.sync
    }
}

impl std::fmt::Debug for Tracker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Tracker")
            .field("queue", &self.queue)
            .field("sync", &self.sync)
            .finish_non_exhaustive()
    }
}

/// Opens the pending queue kept in `state_dir`.
pub fn open_queue(state_dir: &Path) -> Result<Arc<PendingQueue>> {
    let store: Arc<dyn KeyValueStore> = Arc::new(FileStore::open(state_dir)?);
    Ok(Arc::new(PendingQueue::new(store)))
}

/// Builds a sync engine for `queue` from configuration alone.
///
/// Used by commands that sync without capturing.
pub fn sync_engine(
    config: &Config,
    state_dir: &Path,
    queue: Arc<PendingQueue>,
    listeners: StatusRegistry,
) -> Result<SyncEngine> {
    let (transport, oracle) = endpoint(config, state_dir)?;
    Ok(SyncEngine::new(queue, transport, oracle, listeners))
}

/// Builds the configured location provider.
pub fn provider(config: &Config, state_dir: &Path) -> Result<Arc<dyn GeoProvider>> {
    match &config.provider {
        Some(ProviderConfig::Static {
            latitude,
            longitude,
            accuracy_m,
        }) => Ok(Arc::new(StaticProvider::new(
            *latitude,
            *longitude,
            *accuracy_m,
        ))),
        Some(ProviderConfig::Replay {
            path,
            acquire_delay_ms,
            watch_interval_ms,
        }) => {
            let path = state_dir.join(path);
            let replay = ReplayProvider::from_file(
                &path,
                Duration::from_millis(*acquire_delay_ms),
                Duration::from_millis(*watch_interval_ms),
            )?;
            tracing::debug!("replaying {} fix(es) from {}", replay.len(), path.display());
            Ok(Arc::new(replay))
        }
        None => Err(Error::NoProvider(
            Config::path(state_dir).display().to_string(),
        )),
    }
}

fn endpoint(
    config: &Config,
    state_dir: &Path,
) -> Result<(Arc<dyn Transport>, Arc<dyn ConnectivityOracle>)> {
    let Some(url) = config.server_url()? else {
        tracing::debug!("no server.url configured, records stay queued");
        return Ok((Arc::new(NoEndpoint), Arc::new(Offline)));
    };
    let probe_timeout = Duration::from_millis(config.connectivity.probe_timeout_ms);
    let probe = TcpProbe::for_url(&url, probe_timeout)
        .ok_or_else(|| Error::Config(format!("server.url '{}' has no host or port", url)))?;
    let transport = HttpTransport::new(
        url,
        Duration::from_secs(config.server.timeout_secs),
        token_source(config, state_dir),
    )?;
    Ok((Arc::new(transport), Arc::new(probe)))
}

fn token_source(config: &Config, state_dir: &Path) -> Option<Arc<dyn TokenSource>> {
    if let Some(path) = &config.auth.token_file {
        return Some(Arc::new(FileToken::new(&state_dir.join(path))));
    }
    config
        .auth
        .token
        .clone()
        .or_else(env::token)
        .map(|token| Arc::new(StaticToken::new(token)) as Arc<dyn TokenSource>)
}

#[cfg(test)]
#[path = "tracker_tests.rs"]
mod tests;
