// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Single location capture with fallback and bounded waits.
//!
//! Strategy:
//! 1. Ask the provider for one high-accuracy fix, accepting a cached fix
//!    younger than `max_cache_age`.
//! 2. Foreground only: if that fails with "unavailable" or "timeout",
//!    subscribe to a continuous watch, take the first fix and cancel.
//! 3. Background only: race the request against an outer deadline. The OS
//!    kills background work that overruns its budget, so the deadline wins
//!    even when the provider ignores its own timeout.

use std::sync::Arc;
use std::time::Duration;

use futures_util::StreamExt;
use gt_core::{CaptureMode, ClockSource, Fix, LocationRecord};

use crate::geo::{FixRequest, GeoError, GeoErrorCode, GeoProvider, WatchId};
use crate::status::{LocationStatus, StatusRegistry};

/// Slack granted to a provider past its own timeout before the caller gives up.
const PROVIDER_GRACE: Duration = Duration::from_secs(1);

/// Timing and strategy knobs for [`LocationCapture`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptureSettings {
    /// Provider timeout for the single-shot request.
    pub fix_timeout: Duration,
    /// Maximum age of a cached fix that satisfies a request.
    pub max_cache_age: Duration,
    /// Outer deadline for background captures.
    pub background_deadline: Duration,
    /// Whether foreground captures fall back to a continuous watch.
    pub watch_fallback: bool,
    /// How long the fallback watch may wait for its first fix.
    pub fallback_timeout: Duration,
}

impl Default for CaptureSettings {
    fn default() -> Self {
        CaptureSettings {
            fix_timeout: Duration::from_secs(15),
            max_cache_age: Duration::from_secs(10),
            background_deadline: Duration::from_secs(20),
            watch_fallback: true,
            fallback_timeout: Duration::from_secs(30),
        }
    }
}

/// Error type for capture operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CaptureError {
    /// No fix arrived before the applicable deadline.
    #[error("timed out waiting for a location fix")]
    Timeout,

    /// Location access is not granted. Not retried.
    #[error("location permission denied")]
    PermissionDenied,

    /// The provider failed or produced an unusable fix.
    #[error("location provider error: {0}")]
    ProviderError(String),
}

impl CaptureError {
    /// Returns true if a later attempt may succeed without user action.
    pub fn is_transient(&self) -> bool {
        !matches!(self, CaptureError::PermissionDenied)
    }
}

impl From<GeoError> for CaptureError {
    fn from(e: GeoError) -> Self {
        match e.code {
            GeoErrorCode::PermissionDenied => CaptureError::PermissionDenied,
            GeoErrorCode::Timeout => CaptureError::Timeout,
            GeoErrorCode::PositionUnavailable => CaptureError::ProviderError(e.message),
        }
    }
}

/// Result type for capture operations.
pub type CaptureResult<T> = Result<T, CaptureError>;

/// Cancels a watch subscription when dropped.
///
/// Covers every exit path, including the capture future being dropped by an
/// outer timeout.
struct WatchGuard<'a> {
    provider: &'a dyn GeoProvider,
    id: WatchId,
}

impl Drop for WatchGuard<'_> {
    fn drop(&mut self) {
        self.provider.cancel(self.id);
    }
}

/// Orchestrates location fetches and owns the status listener registry.
pub struct LocationCapture {
    provider: Arc<dyn GeoProvider>,
    clock: Arc<dyn ClockSource>,
    settings: CaptureSettings,
    listeners: StatusRegistry,
}

impl LocationCapture {
    pub fn new(
        provider: Arc<dyn GeoProvider>,
        clock: Arc<dyn ClockSource>,
        settings: CaptureSettings,
    ) -> Self {
        LocationCapture {
            provider,
            clock,
            settings,
            listeners: StatusRegistry::new(),
        }
    }

    /// The status registry owned by this capture context.
    pub fn listeners(&self) -> &StatusRegistry {
        &self.listeners
    }

    pub fn settings(&self) -> &CaptureSettings {
        &self.settings
    }

    /// Captures one location.
    ///
    /// Does not persist or transmit anything.
    pub async fn capture(&self, mode: CaptureMode) -> CaptureResult<LocationRecord> {
        self.listeners.publish(&LocationStatus::Acquiring { mode });

        let fix = match mode {
            CaptureMode::Foreground => self.capture_foreground().await,
            CaptureMode::Background => self.capture_background().await,
        };
        let result = fix.and_then(|fix| {
            LocationRecord::from_fix(&fix, self.clock.now())
                .map_err(|e| CaptureError::ProviderError(e.to_string()))
        });

        match &result {
            Ok(record) => {
                tracing::debug!("{} capture: {}", mode, record);
                self.listeners.publish(&LocationStatus::Captured(*record));
            }
            Err(e) => {
                if e.is_transient() {
                    tracing::warn!("{} capture failed: {}", mode, e);
                } else {
                    tracing::error!("{} capture failed: {}", mode, e);
                }
                self.listeners.publish(&LocationStatus::CaptureFailed {
                    mode,
                    error: e.to_string(),
                });
            }
        }
        result
    }

    fn request(&self) -> FixRequest {
        FixRequest {
            high_accuracy: true,
            timeout: self.settings.fix_timeout,
            max_cache_age: self.settings.max_cache_age,
        }
    }

    async fn capture_foreground(&self) -> CaptureResult<Fix> {
        let primary = tokio::time::timeout(
            self.settings.fix_timeout + PROVIDER_GRACE,
            self.provider.get_fix(self.request()),
        )
        .await
        .unwrap_or_else(|_| Err(GeoError::timeout("provider ignored its timeout")));

        match primary {
            Ok(fix) => Ok(fix),
            Err(e)
                if self.settings.watch_fallback
                    && matches!(
                        e.code,
                        GeoErrorCode::PositionUnavailable | GeoErrorCode::Timeout
                    ) =>
            {
                tracing::debug!("single fix failed ({}), falling back to watch", e);
                self.first_watched_fix().await
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn first_watched_fix(&self) -> CaptureResult<Fix> {
        let watch = self.provider.watch(self.request())?;
        let _guard = WatchGuard {
            provider: self.provider.as_ref(),
            id: watch.id,
        };
        let mut fixes = watch.fixes;

        match tokio::time::timeout(self.settings.fallback_timeout, fixes.next()).await {
            Ok(Some(Ok(fix))) => Ok(fix),
            Ok(Some(Err(e))) => Err(e.into()),
            Ok(None) => Err(CaptureError::ProviderError(
                "watch ended without a fix".to_string(),
            )),
            Err(_) => Err(CaptureError::Timeout),
        }
    }

    async fn capture_background(&self) -> CaptureResult<Fix> {
        let deadline = self.settings.background_deadline;
        match tokio::time::timeout(deadline, self.provider.get_fix(self.request())).await {
            Ok(result) => result.map_err(CaptureError::from),
            Err(_) => {
                tracing::warn!(
                    "background capture abandoned after {}ms deadline",
                    deadline.as_millis()
                );
                Err(CaptureError::Timeout)
            }
        }
    }
}

#[cfg(test)]
#[path = "capture_tests.rs"]
mod tests;
