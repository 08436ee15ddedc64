// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Location provider abstraction.
//!
//! Models the device geolocation API as a trait with two query shapes:
//! a cancellable single-shot fix ([`GeoProvider::get_fix`]) and a
//! continuous watch ([`GeoProvider::watch`]) that must be released with
//! [`GeoProvider::cancel`]. Implementations:
//!
//! - [`StaticProvider`] - always reports the configured coordinates
//! - [`ReplayProvider`] - replays a JSONL trace of fixes

mod fixed;
mod replay;

use std::fmt;
use std::time::Duration;

use futures_util::future::BoxFuture;
use futures_util::stream::BoxStream;
use gt_core::Fix;

pub use fixed::StaticProvider;
pub use replay::ReplayProvider;

/// Error code reported by a location provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GeoErrorCode {
    /// The user or OS refused location access.
    PermissionDenied,
    /// No fix could be determined (no signal, provider off).
    PositionUnavailable,
    /// The provider's own timeout elapsed.
    Timeout,
}

impl fmt::Display for GeoErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GeoErrorCode::PermissionDenied => write!(f, "permission denied"),
            GeoErrorCode::PositionUnavailable => write!(f, "position unavailable"),
            GeoErrorCode::Timeout => write!(f, "timeout"),
        }
    }
}

/// Error returned by a location provider.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{code}: {message}")]
pub struct GeoError {
    pub code: GeoErrorCode,
    pub message: String,
}

impl GeoError {
    pub fn new(code: GeoErrorCode, message: impl Into<String>) -> Self {
        GeoError {
            code,
            message: message.into(),
        }
    }

    pub fn permission_denied(message: impl Into<String>) -> Self {
        Self::new(GeoErrorCode::PermissionDenied, message)
    }

    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::new(GeoErrorCode::PositionUnavailable, message)
    }

    pub fn timeout(message: impl Into<String>) -> Self {
        Self::new(GeoErrorCode::Timeout, message)
    }
}

/// Result type for provider operations.
pub type GeoResult<T> = Result<T, GeoError>;

/// Parameters for a fix request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixRequest {
    /// Ask for GPS-grade accuracy rather than a coarse network fix.
    pub high_accuracy: bool,
    /// How long the provider may spend acquiring a fix.
    pub timeout: Duration,
    /// A cached fix younger than this satisfies the request.
    pub max_cache_age: Duration,
}

/// Handle identifying an active watch subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WatchId(pub u64);

impl fmt::Display for WatchId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "watch-{}", self.0)
    }
}

/// An active watch subscription: its handle plus the stream of fixes.
pub struct Watch {
    pub id: WatchId,
    pub fixes: BoxStream<'static, GeoResult<Fix>>,
}

impl fmt::Debug for Watch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Watch")
            .field("id", &self.id)
            .field("fixes", &"<stream>")
            .finish()
    }
}

/// Device location API.
///
/// This trait abstracts over the platform location service, allowing
/// stub providers in tests.
pub trait GeoProvider: Send + Sync {
    /// Requests a single fix.
    fn get_fix(&self, request: FixRequest) -> BoxFuture<'_, GeoResult<Fix>>;

    /// Starts a continuous watch. The caller must [`cancel`](Self::cancel) it.
    fn watch(&self, request: FixRequest) -> GeoResult<Watch>;

    /// Tears down a watch subscription. Unknown ids are ignored.
    fn cancel(&self, id: WatchId);
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
