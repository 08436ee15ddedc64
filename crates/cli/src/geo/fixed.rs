// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Provider that always reports the same coordinates.
//!
//! Useful for stationary devices and for exercising the pipeline without
//! location hardware.

use std::sync::atomic::{AtomicU64, Ordering};

use futures_util::future::{self, BoxFuture, FutureExt};
use futures_util::stream::{self, StreamExt};
use gt_core::Fix;

use super::{FixRequest, GeoProvider, GeoResult, Watch, WatchId};

/// Reports a fixed position on every request.
#[derive(Debug)]
pub struct StaticProvider {
    fix: Fix,
    next_watch: AtomicU64,
}

impl StaticProvider {
    pub fn new(latitude: f64, longitude: f64, accuracy_m: Option<f64>) -> Self {
        StaticProvider {
            fix: Fix {
                latitude,
                longitude,
                accuracy_m,
                timestamp: None,
            },
            next_watch: AtomicU64::new(1),
        }
    }
}

impl GeoProvider for StaticProvider {
    fn get_fix(&self, _request: FixRequest) -> BoxFuture<'_, GeoResult<Fix>> {
        future::ready(Ok(self.fix)).boxed()
    }

    fn watch(&self, _request: FixRequest) -> GeoResult<Watch> {
        let id = WatchId(self.next_watch.fetch_add(1, Ordering::Relaxed));
        // A real watch keeps the subscription open after the first fix.
        let fixes = stream::once(future::ready(Ok(self.fix)))
            .chain(stream::pending())
            .boxed();
        Ok(Watch { id, fixes })
    }

    fn cancel(&self, id: WatchId) {
        tracing::trace!("static provider: {} cancelled", id);
    }
}

#[cfg(test)]
#[path = "fixed_tests.rs"]
mod tests;
