// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Provider that replays a recorded trace of fixes.
//!
//! The trace is a JSONL file of [`Fix`] values. Each fresh acquisition takes
//! the next fix (wrapping around at the end) after a simulated
//! time-to-fix delay. Requests whose `max_cache_age` covers the last
//! acquisition get the cached fix back without advancing the trace.

use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use futures_util::future::{BoxFuture, FutureExt};
use futures_util::stream::{self, StreamExt};
use gt_core::{jsonl, Fix};
use tokio::time::Instant;

use super::{FixRequest, GeoError, GeoProvider, GeoResult, Watch, WatchId};

struct ReplayState {
    next: usize,
    last: Option<(Fix, Instant)>,
}

struct Inner {
    fixes: Vec<Fix>,
    acquire_delay: Duration,
    state: Mutex<ReplayState>,
}

impl Inner {
    fn advance(&self) -> GeoResult<Fix> {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        if self.fixes.is_empty() {
            return Err(GeoError::unavailable("replay trace is empty"));
        }
        let fix = self.fixes[state.next % self.fixes.len()];
        state.next = state.next.wrapping_add(1);
        state.last = Some((fix, Instant::now()));
        Ok(fix)
    }

    fn cached(&self, max_age: Duration) -> Option<Fix> {
        let state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        state
            .last
            .filter(|(_, at)| at.elapsed() <= max_age)
            .map(|(fix, _)| fix)
    }
}

/// Replays fixes from a recorded trace.
pub struct ReplayProvider {
    inner: Arc<Inner>,
    watches: Mutex<HashMap<WatchId, Arc<AtomicBool>>>,
    next_watch: AtomicU64,
    watch_interval: Duration,
}

impl ReplayProvider {
    /// Creates a provider over an in-memory trace.
    pub fn new(fixes: Vec<Fix>, acquire_delay: Duration, watch_interval: Duration) -> Self {
        ReplayProvider {
            inner: Arc::new(Inner {
                fixes,
                acquire_delay,
                state: Mutex::new(ReplayState {
                    next: 0,
                    last: None,
                }),
            }),
            watches: Mutex::new(HashMap::new()),
            next_watch: AtomicU64::new(1),
            watch_interval,
        }
    }

    /// Loads a trace from a JSONL file.
    pub fn from_file(
        path: &Path,
        acquire_delay: Duration,
        watch_interval: Duration,
    ) -> gt_core::Result<Self> {
        let fixes = jsonl::read_all(path)?;
        Ok(Self::new(fixes, acquire_delay, watch_interval))
    }

    /// Number of fixes in the trace.
    pub fn len(&self) -> usize {
        self.inner.fixes.len()
    }

    /// Checks if the trace has no fixes.
    pub fn is_empty(&self) -> bool {
        self.inner.fixes.is_empty()
    }

    /// Number of watch subscriptions not yet cancelled.
    pub fn active_watches(&self) -> usize {
        self.watches
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .len()
    }
}

impl GeoProvider for ReplayProvider {
    fn get_fix(&self, request: FixRequest) -> BoxFuture<'_, GeoResult<Fix>> {
        async move {
            if let Some(fix) = self.inner.cached(request.max_cache_age) {
                return Ok(fix);
            }
            if self.inner.acquire_delay > request.timeout {
                tokio::time::sleep(request.timeout).await;
                return Err(GeoError::timeout(format!(
                    "no fix within {}ms",
                    request.timeout.as_millis()
                )));
            }
            tokio::time::sleep(self.inner.acquire_delay).await;
            self.inner.advance()
        }
        .boxed()
    }

    fn watch(&self, _request: FixRequest) -> GeoResult<Watch> {
        let id = WatchId(self.next_watch.fetch_add(1, Ordering::Relaxed));
        let active = Arc::new(AtomicBool::new(true));
        self.watches
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(id, Arc::clone(&active));

        let inner = Arc::clone(&self.inner);
        let interval = self.watch_interval;
        let fixes = stream::unfold(true, move |first| {
            let inner = Arc::clone(&inner);
            let active = Arc::clone(&active);
            async move {
                let delay = if first { inner.acquire_delay } else { interval };
                tokio::time::sleep(delay).await;
                if !active.load(Ordering::Acquire) {
                    return None;
                }
                Some((inner.advance(), false))
            }
        })
        .boxed();

        Ok(Watch { id, fixes })
    }

    fn cancel(&self, id: WatchId) {
        let removed = self
            .watches
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .remove(&id);
        if let Some(active) = removed {
            active.store(false, Ordering::Release);
            tracing::debug!("replay provider: {} cancelled", id);
        }
    }
}

#[cfg(test)]
#[path = "replay_tests.rs"]
mod tests;
