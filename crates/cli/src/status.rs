// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Observer registry for location-tracking status events.
//!
//! One registry is owned by the long-lived [`LocationCapture`](crate::capture::LocationCapture)
//! and shared (by cheap clone) with the sync engine. Subscribing returns a
//! [`ListenerHandle`]; dropping the handle unsubscribes.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, Weak};

use gt_core::{CaptureMode, LocationRecord};

/// Status events published while capturing and syncing.
#[derive(Debug, Clone, PartialEq)]
pub enum LocationStatus {
    /// A capture has started.
    Acquiring { mode: CaptureMode },
    /// A capture produced a record.
    Captured(LocationRecord),
    /// A capture failed.
    CaptureFailed { mode: CaptureMode, error: String },
    /// A record was appended to the pending queue.
    Queued { pending: usize },
    /// A sync delivered every pending record.
    Synced { sent: usize },
    /// A sync stopped at a failed send.
    SyncFailed { sent: usize, error: String },
}

type Listener = Arc<dyn Fn(&LocationStatus) + Send + Sync>;

#[derive(Default)]
struct RegistryInner {
    next_id: AtomicU64,
    listeners: Mutex<Vec<(u64, Listener)>>,
}

impl RegistryInner {
    fn remove(&self, id: u64) {
        let mut listeners = self.listeners.lock().unwrap_or_else(|e| e.into_inner());
        listeners.retain(|(lid, _)| *lid != id);
    }
}

/// Registry of status listeners.
#[derive(Clone, Default)]
pub struct StatusRegistry {
    inner: Arc<RegistryInner>,
}

impl StatusRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a listener. It stays registered while the handle is alive.
    #[must_use = "dropping the handle unsubscribes the listener"]
    pub fn subscribe<F>(&self, listener: F) -> ListenerHandle
    where
        F: Fn(&LocationStatus) + Send + Sync + 'static,
    {
        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
        self.inner
            .listeners
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push((id, Arc::new(listener)));
        ListenerHandle {
            registry: Arc::downgrade(&self.inner),
            id,
        }
    }

    /// Delivers `status` to every registered listener.
    ///
    /// Listeners run outside the registry lock, so they may subscribe or
    /// unsubscribe from within the callback.
    pub fn publish(&self, status: &LocationStatus) {
        let listeners: Vec<Listener> = self
            .inner
            .listeners
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .iter()
            .map(|(_, l)| Arc::clone(l))
            .collect();
        for listener in listeners {
            listener(status);
        }
    }

    /// Number of registered listeners.
    pub fn len(&self) -> usize {
        self.inner
            .listeners
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl std::fmt::Debug for StatusRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StatusRegistry")
            .field("listeners", &self.len())
            .finish()
    }
}

/// Keeps a listener registered; unsubscribes on drop.
#[derive(Debug)]
pub struct ListenerHandle {
    registry: Weak<RegistryInner>,
    id: u64,
}

impl ListenerHandle {
    /// Unsubscribes the listener now.
    pub fn unsubscribe(self) {
        drop(self);
    }
}

impl Drop for ListenerHandle {
    fn drop(&mut self) {
        if let Some(registry) = self.registry.upgrade() {
            registry.remove(self.id);
        }
    }
}

#[cfg(test)]
#[path = "status_tests.rs"]
mod tests;
