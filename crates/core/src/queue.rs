// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Durable FIFO queue of location records awaiting delivery.
//!
//! The whole queue lives under a single key of a [`KeyValueStore`], encoded
//! as JSON lines in capture order. Every operation runs under an in-process
//! mutex plus the store's cross-process lock on the key, so `append`, `clear`
//! and `remove_delivered` never interleave, even between a foreground
//! command and the background scheduler. Both locks are only held for the
//! duration of a store call, never across a network send: the sync engine
//! takes a snapshot with [`PendingQueue::drain`] and later trims exactly that
//! snapshot with [`PendingQueue::remove_delivered`].

use std::sync::{Arc, Mutex, MutexGuard};

use crate::error::Result;
use crate::jsonl;
use crate::record::LocationRecord;
use crate::store::{KeyLock, KeyValueStore};

/// Store key holding the pending records.
pub const QUEUE_KEY: &str = "pending_locations";

/// Store key locked for the duration of a sync.
pub const SYNC_LOCK_KEY: &str = "pending_locations-sync";

/// Persistent queue of records not yet acknowledged by the server.
pub struct PendingQueue {
    store: Arc<dyn KeyValueStore>,
    lock: Mutex<()>,
}

/// Holds both the in-process and the store lock on the queue key.
struct QueueGuard<'a> {
    _store: KeyLock,
    _local: MutexGuard<'a, ()>,
}

impl PendingQueue {
    /// Opens the queue stored under [`QUEUE_KEY`].
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        PendingQueue {
            store,
            lock: Mutex::new(()),
        }
    }

    fn guard(&self) -> Result<QueueGuard<'_>> {
        let local = self.lock.lock().unwrap_or_else(|e| e.into_inner());
        let store = self.store.lock(QUEUE_KEY)?;
        Ok(QueueGuard {
            _store: store,
            _local: local,
        })
    }

    fn load(&self) -> Result<Vec<LocationRecord>> {
        match self.store.get(QUEUE_KEY)? {
            Some(content) => jsonl::decode(QUEUE_KEY, &content),
            None => Ok(Vec::new()),
        }
    }

    fn persist(&self, records: &[LocationRecord]) -> Result<()> {
        if records.is_empty() {
            return self.store.remove(QUEUE_KEY);
        }
        self.store.set(QUEUE_KEY, &jsonl::encode(records)?)
    }

    /// Appends a record at the tail.
    ///
    /// The record is durable once this returns.
    pub fn append(&self, record: &LocationRecord) -> Result<()> {
        let _guard = self.guard()?;
        let mut records = self.load()?;
        records.push(*record);
        self.persist(&records)
    }

    /// Reads all queued records in FIFO order without removing them.
    pub fn drain(&self) -> Result<Vec<LocationRecord>> {
        let _guard = self.guard()?;
        self.load()
    }

    /// Removes every queued record. Clearing an empty queue is a no-op.
    pub fn clear(&self) -> Result<()> {
        let _guard = self.guard()?;
        self.store.remove(QUEUE_KEY)
    }

    /// Removes a delivered snapshot from the head of the queue.
    ///
    /// Only the leading records that still match `delivered` in order are
    /// removed, so anything appended after the snapshot was taken survives,
    /// and a queue cleared in the meantime is left alone. Returns the number
    /// of records removed.
    pub fn remove_delivered(&self, delivered: &[LocationRecord]) -> Result<usize> {
        if delivered.is_empty() {
            return Ok(0);
        }
        let _guard = self.guard()?;
        let records = self.load()?;
        let matched = records
            .iter()
            .zip(delivered)
            .take_while(|(queued, sent)| queued == sent)
            .count();
        if matched > 0 {
            self.persist(&records[matched..])?;
        }
        Ok(matched)
    }

    /// Takes the sync lock unless another sync, in any process, holds it.
    ///
    /// The queue itself stays usable while the sync lock is held.
    pub fn try_lock_sync(&self) -> Result<Option<KeyLock>> {
        self.store.try_lock(SYNC_LOCK_KEY)
    }

    /// Returns the number of queued records.
    pub fn len(&self) -> Result<usize> {
        Ok(self.drain()?.len())
    }

    /// Checks if the queue is empty.
    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }
}

impl std::fmt::Debug for PendingQueue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PendingQueue")
            .field("key", &QUEUE_KEY)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[path = "queue_tests.rs"]
mod tests;
