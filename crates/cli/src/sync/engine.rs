// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Sync engine: drains the pending queue to the remote endpoint.
//!
//! Policy:
//! 1. Skip if another sync is in flight (in this process or, through the
//!    store's sync lock, in another one), if nothing is pending, or if the
//!    endpoint is unreachable (checked in that order).
//! 2. Snapshot the queue and send records one at a time, oldest first.
//! 3. On the first failed send stop and leave the whole queue in place.
//! 4. After every record in the snapshot is acknowledged, remove exactly the
//!    snapshot from the head of the queue.
//!
//! Delivery is at-least-once: a record whose acknowledgment was lost is sent
//! again on the next attempt.

use std::fmt;
use std::sync::Arc;

use gt_core::PendingQueue;

use super::transport::Transport;
use crate::connectivity::ConnectivityOracle;
use crate::status::{LocationStatus, StatusRegistry};

/// Why a sync attempt did nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    NothingPending,
    Offline,
    InProgress,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::NothingPending => write!(f, "nothing-pending"),
            SkipReason::Offline => write!(f, "offline"),
            SkipReason::InProgress => write!(f, "in-progress"),
        }
    }
}

/// Result of one sync attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncOutcome {
    /// Every pending record was delivered and removed from the queue.
    Success { sent: usize },
    /// Delivery stopped at a failed send. Nothing was removed.
    PartialFailure { sent: usize, error: String },
    /// No send was attempted.
    Skipped(SkipReason),
}

impl fmt::Display for SyncOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SyncOutcome::Success { sent } => write!(f, "synced {} record(s)", sent),
            SyncOutcome::PartialFailure { sent, error } => {
                write!(f, "partial failure after {} record(s): {}", sent, error)
            }
            SyncOutcome::Skipped(reason) => write!(f, "skipped: {}", reason),
        }
    }
}

/// Error type for sync operations.
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    /// The pending queue could not be read or trimmed.
    #[error("storage failure: {0}")]
    Storage(#[from] gt_core::Error),
}

/// Result type for sync operations.
pub type SyncResult<T> = Result<T, SyncError>;

/// Drains the pending queue through a [`Transport`].
pub struct SyncEngine {
    queue: Arc<PendingQueue>,
    transport: Arc<dyn Transport>,
    oracle: Arc<dyn ConnectivityOracle>,
    listeners: StatusRegistry,
    /// Held for the duration of a sync so a snapshot is only ever in one flight.
    in_flight: tokio::sync::Mutex<()>,
}

impl SyncEngine {
    pub fn new(
        queue: Arc<PendingQueue>,
        transport: Arc<dyn Transport>,
        oracle: Arc<dyn ConnectivityOracle>,
        listeners: StatusRegistry,
    ) -> Self {
        SyncEngine {
            queue,
            transport,
            oracle,
            listeners,
            in_flight: tokio::sync::Mutex::new(()),
        }
    }

    /// Attempts to deliver every pending record.
    pub async fn try_sync(&self) -> SyncResult<SyncOutcome> {
        let Ok(_in_flight) = self.in_flight.try_lock() else {
            tracing::debug!("sync already in progress");
            return Ok(SyncOutcome::Skipped(SkipReason::InProgress));
        };
        let Some(_sync_lock) = self.queue.try_lock_sync()? else {
            tracing::debug!("sync already in progress in another process");
            return Ok(SyncOutcome::Skipped(SkipReason::InProgress));
        };

        if self.queue.is_empty()? {
            return Ok(SyncOutcome::Skipped(SkipReason::NothingPending));
        }
        if !self.oracle.is_reachable().await {
            tracing::info!("sync skipped: offline");
            return Ok(SyncOutcome::Skipped(SkipReason::Offline));
        }

        let snapshot = self.queue.drain()?;
        let mut sent = 0;
        for record in &snapshot {
            if let Err(e) = self.transport.send(*record).await {
                tracing::warn!(
                    "send failed after {}/{} record(s): {}",
                    sent,
                    snapshot.len(),
                    e
                );
                let error = e.to_string();
                self.listeners.publish(&LocationStatus::SyncFailed {
                    sent,
                    error: error.clone(),
                });
                return Ok(SyncOutcome::PartialFailure { sent, error });
            }
            sent += 1;
        }

        let removed = self.queue.remove_delivered(&snapshot)?;
        if removed < snapshot.len() {
            tracing::warn!(
                "queue changed during sync; removed {} of {} delivered record(s)",
                removed,
                snapshot.len()
            );
        }
        tracing::info!("synced {} record(s)", sent);
        self.listeners.publish(&LocationStatus::Synced { sent });
        Ok(SyncOutcome::Success { sent })
    }
}

impl fmt::Debug for SyncEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SyncEngine")
            .field("queue", &self.queue)
            .finish_non_exhaustive()
    }
}
