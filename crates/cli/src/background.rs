// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Headless entry point run on each OS background wake-up.
//!
//! One invocation walks `Started -> Capturing -> Storing -> Syncing ->
//! Finished`. The record is appended to the pending queue before any
//! network attempt, so a run killed mid-sync never loses it. Every failure,
//! panics included, ends the run in `Finished`, and the OS scheduler is told
//! the task completed exactly once.

use std::any::Any;
use std::fmt;
use std::panic::AssertUnwindSafe;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use futures_util::FutureExt;
use gt_core::{CaptureMode, PendingQueue};
use tokio::time::Instant;

use crate::capture::{CaptureError, LocationCapture};
use crate::status::LocationStatus;
use crate::sync::{SkipReason, SyncEngine, SyncOutcome};

/// Identifier the OS scheduler assigns to one background invocation.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TaskId(String);

impl TaskId {
    pub fn new(id: impl Into<String>) -> Self {
        TaskId(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

const MAX_BUDGET: Duration = Duration::from_secs(86_400);

/// A single background invocation handed to the adapter.
#[derive(Debug, Clone)]
pub struct TaskInvocation {
    pub task_id: TaskId,
    /// Point past which the OS may kill the process.
    pub deadline: Instant,
}

impl TaskInvocation {
    /// Creates an invocation whose deadline is `budget` from now.
    ///
    /// Budgets longer than a day are cut to a day.
    pub fn new(task_id: TaskId, budget: Duration) -> Self {
        TaskInvocation {
            task_id,
            deadline: Instant::now() + budget.min(MAX_BUDGET),
        }
    }
}

/// Progress of a background run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskState {
    Started,
    Capturing,
    Storing,
    Syncing,
    Finished,
}

impl fmt::Display for TaskState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TaskState::Started => write!(f, "started"),
            TaskState::Capturing => write!(f, "capturing"),
            TaskState::Storing => write!(f, "storing"),
            TaskState::Syncing => write!(f, "syncing"),
            TaskState::Finished => write!(f, "finished"),
        }
    }
}

/// Receives the completion signal for background invocations.
pub trait CompletionSink: Send + Sync {
    fn finish(&self, task_id: &TaskId);
}

/// How a background run ended.
#[derive(Debug, Clone, PartialEq)]
pub enum TaskOutcome {
    /// The record was stored and a sync was attempted.
    Synced(SyncOutcome),
    /// The record was stored; the endpoint was unreachable.
    Stored,
    CaptureFailed(CaptureError),
    StorageFailed(String),
    SyncFailed(String),
    /// The invocation deadline elapsed while in `during`.
    DeadlineExceeded { during: TaskState },
    Panicked(String),
}

impl fmt::Display for TaskOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TaskOutcome::Synced(outcome) => write!(f, "{}", outcome),
            TaskOutcome::Stored => write!(f, "stored (offline)"),
            TaskOutcome::CaptureFailed(e) => write!(f, "capture failed: {}", e),
            TaskOutcome::StorageFailed(e) => write!(f, "storage failed: {}", e),
            TaskOutcome::SyncFailed(e) => write!(f, "sync failed: {}", e),
            TaskOutcome::DeadlineExceeded { during } => {
                write!(f, "deadline exceeded while {}", during)
            }
            TaskOutcome::Panicked(msg) => write!(f, "panicked: {}", msg),
        }
    }
}

/// Summary of one background invocation.
#[derive(Debug, Clone, PartialEq)]
pub struct TaskReport {
    pub task_id: TaskId,
    /// Last state entered before `Finished`.
    pub last_state: TaskState,
    pub outcome: TaskOutcome,
    pub elapsed: Duration,
}

/// Signals completion when dropped.
///
/// Fires on every exit path of [`BackgroundTaskAdapter::handle`], including
/// the handle future itself being dropped by its caller.
struct CompletionGuard<'a> {
    sink: &'a dyn CompletionSink,
    task_id: &'a TaskId,
}

impl Drop for CompletionGuard<'_> {
    fn drop(&mut self) {
        tracing::debug!("task {}: signalling completion", self.task_id);
        self.sink.finish(self.task_id);
    }
}

struct Progress(Mutex<TaskState>);

impl Progress {
    fn enter(&self, task_id: &TaskId, state: TaskState) {
        tracing::debug!("task {}: {}", task_id, state);
        *self.0.lock().unwrap_or_else(|e| e.into_inner()) = state;
    }

    fn current(&self) -> TaskState {
        *self.0.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// Composes capture, storage and sync for one OS wake-up.
pub struct BackgroundTaskAdapter {
    capture: Arc<LocationCapture>,
    queue: Arc<PendingQueue>,
    sync: Arc<SyncEngine>,
    completion: Arc<dyn CompletionSink>,
}

impl BackgroundTaskAdapter {
    pub fn new(
        capture: Arc<LocationCapture>,
        queue: Arc<PendingQueue>,
        sync: Arc<SyncEngine>,
        completion: Arc<dyn CompletionSink>,
    ) -> Self {
        BackgroundTaskAdapter {
            capture,
            queue,
            sync,
            completion,
        }
    }

    /// Runs one invocation to completion.
    ///
    /// Never fails: errors and panics are folded into the report.
    pub async fn handle(&self, invocation: TaskInvocation) -> TaskReport {
        let started = Instant::now();
        let TaskInvocation { task_id, deadline } = invocation;
        let _completion = CompletionGuard {
            sink: self.completion.as_ref(),
            task_id: &task_id,
        };
        let progress = Progress(Mutex::new(TaskState::Started));
        tracing::info!("task {}: started", task_id);

        let run = AssertUnwindSafe(self.run(&task_id, &progress)).catch_unwind();
        let outcome = match tokio::time::timeout_at(deadline, run).await {
            Ok(Ok(outcome)) => outcome,
            Ok(Err(panic)) => {
                let message = panic_message(panic.as_ref());
                tracing::error!("task {}: panicked: {}", task_id, message);
                TaskOutcome::Panicked(message)
            }
            Err(_) => {
                let during = progress.current();
                tracing::warn!("task {}: deadline exceeded while {}", task_id, during);
                TaskOutcome::DeadlineExceeded { during }
            }
        };

        let elapsed = started.elapsed();
        tracing::info!(
            "task {}: finished in {}ms: {}",
            task_id,
            elapsed.as_millis(),
            outcome
        );
        TaskReport {
            last_state: progress.current(),
            task_id: task_id.clone(),
            outcome,
            elapsed,
        }
    }

    async fn run(&self, task_id: &TaskId, progress: &Progress) -> TaskOutcome {
        progress.enter(task_id, TaskState::Capturing);
        let record = match self.capture.capture(CaptureMode::Background).await {
            Ok(record) => record,
            Err(e) => return TaskOutcome::CaptureFailed(e),
        };

        progress.enter(task_id, TaskState::Storing);
        if let Err(e) = self.queue.append(&record) {
            tracing::error!("task {}: failed to store record: {}", task_id, e);
            return TaskOutcome::StorageFailed(e.to_string());
        }
        match self.queue.len() {
            Ok(pending) => self
                .capture
                .listeners()
                .publish(&LocationStatus::Queued { pending }),
            Err(e) => tracing::warn!("task {}: cannot count pending records: {}", task_id, e),
        }

        // The engine probes connectivity itself; offline means stored only.
        progress.enter(task_id, TaskState::Syncing);
        match self.sync.try_sync().await {
            Ok(SyncOutcome::Skipped(SkipReason::Offline)) => {
                tracing::info!("task {}: offline, record stays queued", task_id);
                TaskOutcome::Stored
            }
            Ok(outcome) => TaskOutcome::Synced(outcome),
            Err(e) => {
                tracing::error!("task {}: {}", task_id, e);
                TaskOutcome::SyncFailed(e.to_string())
            }
        }
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
#[path = "background_tests.rs"]
mod tests;
