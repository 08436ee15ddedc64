// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Periodic background-task scheduler.
//!
//! Stands in for the OS background-fetch service: the adapter is registered
//! once at startup, then invoked on a fixed interval with a fresh task id and
//! a wall-clock budget. The scheduler is also the completion sink and keeps
//! track of which invocations have signalled completion.

use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use crate::background::{
    BackgroundTaskAdapter, CompletionSink, TaskId, TaskInvocation, TaskReport,
};

/// How often the adapter runs and how long each run may take.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScheduleSettings {
    pub interval: Duration,
    pub budget: Duration,
}

impl Default for ScheduleSettings {
    fn default() -> Self {
        ScheduleSettings {
            interval: Duration::from_secs(900),
            budget: Duration::from_secs(30),
        }
    }
}

/// Outstanding invocations, keyed by task id.
#[derive(Debug, Default)]
pub struct CompletionLedger {
    outstanding: Mutex<HashSet<TaskId>>,
    completed: AtomicU64,
}

impl CompletionLedger {
    fn begin(&self, task_id: &TaskId) {
        self.outstanding
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(task_id.clone());
    }

    fn is_outstanding(&self, task_id: &TaskId) -> bool {
        self.outstanding
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .contains(task_id)
    }

    /// Number of invocations that have not signalled completion.
    pub fn outstanding(&self) -> usize {
        self.outstanding
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .len()
    }

    /// Number of completion signals accepted.
    pub fn completed(&self) -> u64 {
        self.completed.load(Ordering::Acquire)
    }
}

impl CompletionSink for CompletionLedger {
    fn finish(&self, task_id: &TaskId) {
        let known = self
            .outstanding
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .remove(task_id);
        if known {
            self.completed.fetch_add(1, Ordering::AcqRel);
        } else {
            tracing::warn!("completion for unknown or already finished task {}", task_id);
        }
    }
}

/// Invokes a registered [`BackgroundTaskAdapter`] periodically.
pub struct TaskScheduler {
    adapter: BackgroundTaskAdapter,
    ledger: Arc<CompletionLedger>,
    settings: ScheduleSettings,
    next_id: AtomicU64,
}

impl TaskScheduler {
    /// Registers the adapter built by `build`, which receives the scheduler's
    /// completion sink.
    pub fn register<F>(settings: ScheduleSettings, build: F) -> Self
    where
        F: FnOnce(Arc<dyn CompletionSink>) -> BackgroundTaskAdapter,
    {
        let ledger = Arc::new(CompletionLedger::default());
        let adapter = build(Arc::clone(&ledger) as Arc<dyn CompletionSink>);
        TaskScheduler {
            adapter,
            ledger,
            settings,
            next_id: AtomicU64::new(1),
        }
    }

    pub fn ledger(&self) -> &CompletionLedger {
        &self.ledger
    }

    pub fn settings(&self) -> &ScheduleSettings {
        &self.settings
    }

    /// Invokes the adapter once with a fresh task id.
    pub async fn run_once(&self) -> TaskReport {
        let task_id = TaskId::new(format!(
            "bg-{}",
            self.next_id.fetch_add(1, Ordering::Relaxed)
        ));
        self.ledger.begin(&task_id);
        let invocation = TaskInvocation::new(task_id.clone(), self.settings.budget);
        let report = self.adapter.handle(invocation).await;
        if self.ledger.is_outstanding(&task_id) {
            tracing::warn!("task {} did not signal completion", task_id);
        }
        report
    }

    /// Invokes the adapter every interval until `cancel` fires.
    ///
    /// The first invocation happens immediately. Returns the number of
    /// invocations started.
    pub async fn run(&self, cancel: CancellationToken) -> u64 {
        let mut ticker = tokio::time::interval(self.settings.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut runs = 0;

        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = ticker.tick() => {}
            }
            runs += 1;
            tokio::select! {
                _ = cancel.cancelled() => {
                    tracing::info!("shutdown requested during a background run");
                    break;
                }
                report = self.run_once() => {
                    tracing::debug!("{}: {}", report.task_id, report.outcome);
                }
            }
        }
        tracing::info!("scheduler stopped after {} run(s)", runs);
        runs
    }
}

#[cfg(test)]
#[path = "scheduler_tests.rs"]
mod tests;
