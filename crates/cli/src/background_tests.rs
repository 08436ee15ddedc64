// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

#![allow(clippy::unwrap_used)]

use std::sync::atomic::{AtomicBool, Ordering};

use gt_core::{Fix, KeyValueStore, MemoryStore};

use super::*;
use crate::capture::CaptureSettings;
use crate::connectivity::ConnectivityOracle;
use crate::geo::{GeoError, GeoProvider};
use crate::sync::{SkipReason, Transport};
use crate::test_helpers::{
    collect_statuses, memory_queue, t0, FixScript, FixedClock, MockTransport, RecordingSink,
    ScriptedProvider, StaticOracle,
};

struct Harness {
    adapter: BackgroundTaskAdapter,
    queue: Arc<PendingQueue>,
    transport: Arc<MockTransport>,
    sink: Arc<RecordingSink>,
    oracle: Arc<StaticOracle>,
    capture: Arc<LocationCapture>,
}

fn harness(
    provider: ScriptedProvider,
    queue: Arc<PendingQueue>,
    transport: MockTransport,
    reachable: bool,
) -> Harness {
    let provider: Arc<dyn GeoProvider> = Arc::new(provider);
    let capture = Arc::new(LocationCapture::new(
        provider,
        Arc::new(FixedClock(t0())),
        CaptureSettings::default(),
    ));
    let transport = Arc::new(transport);
    let oracle = Arc::new(StaticOracle::new(reachable));
    let dyn_transport: Arc<dyn Transport> = transport.clone();
    let dyn_oracle: Arc<dyn ConnectivityOracle> = oracle.clone();
    let sync = Arc::new(SyncEngine::new(
        Arc::clone(&queue),
        dyn_transport,
        dyn_oracle,
        capture.listeners().clone(),
    ));
    let sink = Arc::new(RecordingSink::default());
    let completion: Arc<dyn CompletionSink> = sink.clone();
    let adapter = BackgroundTaskAdapter::new(
        Arc::clone(&capture),
        Arc::clone(&queue),
        sync,
        completion,
    );
    Harness {
        adapter,
        queue,
        transport,
        sink,
        oracle,
        capture,
    }
}

fn replying(fix: Fix) -> ScriptedProvider {
    ScriptedProvider::replying(Ok(fix))
}

fn invocation(id: &str, budget_secs: u64) -> TaskInvocation {
    TaskInvocation::new(TaskId::new(id), Duration::from_secs(budget_secs))
}

#[tokio::test]
async fn record_is_queued_before_it_is_sent() {
    let queue = memory_queue();
    let seen_in_queue = Arc::new(AtomicBool::new(false));
    let hook_queue = Arc::clone(&queue);
    let hook_flag = Arc::clone(&seen_in_queue);
    let transport = MockTransport::new().with_hook(move |_, record| {
        let queued = hook_queue.drain().unwrap().contains(record);
        hook_flag.store(queued, Ordering::SeqCst);
    });
    let h = harness(replying(Fix::new(1.0, 2.0)), queue, transport, true);

    let report = h.adapter.handle(invocation("bg-1", 30)).await;

    assert!(seen_in_queue.load(Ordering::SeqCst));
    assert_eq!(h.oracle.probes(), 1);
    assert_eq!(
        report.outcome,
        TaskOutcome::Synced(SyncOutcome::Success { sent: 1 })
    );
    assert_eq!(report.last_state, TaskState::Syncing);
    assert!(h.queue.is_empty().unwrap());
    assert_eq!(h.sink.finished(), vec![TaskId::new("bg-1")]);
}

#[tokio::test(start_paused = true)]
async fn never_resolving_provider_finishes_at_capture_deadline() {
    let h = harness(
        ScriptedProvider::hanging(),
        memory_queue(),
        MockTransport::new(),
        true,
    );

    let report = h.adapter.handle(invocation("bg-d", 30)).await;

    assert_eq!(report.outcome, TaskOutcome::CaptureFailed(CaptureError::Timeout));
    assert_eq!(report.last_state, TaskState::Capturing);
    assert!(report.elapsed >= Duration::from_secs(20), "{:?}", report.elapsed);
    assert!(report.elapsed < Duration::from_secs(21), "{:?}", report.elapsed);
    assert_eq!(h.sink.finished(), vec![TaskId::new("bg-d")]);
    assert!(h.queue.is_empty().unwrap());
    assert_eq!(h.transport.attempts(), 0);
}

#[tokio::test]
async fn offline_run_keeps_record_queued() {
    let h = harness(
        replying(Fix::new(1.0, 2.0)),
        memory_queue(),
        MockTransport::new(),
        false,
    );
    let (_handle, events) = collect_statuses(h.capture.listeners());

    let report = h.adapter.handle(invocation("bg-2", 30)).await;

    assert_eq!(report.outcome, TaskOutcome::Stored);
    assert_eq!(report.last_state, TaskState::Syncing);
    assert_eq!(h.oracle.probes(), 1);
    assert_eq!(h.queue.len().unwrap(), 1);
    assert_eq!(h.transport.attempts(), 0);
    assert!(events
        .lock()
        .unwrap()
        .contains(&LocationStatus::Queued { pending: 1 }));
    assert_eq!(h.sink.finished().len(), 1);
}

#[tokio::test]
async fn failed_send_keeps_record_queued() {
    let h = harness(
        replying(Fix::new(1.0, 2.0)),
        memory_queue(),
        MockTransport::failing_at(0),
        true,
    );

    let report = h.adapter.handle(invocation("bg-3", 30)).await;

    assert!(matches!(
        report.outcome,
        TaskOutcome::Synced(SyncOutcome::PartialFailure { sent: 0, .. })
    ));
    assert_eq!(h.queue.len().unwrap(), 1);
    assert_eq!(h.sink.finished().len(), 1);
}

#[tokio::test]
async fn capture_failure_stores_nothing() {
    let h = harness(
        ScriptedProvider::replying(Err(GeoError::permission_denied("denied"))),
        memory_queue(),
        MockTransport::new(),
        true,
    );

    let report = h.adapter.handle(invocation("bg-4", 30)).await;

    assert_eq!(
        report.outcome,
        TaskOutcome::CaptureFailed(CaptureError::PermissionDenied)
    );
    assert!(h.queue.is_empty().unwrap());
    assert_eq!(h.sink.finished().len(), 1);
}

#[tokio::test]
async fn storage_failure_still_completes() {
    let store = Arc::new(MemoryStore::new());
    store.set(gt_core::queue::QUEUE_KEY, "{broken").unwrap();
    let queue = Arc::new(PendingQueue::new(store));
    let h = harness(replying(Fix::new(1.0, 2.0)), queue, MockTransport::new(), true);

    let report = h.adapter.handle(invocation("bg-5", 30)).await;

    assert!(matches!(report.outcome, TaskOutcome::StorageFailed(_)));
    assert_eq!(report.last_state, TaskState::Storing);
    assert_eq!(h.transport.attempts(), 0);
    assert_eq!(h.sink.finished(), vec![TaskId::new("bg-5")]);
}

#[tokio::test(start_paused = true)]
async fn invocation_deadline_bounds_the_whole_run() {
    let h = harness(
        ScriptedProvider::hanging(),
        memory_queue(),
        MockTransport::new(),
        true,
    );

    let report = h.adapter.handle(invocation("bg-6", 5)).await;

    assert_eq!(
        report.outcome,
        TaskOutcome::DeadlineExceeded {
            during: TaskState::Capturing
        }
    );
    assert!(report.elapsed >= Duration::from_secs(5), "{:?}", report.elapsed);
    assert!(report.elapsed < Duration::from_secs(6), "{:?}", report.elapsed);
    assert_eq!(h.sink.finished().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn deadline_during_sync_leaves_record_queued() {
    let transport = MockTransport::new();
    transport.hang();
    let h = harness(replying(Fix::new(1.0, 2.0)), memory_queue(), transport, true);

    let report = h.adapter.handle(invocation("bg-7", 25)).await;

    assert_eq!(
        report.outcome,
        TaskOutcome::DeadlineExceeded {
            during: TaskState::Syncing
        }
    );
    assert_eq!(h.queue.len().unwrap(), 1);
    assert_eq!(h.sink.finished().len(), 1);
}

#[tokio::test]
async fn panic_inside_a_step_is_caught() {
    let provider = ScriptedProvider::new();
    provider.push(FixScript::Panic);
    let h = harness(provider, memory_queue(), MockTransport::new(), true);

    let report = h.adapter.handle(invocation("bg-8", 30)).await;

    assert_eq!(report.outcome, TaskOutcome::Panicked("provider exploded".into()));
    assert_eq!(report.last_state, TaskState::Capturing);
    assert_eq!(h.sink.finished(), vec![TaskId::new("bg-8")]);
}

#[tokio::test(start_paused = true)]
async fn dropped_invocation_still_signals_completion() {
    let h = harness(
        ScriptedProvider::hanging(),
        memory_queue(),
        MockTransport::new(),
        true,
    );

    let result =
        tokio::time::timeout(Duration::from_secs(1), h.adapter.handle(invocation("bg-9", 30)))
            .await;

    assert!(result.is_err());
    assert_eq!(h.sink.finished(), vec![TaskId::new("bg-9")]);
}

#[tokio::test]
async fn consecutive_runs_each_complete_once() {
    let provider = ScriptedProvider::new();
    provider.push(FixScript::Reply(Ok(Fix::new(1.0, 1.0))));
    provider.push(FixScript::Reply(Ok(Fix::new(2.0, 2.0))));
    let h = harness(provider, memory_queue(), MockTransport::new(), false);

    h.adapter.handle(invocation("a", 30)).await;
    h.adapter.handle(invocation("b", 30)).await;

    assert_eq!(h.sink.finished(), vec![TaskId::new("a"), TaskId::new("b")]);
    assert_eq!(h.queue.len().unwrap(), 2);
}

#[test]
fn outcome_display() {
    assert_eq!(TaskOutcome::Stored.to_string(), "stored (offline)");
    assert_eq!(
        TaskOutcome::Synced(SyncOutcome::Skipped(SkipReason::Offline)).to_string(),
        "skipped: offline"
    );
    assert_eq!(
        TaskOutcome::DeadlineExceeded {
            during: TaskState::Syncing
        }
        .to_string(),
        "deadline exceeded while syncing"
    );
}

#[tokio::test(start_paused = true)]
async fn oversized_budget_is_capped_at_a_day() {
    let now = Instant::now();
    let invocation = TaskInvocation::new(TaskId::new("bg-max"), Duration::MAX);
    assert!(invocation.deadline <= now + Duration::from_secs(86_400));
    assert!(invocation.deadline >= now + Duration::from_secs(86_399));
}
