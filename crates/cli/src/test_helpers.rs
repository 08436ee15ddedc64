// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Shared test doubles for capture, sync and background tests.

#![allow(clippy::unwrap_used)]
#![allow(clippy::panic)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use chrono::{DateTime, TimeZone, Utc};
use futures_util::future::{self, BoxFuture, FutureExt};
use futures_util::stream::{self, StreamExt};
use gt_core::{ClockSource, Fix, LocationRecord, MemoryStore, PendingQueue};

use crate::background::{CompletionSink, TaskId};
use crate::connectivity::ConnectivityOracle;
use crate::geo::{FixRequest, GeoError, GeoProvider, GeoResult, Watch, WatchId};
use crate::status::{ListenerHandle, LocationStatus, StatusRegistry};
use crate::sync::{Transport, TransportError, TransportResult};

/// A fixed instant used as "now" in tests.
pub fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap()
}

/// A record captured `secs` seconds after [`t0`].
pub fn record(latitude: f64, longitude: f64, secs: i64) -> LocationRecord {
    LocationRecord::new(
        latitude,
        longitude,
        t0() + chrono::Duration::seconds(secs),
    )
    .unwrap()
}

/// An empty queue backed by memory.
pub fn memory_queue() -> Arc<PendingQueue> {
    Arc::new(PendingQueue::new(Arc::new(MemoryStore::new())))
}

/// Clock frozen at one instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl ClockSource for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

/// What a [`ScriptedProvider`] does for `get_fix`.
pub enum FixScript {
    Reply(GeoResult<Fix>),
    /// Never resolves.
    Hang,
    Panic,
}

/// Provider whose answers are scripted per call.
///
/// `get_fix` pops the next script entry, hanging once the script runs out.
/// Watches yield the scripted items and then stay open.
#[derive(Default)]
pub struct ScriptedProvider {
    fixes: Mutex<VecDeque<FixScript>>,
    watch_items: Mutex<Vec<GeoResult<Fix>>>,
    watch_error: Mutex<Option<GeoError>>,
    fix_calls: AtomicUsize,
    watch_calls: AtomicUsize,
    cancelled: Mutex<Vec<WatchId>>,
}

impl ScriptedProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn replying(result: GeoResult<Fix>) -> Self {
        let provider = Self::new();
        provider.push(FixScript::Reply(result));
        provider
    }

    pub fn hanging() -> Self {
        Self::new()
    }

    pub fn push(&self, script: FixScript) {
        self.fixes.lock().unwrap().push_back(script);
    }

    pub fn with_watch_items(self, items: Vec<GeoResult<Fix>>) -> Self {
        *self.watch_items.lock().unwrap() = items;
        self
    }

    pub fn with_watch_error(self, error: GeoError) -> Self {
        *self.watch_error.lock().unwrap() = Some(error);
        self
    }

    pub fn fix_calls(&self) -> usize {
        self.fix_calls.load(Ordering::SeqCst)
    }

    pub fn watch_calls(&self) -> usize {
        self.watch_calls.load(Ordering::SeqCst)
    }

    pub fn cancelled(&self) -> Vec<WatchId> {
        self.cancelled.lock().unwrap().clone()
    }
}

impl GeoProvider for ScriptedProvider {
    fn get_fix(&self, _request: FixRequest) -> BoxFuture<'_, GeoResult<Fix>> {
        self.fix_calls.fetch_add(1, Ordering::SeqCst);
        let script = self.fixes.lock().unwrap().pop_front();
        match script {
            Some(FixScript::Reply(result)) => future::ready(result).boxed(),
            Some(FixScript::Panic) => async { explode() }.boxed(),
            Some(FixScript::Hang) | None => future::pending().boxed(),
        }
    }

    fn watch(&self, _request: FixRequest) -> GeoResult<Watch> {
        let n = self.watch_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(e) = self.watch_error.lock().unwrap().clone() {
            return Err(e);
        }
        let items = self.watch_items.lock().unwrap().clone();
        let fixes = stream::iter(items).chain(stream::pending()).boxed();
        Ok(Watch {
            id: WatchId(n as u64 + 1),
            fixes,
        })
    }

    fn cancel(&self, id: WatchId) {
        self.cancelled.lock().unwrap().push(id);
    }
}

fn explode() -> GeoResult<Fix> {
    panic!("provider exploded")
}

type SendHook = Box<dyn Fn(usize, &LocationRecord) + Send + Sync>;

/// Transport that records deliveries and can fail at a given call.
#[derive(Default)]
pub struct MockTransport {
    sent: Mutex<Vec<LocationRecord>>,
    attempts: AtomicUsize,
    fail_at: Option<usize>,
    hang: AtomicBool,
    on_send: Option<SendHook>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fails the send with zero-based index `index`.
    pub fn failing_at(index: usize) -> Self {
        MockTransport {
            fail_at: Some(index),
            ..Self::default()
        }
    }

    /// Runs `hook` with the attempt index before every send resolves.
    pub fn with_hook<F>(mut self, hook: F) -> Self
    where
        F: Fn(usize, &LocationRecord) + Send + Sync + 'static,
    {
        self.on_send = Some(Box::new(hook));
        self
    }

    /// Makes every subsequent send hang forever.
    pub fn hang(&self) {
        self.hang.store(true, Ordering::SeqCst);
    }

    pub fn sent(&self) -> Vec<LocationRecord> {
        self.sent.lock().unwrap().clone()
    }

    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }
}

impl Transport for MockTransport {
    fn send(&self, record: LocationRecord) -> BoxFuture<'_, TransportResult<()>> {
        async move {
            let index = self.attempts.fetch_add(1, Ordering::SeqCst);
            if let Some(hook) = &self.on_send {
                hook(index, &record);
            }
            if self.hang.load(Ordering::SeqCst) {
                future::pending::<()>().await;
            }
            // Yield so concurrent callers can interleave with an in-flight sync.
            tokio::task::yield_now().await;
            if self.fail_at == Some(index) {
                return Err(TransportError::ConnectionFailed("mock failure".into()));
            }
            self.sent.lock().unwrap().push(record);
            Ok(())
        }
        .boxed()
    }
}

/// Oracle with a switchable answer.
#[derive(Debug)]
pub struct StaticOracle {
    reachable: AtomicBool,
    probes: AtomicUsize,
}

impl StaticOracle {
    pub fn new(reachable: bool) -> Self {
        StaticOracle {
            reachable: AtomicBool::new(reachable),
            probes: AtomicUsize::new(0),
        }
    }

    pub fn set(&self, reachable: bool) {
        self.reachable.store(reachable, Ordering::SeqCst);
    }

    pub fn probes(&self) -> usize {
        self.probes.load(Ordering::SeqCst)
    }
}

impl ConnectivityOracle for StaticOracle {
    fn is_reachable(&self) -> BoxFuture<'_, bool> {
        self.probes.fetch_add(1, Ordering::SeqCst);
        future::ready(self.reachable.load(Ordering::SeqCst)).boxed()
    }
}

/// Completion sink that records every signal.
#[derive(Debug, Default)]
pub struct RecordingSink {
    finished: Mutex<Vec<TaskId>>,
}

impl RecordingSink {
    pub fn finished(&self) -> Vec<TaskId> {
        self.finished.lock().unwrap().clone()
    }
}

impl CompletionSink for RecordingSink {
    fn finish(&self, task_id: &TaskId) {
        self.finished.lock().unwrap().push(task_id.clone());
    }
}

/// Subscribes a listener that collects every published status.
pub fn collect_statuses(
    registry: &StatusRegistry,
) -> (ListenerHandle, Arc<Mutex<Vec<LocationStatus>>>) {
    let events = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&events);
    let handle = registry.subscribe(move |status| sink.lock().unwrap().push(status.clone()));
    (handle, events)
}
