// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Delivery of queued location records to the sync endpoint.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌─────────────┐
//! │ SyncEngine  │────►│  Transport  │────►│   Remote    │
//! │ (try_sync)  │     │   (trait)   │     │  endpoint   │
//! └─────────────┘     └─────────────┘     └─────────────┘
//!        │  ▲
//!        ▼  │ is_reachable()
//! ┌─────────────┐     ┌──────────────┐
//! │PendingQueue │     │ Connectivity │
//! │  (durable)  │     │    Oracle    │
//! └─────────────┘     └──────────────┘
//! ```
//!
//! # Features
//!
//! - One record per request, strictly in capture order
//! - Stop on first failure; the queue is only trimmed after a full drain
//! - Bearer-token auth with a single refresh-and-retry on 401
//! - Injectable transport trait for testing

mod engine;
mod transport;

pub use engine::{SkipReason, SyncEngine, SyncError, SyncOutcome, SyncResult};
pub use transport::{HttpTransport, NoEndpoint, Transport, TransportError, TransportResult};


#[cfg(test)]
mod transport_tests;
