// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! gt-core: Shared library for the geotrail location tracker
//!
//! This crate provides the data model, durable storage and pending-record
//! queue used by the capture, sync and background-task layers.

pub mod clock;
pub mod error;
pub mod jsonl;
pub mod queue;
pub mod record;
pub mod store;

pub use clock::{ClockSource, SystemClock};
pub use error::{Error, Result};
pub use queue::PendingQueue;
pub use record::{CaptureMode, Fix, LocationRecord};
pub use store::{FileStore, KeyLock, KeyValueStore, MemoryStore};
