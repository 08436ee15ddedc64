// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

#![allow(clippy::unwrap_used)]

use super::*;
use std::time::Duration;

fn request() -> FixRequest {
    FixRequest {
        high_accuracy: true,
        timeout: Duration::from_secs(15),
        max_cache_age: Duration::from_secs(10),
    }
}

#[tokio::test]
async fn test_static_get_fix() {
    let provider = StaticProvider::new(12.97, 77.59, Some(5.0));
    let fix = provider.get_fix(request()).await.unwrap();
    assert_eq!(fix.latitude, 12.97);
    assert_eq!(fix.longitude, 77.59);
    assert_eq!(fix.accuracy_m, Some(5.0));
    assert_eq!(fix.timestamp, None);
}

#[tokio::test]
async fn test_static_watch_yields_fix_and_unique_ids() {
    let provider = StaticProvider::new(1.0, 2.0, None);
    let mut first = provider.watch(request()).unwrap();
    let second = provider.watch(request()).unwrap();
    assert_ne!(first.id, second.id);

    let fix = first.fixes.next().await.unwrap().unwrap();
    assert_eq!((fix.latitude, fix.longitude), (1.0, 2.0));

    provider.cancel(first.id);
    provider.cancel(second.id);
}
