// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Concurrent quota enforcement: exactly `min(N, limit)` callers succeed

use futures_util::future::join_all;
use image_analysis_node::quota::{
    today_utc, InMemoryQuotaStore, QuotaError, QuotaKey, QuotaLimiter,
};
use std::sync::Arc;

async fn race(limit: u64, callers: usize) -> (usize, usize, u64) {
    let store = Arc::new(InMemoryQuotaStore::new());
    let limiter = Arc::new(QuotaLimiter::new(store.clone(), limit));
    let day = today_utc();

    let tasks = (0..callers).map(|_| {
        let limiter = limiter.clone();
        tokio::spawn(async move { limiter.try_increment("shared", day, limit).await })
    });
    let results: Vec<_> = join_all(tasks)
        .await
        .into_iter()
        .map(|joined| joined.expect("task panicked"))
        .collect();

    let accepted = results.iter().filter(|r| r.is_ok()).count();
    let rejected = results
        .iter()
        .filter(|r| matches!(r, Err(QuotaError::Exceeded { .. })))
        .count();
    let stored = store
        .get(&QuotaKey::new("shared", day))
        .await
        .map(|r| r.count)
        .unwrap_or(0);

    (accepted, rejected, stored)
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn test_exactly_limit_succeed_under_contention() {
    let (accepted, rejected, stored) = race(5, 64).await;
    assert_eq!(accepted, 5);
    assert_eq!(rejected, 59);
    assert_eq!(stored, 5);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_fewer_callers_than_limit_all_succeed() {
    let (accepted, rejected, stored) = race(10, 7).await;
    assert_eq!(accepted, 7);
    assert_eq!(rejected, 0);
    assert_eq!(stored, 7);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_accepted_counts_are_distinct() {
    let store = Arc::new(InMemoryQuotaStore::new());
    let limiter = Arc::new(QuotaLimiter::new(store, 20));
    let day = today_utc();

    let tasks = (0..40).map(|_| {
        let limiter = limiter.clone();
        tokio::spawn(async move { limiter.try_increment("distinct", day, 20).await })
    });
    let mut counts: Vec<u64> = join_all(tasks)
        .await
        .into_iter()
        .filter_map(|joined| joined.ok().and_then(|r| r.ok()))
        .collect();
    counts.sort_unstable();

    assert_eq!(counts, (1..=20).collect::<Vec<u64>>());
}
