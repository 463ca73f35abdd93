// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Tests for the daily quota limiter against the in-process store

use chrono::{Duration, Utc};
use image_analysis_node::quota::{
    next_midnight_utc, today_utc, InMemoryQuotaStore, QuotaError, QuotaKey, QuotaLimiter,
    QuotaStore, StoreError,
};
use std::sync::Arc;

fn limiter(limit: u64) -> (Arc<InMemoryQuotaStore>, QuotaLimiter) {
    let store = Arc::new(InMemoryQuotaStore::new());
    let limiter = QuotaLimiter::new(store.clone(), limit);
    (store, limiter)
}

#[tokio::test]
async fn test_counts_up_to_limit_then_rejects() {
    let (store, limiter) = limiter(3);
    let today = today_utc();

    for expected in 1..=3 {
        tokio_test::assert_ok!(limiter.try_increment("alice", today, 3).await);
        let record = store.get(&QuotaKey::new("alice", today)).await.unwrap();
        assert_eq!(record.count, expected);
    }

    assert_eq!(
        limiter.try_increment("alice", today, 3).await,
        Err(QuotaError::Exceeded { limit: 3 })
    );
    let record = store.get(&QuotaKey::new("alice", today)).await.unwrap();
    assert_eq!(record.count, 3, "rejected increment must not change the count");
}

#[tokio::test]
async fn test_record_expires_at_next_midnight() {
    let (store, limiter) = limiter(3);
    let today = today_utc();

    limiter.try_increment("bob", today, 3).await.unwrap();
    limiter.try_increment("bob", today, 3).await.unwrap();

    let record = store.get(&QuotaKey::new("bob", today)).await.unwrap();
    assert_eq!(record.expires_at, next_midnight_utc(today));
    assert!(record.expires_at > Utc::now());
}

#[tokio::test]
async fn test_day_rollover_is_independent() {
    let (_store, limiter) = limiter(2);
    let today = today_utc();
    let tomorrow = today.succ_opt().unwrap();

    limiter.try_increment("carol", today, 2).await.unwrap();
    limiter.try_increment("carol", today, 2).await.unwrap();
    assert!(limiter.try_increment("carol", today, 2).await.is_err());

    assert_eq!(limiter.try_increment("carol", tomorrow, 2).await, Ok(1));
}

#[tokio::test]
async fn test_subjects_are_independent() {
    let (_store, limiter) = limiter(1);

    let grant = limiter.check_and_record("ip:10.0.0.1").await.unwrap();
    assert_eq!(grant.remaining(), 0);
    assert!(limiter.check_and_record("ip:10.0.0.1").await.is_err());

    let other = limiter.check_and_record("ip:10.0.0.2").await.unwrap();
    assert_eq!(other.count, 1);
}

#[tokio::test]
async fn test_store_failure_is_not_success_or_exceeded() {
    let (store, limiter) = limiter(3);
    store
        .inject_error(StoreError::Unavailable("connection reset".to_string()))
        .await;

    let result = limiter.check_and_record("dave").await;
    assert!(matches!(result, Err(QuotaError::StorageUnavailable(_))));
    assert!(store.is_empty().await, "failed write must leave no record");

    // The next attempt is a fresh single round trip
    assert_eq!(limiter.check_and_record("dave").await.unwrap().count, 1);
}

#[tokio::test]
async fn test_expired_record_counts_as_absent() {
    let store = InMemoryQuotaStore::new();
    let key = QuotaKey::new("erin", today_utc());
    let past = Utc::now() - Duration::seconds(1);

    assert_eq!(store.conditional_increment(&key, 1, past).await, Ok(1));
    assert!(store.get(&key).await.is_none());

    // Saturated but expired, so a new increment starts from zero
    assert_eq!(store.conditional_increment(&key, 1, past).await, Ok(1));

    assert_eq!(store.len().await, 1);
    assert_eq!(store.purge_expired(Utc::now()).await, 1);
    assert!(store.is_empty().await);
}
