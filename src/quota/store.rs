// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Key-value backends for daily quota counters
//!
//! A backend exposes exactly one operation: an atomic conditional increment.
//! Records carry an absolute expiry; the backend reclaims them after that
//! instant, so no cleanup job is needed.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::debug;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum StoreError {
    /// The stored count already reached the limit; nothing was written
    #[error("conditional check failed")]
    ConditionFailed,
    /// The write could not be completed; its outcome is unknown
    #[error("quota store unavailable: {0}")]
    Unavailable(String),
}

/// Counter key: one record per caller per UTC day
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QuotaKey {
    pub subject: String,
    pub day: NaiveDate,
}

impl QuotaKey {
    pub fn new(subject: &str, day: NaiveDate) -> Self {
        Self {
            subject: subject.to_string(),
            day,
        }
    }

    /// Partition key, e.g. `user#ip:10.0.0.1`
    pub fn partition_key(&self) -> String {
        format!("user#{}", self.subject)
    }

    /// Sort key, the day as `YYYY-MM-DD`
    pub fn sort_key(&self) -> String {
        self.day.format("%Y-%m-%d").to_string()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct QuotaRecord {
    pub subject: String,
    pub day: NaiveDate,
    pub count: u64,
    pub expires_at: DateTime<Utc>,
}

#[async_trait]
pub trait QuotaStore: Send + Sync {
    /// Atomically apply `count = (count or 0) + 1, expires_at = expires_at`
    /// only if the record is absent or its count is below `limit`.
    ///
    /// Returns the new count, or `StoreError::ConditionFailed` with the
    /// record left untouched.
    async fn conditional_increment(
        &self,
        key: &QuotaKey,
        limit: u64,
        expires_at: DateTime<Utc>,
    ) -> Result<u64, StoreError>;
}

/// Process-local store; atomicity comes from holding one lock per increment
#[derive(Debug, Default)]
pub struct InMemoryQuotaStore {
    records: Arc<Mutex<HashMap<QuotaKey, QuotaRecord>>>,
    injected_error: Arc<Mutex<Option<StoreError>>>,
}

impl InMemoryQuotaStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail the next increment with `error` without touching any record
    pub async fn inject_error(&self, error: StoreError) {
        *self.injected_error.lock().await = Some(error);
    }

    /// Current record for `key`, ignoring expired ones
    pub async fn get(&self, key: &QuotaKey) -> Option<QuotaRecord> {
        let now = Utc::now();
        self.records
            .lock()
            .await
            .get(key)
            .filter(|r| r.expires_at > now)
            .cloned()
    }

    /// Drop every record whose expiry is at or before `now`; returns how many
    pub async fn purge_expired(&self, now: DateTime<Utc>) -> usize {
        let mut records = self.records.lock().await;
        let before = records.len();
        records.retain(|_, r| r.expires_at > now);
        before - records.len()
    }

    pub async fn len(&self) -> usize {
        self.records.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.lock().await.is_empty()
    }
}

#[async_trait]
impl QuotaStore for InMemoryQuotaStore {
    async fn conditional_increment(
        &self,
        key: &QuotaKey,
        limit: u64,
        expires_at: DateTime<Utc>,
    ) -> Result<u64, StoreError> {
        if let Some(error) = self.injected_error.lock().await.take() {
            return Err(error);
        }

        let now = Utc::now();
        let mut records = self.records.lock().await;

        let current = records
            .get(key)
            .filter(|r| r.expires_at > now)
            .map(|r| r.count)
            .unwrap_or(0);
        if current >= limit {
            return Err(StoreError::ConditionFailed);
        }

        let record = QuotaRecord {
            subject: key.subject.clone(),
            day: key.day,
            count: current + 1,
            expires_at,
        };
        records.insert(key.clone(), record);
        Ok(current + 1)
    }
}

#[derive(Serialize)]
struct IncrementRequest<'a> {
    table: &'a str,
    pk: String,
    sk: String,
    limit: u64,
    /// Expiry as epoch seconds
    expires: i64,
}

#[derive(Deserialize)]
struct IncrementResponse {
    count: u64,
}

/// Remote key-value store speaking a small JSON conditional-update protocol
///
/// `POST <endpoint>/conditional-increment` answers `200 {"count": n}` on
/// success and `409`/`412` when the condition fails. Each call is a single
/// round trip bounded by the client timeout and is never retried.
pub struct HttpQuotaStore {
    client: Client,
    endpoint: String,
    table: String,
}

impl HttpQuotaStore {
    pub fn new(endpoint: &str, table: &str, timeout: Duration) -> Result<Self, StoreError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;

        Ok(Self {
            client,
            endpoint: endpoint.trim_end_matches('/').to_string(),
            table: table.to_string(),
        })
    }
}

#[async_trait]
impl QuotaStore for HttpQuotaStore {
    async fn conditional_increment(
        &self,
        key: &QuotaKey,
        limit: u64,
        expires_at: DateTime<Utc>,
    ) -> Result<u64, StoreError> {
        let request = IncrementRequest {
            table: &self.table,
            pk: key.partition_key(),
            sk: key.sort_key(),
            limit,
            expires: expires_at.timestamp(),
        };
        debug!("Conditional increment {} {}", request.pk, request.sk);

        let response = self
            .client
            .post(format!("{}/conditional-increment", self.endpoint))
            .json(&request)
            .send()
            .await
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;

        match response.status() {
            StatusCode::OK => {
                let body: IncrementResponse = response
                    .json()
                    .await
                    .map_err(|e| StoreError::Unavailable(e.to_string()))?;
                Ok(body.count)
            }
            StatusCode::CONFLICT | StatusCode::PRECONDITION_FAILED => {
                Err(StoreError::ConditionFailed)
            }
            status => Err(StoreError::Unavailable(format!(
                "unexpected status {}",
                status
            ))),
        }
    }
}
