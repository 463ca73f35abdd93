// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Per-caller daily request quota
//!
//! Each `(subject, day)` pair moves through `absent -> counting -> saturated`.
//! A saturated key stays saturated until its record expires at the next UTC
//! midnight, after which the following day's key starts again from zero.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};

use super::store::{QuotaKey, QuotaStore, StoreError};

#[derive(Debug, Clone, Error, PartialEq)]
pub enum QuotaError {
    #[error("Daily limit reached ({limit}/day)")]
    Exceeded { limit: u64 },

    #[error("Quota storage unavailable: {0}")]
    StorageUnavailable(String),
}

/// An accepted request and where it leaves the caller for the day
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuotaGrant {
    pub count: u64,
    pub limit: u64,
}

impl QuotaGrant {
    pub fn remaining(&self) -> u64 {
        self.limit.saturating_sub(self.count)
    }
}

/// Today's UTC calendar day
pub fn today_utc() -> NaiveDate {
    Utc::now().date_naive()
}

/// First instant of the UTC day after `day`
pub fn next_midnight_utc(day: NaiveDate) -> DateTime<Utc> {
    day.succ_opt()
        .unwrap_or(day)
        .and_time(NaiveTime::MIN)
        .and_utc()
}

/// Enforces a fixed number of requests per subject per UTC day
///
/// All consistency comes from the store's conditional increment: there is no
/// local locking and a rejected or failed increment is never retried.
pub struct QuotaLimiter {
    store: Arc<dyn QuotaStore>,
    limit: u64,
}

impl QuotaLimiter {
    pub fn new(store: Arc<dyn QuotaStore>, limit: u64) -> Self {
        Self { store, limit }
    }

    pub fn limit(&self) -> u64 {
        self.limit
    }

    /// Count one request for `subject` on `day` against `limit`
    ///
    /// Succeeds with the new count only if the count before this call was
    /// below `limit`. The record expiry is (re)set to the next UTC midnight
    /// after `day` on every success.
    pub async fn try_increment(
        &self,
        subject: &str,
        day: NaiveDate,
        limit: u64,
    ) -> Result<u64, QuotaError> {
        let key = QuotaKey::new(subject, day);
        let expires_at = next_midnight_utc(day);

        match self
            .store
            .conditional_increment(&key, limit, expires_at)
            .await
        {
            Ok(count) => {
                debug!("Quota {}/{} for {} on {}", count, limit, subject, day);
                Ok(count)
            }
            Err(StoreError::ConditionFailed) => {
                info!("Quota exceeded for {} on {} (limit {})", subject, day, limit);
                Err(QuotaError::Exceeded { limit })
            }
            Err(StoreError::Unavailable(reason)) => {
                warn!("Quota store unavailable for {}: {}", subject, reason);
                Err(QuotaError::StorageUnavailable(reason))
            }
        }
    }

    /// Count one request for `subject` today against the configured limit
    pub async fn check_and_record(&self, subject: &str) -> Result<QuotaGrant, QuotaError> {
        let count = self
            .try_increment(subject, today_utc(), self.limit)
            .await?;
        Ok(QuotaGrant {
            count,
            limit: self.limit,
        })
    }
}
