// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Daily per-caller request quota backed by an atomic key-value counter

pub mod limiter;
pub mod store;

pub use limiter::{next_midnight_utc, today_utc, QuotaError, QuotaGrant, QuotaLimiter};
pub use store::{HttpQuotaStore, InMemoryQuotaStore, QuotaKey, QuotaRecord, QuotaStore, StoreError};
