// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
pub mod analysis;
pub mod api;
pub mod auth;
pub mod cli;
pub mod config;
pub mod quota;
pub mod storage;
pub mod version;
pub mod vision;

pub use analysis::{AnalysisMode, AnalysisService, AnalysisSettings};
pub use api::{create_app, AppState};
pub use config::{AppConfig, ConfigError};
pub use quota::{QuotaError, QuotaLimiter};
