// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Service configuration loaded from environment variables

use std::collections::HashMap;
use std::env;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

/// Value of `QUOTA_STORE_ENDPOINT` selecting the process-local quota store
pub const MEMORY_QUOTA_STORE: &str = "memory";

#[derive(Debug, Clone, Error, PartialEq)]
pub enum ConfigError {
    #[error("Missing required configuration: {0}")]
    Missing(&'static str),

    #[error("Invalid value for {name}: {value}")]
    Invalid { name: &'static str, value: String },
}

/// Where quota counters live
#[derive(Debug, Clone, PartialEq)]
pub enum QuotaBackend {
    /// Counters kept in this process only
    Memory,
    /// Remote key-value store with atomic conditional writes
    Http { endpoint: String },
}

/// Daily quota settings
#[derive(Debug, Clone, PartialEq)]
pub struct QuotaConfig {
    /// Whether quota enforcement is on
    pub enabled: bool,
    /// Table/namespace holding the counters
    pub table: Option<String>,
    /// Requests per subject per UTC day
    pub limit: u64,
    /// Counter backend, required when enabled
    pub backend: Option<QuotaBackend>,
}

/// Full service configuration
#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    /// Bucket receiving uploaded images
    pub bucket: String,
    /// Object key prefix, always ending in `/`
    pub upload_prefix: String,
    /// Default minimum confidence (0-100)
    pub default_min_confidence: f64,
    /// Maximum labels requested from the vision service
    pub max_labels: u32,
    pub quota: QuotaConfig,
    /// Object store base URL
    pub object_store_endpoint: String,
    /// Vision detection service base URL
    pub vision_endpoint: String,
    /// This deployment's account id, enables the admin bypass
    pub account_id: Option<String>,
    /// Bound on each external round trip
    pub store_timeout: Duration,
}

/// Ensure a non-empty prefix ends with `/`
pub fn sanitize_prefix(prefix: &str) -> String {
    if prefix.ends_with('/') {
        prefix.to_string()
    } else {
        format!("{}/", prefix)
    }
}

fn lookup(vars: &HashMap<String, String>, name: &str) -> Option<String> {
    vars.get(name)
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_var<T: FromStr>(
    vars: &HashMap<String, String>,
    name: &'static str,
    default: T,
) -> Result<T, ConfigError> {
    match lookup(vars, name) {
        Some(value) => value
            .parse()
            .map_err(|_| ConfigError::Invalid { name, value }),
        None => Ok(default),
    }
}

fn parse_flag(value: &str) -> bool {
    matches!(value.to_lowercase().as_str(), "1" | "true" | "yes")
}

impl AppConfig {
    /// Load configuration from the process environment
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(&env::vars().collect())
    }

    /// Load configuration from an explicit variable map
    pub fn from_vars(vars: &HashMap<String, String>) -> Result<Self, ConfigError> {
        let get = |name: &str| lookup(vars, name);

        let default_min_confidence: f64 = parse_var(vars, "DEFAULT_MIN_CONFIDENCE", 55.0)?;
        let max_labels: u32 = parse_var(vars, "DEFAULT_MAX_LABELS", 100)?;
        let limit: u64 = parse_var(vars, "QUOTA_LIMIT", 3)?;
        let timeout_ms: u64 = parse_var(vars, "STORE_TIMEOUT_MS", 5000)?;

        let backend = get("QUOTA_STORE_ENDPOINT").map(|v| {
            if v.eq_ignore_ascii_case(MEMORY_QUOTA_STORE) {
                QuotaBackend::Memory
            } else {
                QuotaBackend::Http { endpoint: v }
            }
        });

        let config = Self {
            bucket: get("BUCKET_NAME").unwrap_or_default(),
            upload_prefix: sanitize_prefix(
                &get("UPLOAD_PREFIX").unwrap_or_else(|| "uploads/".to_string()),
            ),
            default_min_confidence,
            max_labels,
            quota: QuotaConfig {
                enabled: get("FEATURE_QUOTA_ENABLED")
                    .map(|v| parse_flag(&v))
                    .unwrap_or(true),
                table: get("QUOTA_TABLE"),
                limit,
                backend,
            },
            object_store_endpoint: get("OBJECT_STORE_ENDPOINT").unwrap_or_default(),
            vision_endpoint: get("VISION_ENDPOINT").unwrap_or_default(),
            account_id: get("ACCOUNT_ID"),
            store_timeout: Duration::from_millis(timeout_ms),
        };

        config.validate()?;
        Ok(config)
    }

    /// Fail fast on missing identifiers or out-of-range values
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.bucket.is_empty() {
            return Err(ConfigError::Missing("BUCKET_NAME"));
        }
        if self.object_store_endpoint.is_empty() {
            return Err(ConfigError::Missing("OBJECT_STORE_ENDPOINT"));
        }
        if self.vision_endpoint.is_empty() {
            return Err(ConfigError::Missing("VISION_ENDPOINT"));
        }
        if !(0.0..=100.0).contains(&self.default_min_confidence) {
            return Err(ConfigError::Invalid {
                name: "DEFAULT_MIN_CONFIDENCE",
                value: self.default_min_confidence.to_string(),
            });
        }
        if self.store_timeout.is_zero() {
            return Err(ConfigError::Invalid {
                name: "STORE_TIMEOUT_MS",
                value: "0".to_string(),
            });
        }

        if self.quota.enabled {
            if self.quota.table.is_none() {
                return Err(ConfigError::Missing("QUOTA_TABLE"));
            }
            if self.quota.backend.is_none() {
                return Err(ConfigError::Missing("QUOTA_STORE_ENDPOINT"));
            }
            if self.quota.limit == 0 {
                return Err(ConfigError::Invalid {
                    name: "QUOTA_LIMIT",
                    value: "0".to_string(),
                });
            }
        }
        Ok(())
    }
}
