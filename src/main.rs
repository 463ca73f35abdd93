// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use anyhow::{Context, Result};
use clap::Parser;
use image_analysis_node::{
    analysis::{AnalysisService, AnalysisSettings},
    api::{start_server, AppState},
    auth::SameAccountPolicy,
    cli::Cli,
    config::{AppConfig, ConfigError, QuotaBackend},
    quota::{HttpQuotaStore, InMemoryQuotaStore, QuotaLimiter, QuotaStore},
    storage::HttpObjectStore,
    version,
    vision::HttpVisionClient,
};
use chrono::Utc;
use std::{env, sync::Arc, time::Duration};
use tracing::{debug, info};

const PURGE_INTERVAL: Duration = Duration::from_secs(3600);

fn build_quota(config: &AppConfig) -> Result<Option<Arc<QuotaLimiter>>> {
    if !config.quota.enabled {
        info!("Daily quota disabled");
        return Ok(None);
    }

    let store: Arc<dyn QuotaStore> = match &config.quota.backend {
        Some(QuotaBackend::Memory) => {
            let store = Arc::new(InMemoryQuotaStore::new());
            let purger = store.clone();
            tokio::spawn(async move {
                let mut interval = tokio::time::interval(PURGE_INTERVAL);
                loop {
                    interval.tick().await;
                    let purged = purger.purge_expired(Utc::now()).await;
                    debug!("Purged {} expired quota records", purged);
                }
            });
            info!("Using in-process quota store");
            store
        }
        Some(QuotaBackend::Http { endpoint }) => {
            let table = config
                .quota
                .table
                .as_deref()
                .ok_or(ConfigError::Missing("QUOTA_TABLE"))?;
            info!("Using quota store at {} (table {})", endpoint, table);
            Arc::new(HttpQuotaStore::new(endpoint, table, config.store_timeout)?)
        }
        None => return Err(ConfigError::Missing("QUOTA_STORE_ENDPOINT").into()),
    };

    info!("Daily quota: {} requests per caller", config.quota.limit);
    Ok(Some(Arc::new(QuotaLimiter::new(store, config.quota.limit))))
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();

    // Initialize tracing subscriber for logging
    if env::var("RUST_LOG").is_err() {
        env::set_var("RUST_LOG", "info");
    }
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    info!("Starting {}", version::get_version_string());
    info!("Build {} [{}]", version::VERSION, version::FEATURES.join(", "));

    let config = AppConfig::from_env().context("invalid configuration")?;
    info!(
        "Uploads go to s3://{}/{} (min confidence {}, max labels {})",
        config.bucket, config.upload_prefix, config.default_min_confidence, config.max_labels
    );

    let object_store = Arc::new(HttpObjectStore::new(
        &config.object_store_endpoint,
        config.store_timeout,
    )?);
    let vision = Arc::new(HttpVisionClient::new(
        &config.vision_endpoint,
        config.store_timeout,
    )?);
    info!(
        "Object store at {}, vision service at {}",
        object_store.endpoint(),
        vision.endpoint()
    );

    let analysis = AnalysisService::new(
        object_store,
        vision,
        AnalysisSettings {
            bucket: config.bucket.clone(),
            upload_prefix: config.upload_prefix.clone(),
            max_labels: config.max_labels,
        },
    );

    if config.account_id.is_some() {
        info!("Same-account admin bypass enabled");
    }

    let state = AppState {
        quota: build_quota(&config)?,
        analysis: Arc::new(analysis),
        bypass: Arc::new(SameAccountPolicy::new(config.account_id.clone())),
        config: Arc::new(config),
    };

    start_server(state, cli.bind_addr()).await?;

    info!("Server stopped");
    Ok(())
}
