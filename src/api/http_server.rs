// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use axum::{
    extract::{DefaultBodyLimit, State},
    http::{header, HeaderName, Method, Uri},
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use std::{net::SocketAddr, sync::Arc};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::{debug, info};

use super::analyze::{admin_analyze_handler, analyze_handler};
use super::errors::{ApiError, ApiErrorResponse};
use crate::analysis::AnalysisService;
use crate::auth::{BypassPolicy, CLIENT_ID_HEADER};
use crate::config::AppConfig;
use crate::quota::QuotaLimiter;
use crate::vision::image_utils::MAX_IMAGE_SIZE;

/// Largest accepted request body: a base64-encoded `MAX_IMAGE_SIZE` image
/// plus room for the surrounding JSON fields
pub const MAX_BODY_SIZE: usize = MAX_IMAGE_SIZE / 3 * 4 + 64 * 1024;

/// Shared handler state; every collaborator is injected
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    /// `None` when quota enforcement is disabled
    pub quota: Option<Arc<QuotaLimiter>>,
    pub analysis: Arc<AnalysisService>,
    pub bypass: Arc<dyn BypassPolicy>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub ok: bool,
    pub message: String,
    pub bucket: String,
    pub quota_enabled: bool,
}

fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
            HeaderName::from_static(CLIENT_ID_HEADER),
            HeaderName::from_static("x-amz-date"),
            HeaderName::from_static("x-amz-security-token"),
            HeaderName::from_static("x-amz-content-sha256"),
        ])
}

/// Build the router; routes answer with or without a trailing slash
pub fn create_app(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/health/", get(health_handler))
        .route("/analyze", post(analyze_handler))
        .route("/analyze/", post(analyze_handler))
        .route("/admin/analyze", post(admin_analyze_handler))
        .route("/admin/analyze/", post(admin_analyze_handler))
        .fallback(not_found_handler)
        .layer(DefaultBodyLimit::max(MAX_BODY_SIZE))
        .layer(cors_layer())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn start_server(state: AppState, addr: SocketAddr) -> std::io::Result<()> {
    let app = create_app(state);
    let listener = tokio::net::TcpListener::bind(addr).await?;

    info!("API server listening on {}", addr);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("Shutdown signal received");
    }
}

async fn health_handler(State(state): State<AppState>) -> impl IntoResponse {
    Json(HealthResponse {
        ok: true,
        message: "Image analysis node running".to_string(),
        bucket: state.config.bucket.clone(),
        quota_enabled: state.quota.is_some(),
    })
}

async fn not_found_handler(uri: Uri) -> Response {
    debug!("No route for {}", uri.path());
    ApiErrorResponse(ApiError::NotFound(uri.path().to_string())).into_response()
}
