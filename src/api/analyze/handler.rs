// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Analyze endpoint handlers

use axum::{
    body::Bytes,
    extract::{ConnectInfo, State},
    http::{HeaderMap, HeaderValue},
    response::{IntoResponse, Json, Response},
};
use std::net::SocketAddr;
use tracing::{debug, info, warn};

use super::request::AnalyzeRequest;
use super::response::AnalyzeResponse;
use crate::api::errors::{ApiError, ApiErrorResponse, RATE_LIMIT_HEADER, RATE_REMAINING_HEADER};
use crate::api::http_server::AppState;
use crate::auth::derive_subject;
use crate::quota::QuotaGrant;

pub const QUOTA_BYPASS_HEADER: &str = "x-quota-bypass";
const QUOTA_DISABLED: &str = "disabled";

/// Rate-limit headers for an accepted request, `disabled` when quota is off
fn rate_limit_headers(grant: Option<QuotaGrant>) -> HeaderMap {
    let mut headers = HeaderMap::new();
    match grant {
        Some(grant) => {
            headers.insert(RATE_LIMIT_HEADER, HeaderValue::from(grant.limit));
            headers.insert(RATE_REMAINING_HEADER, HeaderValue::from(grant.remaining()));
        }
        None => {
            headers.insert(RATE_LIMIT_HEADER, HeaderValue::from_static(QUOTA_DISABLED));
            headers.insert(RATE_REMAINING_HEADER, HeaderValue::from_static(QUOTA_DISABLED));
        }
    }
    headers
}

/// Count this request against the caller's daily quota
///
/// Returns `None` when quota enforcement is disabled.
async fn enforce_quota(state: &AppState, subject: &str) -> Result<Option<QuotaGrant>, ApiError> {
    match &state.quota {
        Some(limiter) => Ok(Some(limiter.check_and_record(subject).await?)),
        None => Ok(None),
    }
}

/// Validate the body, upload the image and run detection
async fn process_analyze(state: &AppState, body: &[u8]) -> Result<AnalyzeResponse, ApiError> {
    let validated = AnalyzeRequest::from_body(body).validate(state.config.default_min_confidence)?;
    debug!(
        "Analyze {} ({} bytes, mode {})",
        validated.upload.filename,
        validated.upload.bytes.len(),
        validated.mode.as_str()
    );

    let outcome = state
        .analysis
        .analyze(validated.upload, validated.mode, validated.min_confidence)
        .await
        .map_err(|e| {
            warn!("Analysis failed: {}", e);
            ApiError::from(e)
        })?;

    Ok(outcome.into())
}

fn respond(result: Result<AnalyzeResponse, ApiError>) -> Response {
    match result {
        Ok(response) => Json(response).into_response(),
        Err(e) => ApiErrorResponse(e).into_response(),
    }
}

/// POST /analyze - Store an image and detect labels or text
///
/// # Request
/// - `content_base64`: Base64-encoded image (required)
/// - `filename`: Original filename - defaults to "image.jpg"
/// - `mode`: "labels" (default) or "text"
/// - `min_confidence`: 0-100, defaults to the configured value
///
/// # Errors
/// - 400 Bad Request: missing or invalid payload
/// - 429 Too Many Requests: daily quota reached
/// - 502 Bad Gateway: object store or vision service failed
/// - 503 Service Unavailable: quota store unreachable
pub async fn analyze_handler(
    State(state): State<AppState>,
    peer: Option<ConnectInfo<SocketAddr>>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let subject = derive_subject(&headers, peer.map(|ConnectInfo(addr)| addr));

    let grant = match enforce_quota(&state, &subject).await {
        Ok(grant) => grant,
        Err(e) => return ApiErrorResponse(e).into_response(),
    };

    let result = process_analyze(&state, &body).await;
    (rate_limit_headers(grant), respond(result)).into_response()
}

/// POST /admin/analyze - Same as /analyze, without quota for same-account callers
pub async fn admin_analyze_handler(
    State(state): State<AppState>,
    peer: Option<ConnectInfo<SocketAddr>>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    if !state.bypass.allows_bypass(&headers) {
        return analyze_handler(State(state), peer, headers, body).await;
    }

    info!("Quota bypass for same-account admin request");
    let mut bypass_headers = HeaderMap::new();
    bypass_headers.insert(QUOTA_BYPASS_HEADER, HeaderValue::from_static("same-account"));

    let result = process_analyze(&state, &body).await;
    (bypass_headers, respond(result)).into_response()
}
