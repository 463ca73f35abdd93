// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use axum::{
    http::{HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Json, Response},
};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::analysis::AnalysisError;
use crate::quota::QuotaError;

pub const RATE_LIMIT_HEADER: &str = "x-ratelimit-limit";
pub const RATE_REMAINING_HEADER: &str = "x-ratelimit-remaining";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ErrorResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ok: Option<bool>,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

#[derive(Debug, Clone)]
pub enum ApiError {
    NotFound(String),
    ValidationError { field: String, message: String },
    QuotaExceeded { limit: u64 },
    StorageUnavailable(String),
    Upstream(String),
    InternalError(String),
}

impl ApiError {
    pub fn to_response(&self) -> ErrorResponse {
        let (ok, message, detail) = match self {
            ApiError::NotFound(_) => (Some(false), "Not Found".to_string(), None),
            ApiError::ValidationError { message, .. } => (Some(false), message.clone(), None),
            ApiError::QuotaExceeded { limit } => (
                None,
                format!("Daily limit reached ({}/day). Try again tomorrow.", limit),
                None,
            ),
            ApiError::StorageUnavailable(detail) => (
                Some(false),
                "Quota storage unavailable".to_string(),
                Some(detail.clone()),
            ),
            ApiError::Upstream(detail) => (
                Some(false),
                "Upstream error".to_string(),
                Some(detail.clone()),
            ),
            ApiError::InternalError(detail) => {
                (Some(false), "Unhandled".to_string(), Some(detail.clone()))
            }
        };

        ErrorResponse {
            ok,
            message,
            detail,
        }
    }

    pub fn status_code(&self) -> u16 {
        match self {
            ApiError::NotFound(_) => 404,
            ApiError::ValidationError { .. } => 400,
            ApiError::QuotaExceeded { .. } => 429,
            ApiError::StorageUnavailable(_) => 503,
            ApiError::Upstream(_) => 502,
            ApiError::InternalError(_) => 500,
        }
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::NotFound(path) => write!(f, "Not found: {}", path),
            ApiError::ValidationError { field, message } => {
                write!(f, "Validation error for {}: {}", field, message)
            }
            ApiError::QuotaExceeded { limit } => write!(f, "Daily limit of {} reached", limit),
            ApiError::StorageUnavailable(msg) => write!(f, "Quota storage unavailable: {}", msg),
            ApiError::Upstream(msg) => write!(f, "Upstream error: {}", msg),
            ApiError::InternalError(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl std::error::Error for ApiError {}

impl From<QuotaError> for ApiError {
    fn from(error: QuotaError) -> Self {
        match error {
            QuotaError::Exceeded { limit } => ApiError::QuotaExceeded { limit },
            QuotaError::StorageUnavailable(msg) => ApiError::StorageUnavailable(msg),
        }
    }
}

impl From<AnalysisError> for ApiError {
    fn from(error: AnalysisError) -> Self {
        ApiError::Upstream(error.to_string())
    }
}

/// Error response wrapper
pub struct ApiErrorResponse(pub ApiError);

impl From<ApiError> for ApiErrorResponse {
    fn from(error: ApiError) -> Self {
        Self(error)
    }
}

impl IntoResponse for ApiErrorResponse {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.0.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        let mut headers = HeaderMap::new();
        if let ApiError::QuotaExceeded { limit } = self.0 {
            headers.insert(RATE_LIMIT_HEADER, HeaderValue::from(limit));
            headers.insert(RATE_REMAINING_HEADER, HeaderValue::from_static("0"));
        }

        (status, headers, Json(self.0.to_response())).into_response()
    }
}
