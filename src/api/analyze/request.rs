// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Analyze request types and validation

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::analysis::{AnalysisMode, ImageUpload};
use crate::api::errors::ApiError;
use crate::vision::{decode_base64_payload, ImageError};

const DEFAULT_FILENAME: &str = "image.jpg";

/// Request body for POST /analyze
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AnalyzeRequest {
    /// Base64-encoded image bytes
    #[serde(default)]
    pub content_base64: Option<String>,

    /// Original filename, used for the stored extension and content type
    #[serde(default)]
    pub filename: Option<String>,

    /// `labels` (default) or `text`
    #[serde(default)]
    pub mode: Option<String>,

    /// Minimum confidence (0-100), defaults to the configured value
    #[serde(default)]
    pub min_confidence: Option<f64>,
}

/// A request that passed validation
#[derive(Debug, Clone)]
pub struct ValidatedAnalyze {
    pub upload: ImageUpload,
    pub mode: AnalysisMode,
    pub min_confidence: f64,
}

impl AnalyzeRequest {
    /// Parse a raw body, treating anything that is not a JSON object as empty
    pub fn from_body(body: &[u8]) -> Self {
        if body.is_empty() {
            return Self::default();
        }
        serde_json::from_slice(body).unwrap_or_else(|e| {
            warn!("Unparseable analyze body: {}", e);
            Self::default()
        })
    }

    pub fn validate(self, default_min_confidence: f64) -> Result<ValidatedAnalyze, ApiError> {
        let content = self
            .content_base64
            .filter(|c| !c.trim().is_empty())
            .ok_or_else(|| ApiError::ValidationError {
                field: "content_base64".to_string(),
                message: "content_base64 is required".to_string(),
            })?;

        let bytes = decode_base64_payload(&content).map_err(|e| {
            warn!("Rejected image payload: {}", e);
            let message = match e {
                ImageError::TooLarge(_, max) => format!("Image exceeds maximum size of {} bytes", max),
                _ => "Invalid base64 payload".to_string(),
            };
            ApiError::ValidationError {
                field: "content_base64".to_string(),
                message,
            }
        })?;

        let min_confidence = self.min_confidence.unwrap_or(default_min_confidence);
        if !(0.0..=100.0).contains(&min_confidence) {
            return Err(ApiError::ValidationError {
                field: "min_confidence".to_string(),
                message: format!("min_confidence must be between 0 and 100, got {}", min_confidence),
            });
        }

        let mode = self
            .mode
            .as_deref()
            .and_then(|m| m.parse().ok())
            .unwrap_or_default();

        let filename = self
            .filename
            .filter(|f| !f.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_FILENAME.to_string());

        Ok(ValidatedAnalyze {
            upload: ImageUpload { bytes, filename },
            mode,
            min_confidence,
        })
    }
}
