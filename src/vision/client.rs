// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Clients for the external label/text detection service

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use super::types::{Label, TextDetection};
use crate::storage::ObjectRef;

#[derive(Debug, Clone, Error)]
pub enum VisionError {
    #[error("Vision request failed: {0}")]
    Request(String),
    #[error("Vision service error: {status} - {message}")]
    Status { status: u16, message: String },
    #[error("Invalid vision response: {0}")]
    Decode(String),
}

/// Label and text detection over an already-uploaded image
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait VisionService: Send + Sync {
    async fn detect_text(&self, image: &ObjectRef) -> Result<Vec<TextDetection>, VisionError>;

    async fn detect_labels(
        &self,
        image: &ObjectRef,
        max_labels: u32,
        min_confidence: f64,
    ) -> Result<Vec<Label>, VisionError>;
}

// --- wire structs ---

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct S3Object {
    bucket: String,
    name: String,
}

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct ImageSource {
    s3_object: S3Object,
}

impl From<&ObjectRef> for ImageSource {
    fn from(object: &ObjectRef) -> Self {
        Self {
            s3_object: S3Object {
                bucket: object.bucket.clone(),
                name: object.key.clone(),
            },
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct DetectTextRequest {
    image: ImageSource,
}

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct DetectLabelsRequest {
    image: ImageSource,
    max_labels: u32,
    min_confidence: f64,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct DetectTextResponse {
    #[serde(default)]
    text_detections: Option<Vec<serde_json::Value>>,
}

/// Decode a DetectText body one detection at a time
///
/// An entry that does not match the detection shape is dropped with a
/// warning; only a body that is not a detection list at all is an error.
pub fn decode_text_detections(body: &[u8]) -> Result<Vec<TextDetection>, VisionError> {
    let parsed: DetectTextResponse =
        serde_json::from_slice(body).map_err(|e| VisionError::Decode(e.to_string()))?;

    Ok(parsed
        .text_detections
        .unwrap_or_default()
        .into_iter()
        .enumerate()
        .filter_map(|(index, raw)| match serde_json::from_value(raw) {
            Ok(detection) => Some(detection),
            Err(e) => {
                warn!("Dropping undecodable text detection #{}: {}", index, e);
                None
            }
        })
        .collect())
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ParentLabel {
    #[serde(default)]
    name: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct RawLabel {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    confidence: Option<f64>,
    #[serde(default)]
    parents: Vec<ParentLabel>,
}

impl From<RawLabel> for Label {
    fn from(raw: RawLabel) -> Self {
        Label {
            name: raw.name.unwrap_or_default(),
            confidence: raw.confidence.unwrap_or(0.0),
            parents: raw.parents.into_iter().filter_map(|p| p.name).collect(),
        }
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct DetectLabelsResponse {
    #[serde(default)]
    labels: Vec<RawLabel>,
}

/// Vision service reached over HTTP with JSON bodies
pub struct HttpVisionClient {
    client: Client,
    endpoint: String,
}

impl HttpVisionClient {
    pub fn new(endpoint: &str, timeout: Duration) -> Result<Self, VisionError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| VisionError::Request(e.to_string()))?;

        let endpoint = endpoint.trim_end_matches('/').to_string();
        info!("Vision client configured: endpoint={}", endpoint);

        Ok(Self { client, endpoint })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn post<B: Serialize + Sync>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<reqwest::Response, VisionError> {
        let response = self
            .client
            .post(format!("{}/{}", self.endpoint, path))
            .json(body)
            .send()
            .await
            .map_err(|e| VisionError::Request(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(VisionError::Status {
                status: status.as_u16(),
                message,
            });
        }
        Ok(response)
    }
}

#[async_trait]
impl VisionService for HttpVisionClient {
    async fn detect_text(&self, image: &ObjectRef) -> Result<Vec<TextDetection>, VisionError> {
        debug!("DetectText: {}", image);
        let request = DetectTextRequest {
            image: image.into(),
        };
        let body = self
            .post("detect-text", &request)
            .await?
            .bytes()
            .await
            .map_err(|e| VisionError::Request(e.to_string()))?;

        decode_text_detections(&body)
    }

    async fn detect_labels(
        &self,
        image: &ObjectRef,
        max_labels: u32,
        min_confidence: f64,
    ) -> Result<Vec<Label>, VisionError> {
        debug!("DetectLabels: {}", image);
        let request = DetectLabelsRequest {
            image: image.into(),
            max_labels,
            min_confidence,
        };
        let parsed: DetectLabelsResponse = self
            .post("detect-labels", &request)
            .await?
            .json()
            .await
            .map_err(|e| VisionError::Decode(e.to_string()))?;

        Ok(parsed.labels.into_iter().map(Label::from).collect())
    }
}

/// Vision service returning fixed fixtures, for tests and local runs
#[derive(Default)]
pub struct StaticVisionService {
    text: Vec<TextDetection>,
    labels: Vec<Label>,
    failure: Arc<Mutex<Option<VisionError>>>,
}

impl StaticVisionService {
    pub fn new(text: Vec<TextDetection>, labels: Vec<Label>) -> Self {
        Self {
            text,
            labels,
            failure: Arc::new(Mutex::new(None)),
        }
    }

    /// Fail the next detection call with `error`
    pub async fn inject_error(&self, error: VisionError) {
        *self.failure.lock().await = Some(error);
    }

    async fn check_injected_error(&self) -> Result<(), VisionError> {
        match self.failure.lock().await.take() {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl VisionService for StaticVisionService {
    async fn detect_text(&self, _image: &ObjectRef) -> Result<Vec<TextDetection>, VisionError> {
        self.check_injected_error().await?;
        Ok(self.text.clone())
    }

    async fn detect_labels(
        &self,
        _image: &ObjectRef,
        max_labels: u32,
        min_confidence: f64,
    ) -> Result<Vec<Label>, VisionError> {
        self.check_injected_error().await?;
        Ok(self
            .labels
            .iter()
            .filter(|l| l.confidence >= min_confidence)
            .take(max_labels as usize)
            .cloned()
            .collect())
    }
}
