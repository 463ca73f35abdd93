// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Upload an image, run detection, and consolidate the results

use std::str::FromStr;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info};
use uuid::Uuid;

use crate::storage::{ObjectRef, ObjectStore, StorageError};
use crate::vision::{
    consolidate_lines, guess_content_type, upload_extension, Label, LineDetection, VisionError,
    VisionService,
};

#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("Upload failed: {0}")]
    Storage(#[from] StorageError),

    #[error("Detection failed: {0}")]
    Vision(#[from] VisionError),
}

/// Which detection to run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AnalysisMode {
    #[default]
    Labels,
    Text,
}

impl AnalysisMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            AnalysisMode::Labels => "labels",
            AnalysisMode::Text => "text",
        }
    }
}

impl FromStr for AnalysisMode {
    type Err = std::convert::Infallible;

    /// `text` (any case) selects text detection; anything else means labels
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(if s.trim().eq_ignore_ascii_case("text") {
            AnalysisMode::Text
        } else {
            AnalysisMode::Labels
        })
    }
}

/// A decoded image ready for upload
#[derive(Debug, Clone)]
pub struct ImageUpload {
    pub bytes: Vec<u8>,
    pub filename: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum AnalysisResult {
    Labels(Vec<Label>),
    Text(Vec<LineDetection>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisOutcome {
    pub stored: ObjectRef,
    pub result: AnalysisResult,
}

/// Settings the service needs from the application config
#[derive(Debug, Clone)]
pub struct AnalysisSettings {
    pub bucket: String,
    pub upload_prefix: String,
    pub max_labels: u32,
}

/// Wires uploads to the object store and detections to the text pipeline
pub struct AnalysisService {
    object_store: Arc<dyn ObjectStore>,
    vision: Arc<dyn VisionService>,
    settings: AnalysisSettings,
}

impl AnalysisService {
    pub fn new(
        object_store: Arc<dyn ObjectStore>,
        vision: Arc<dyn VisionService>,
        settings: AnalysisSettings,
    ) -> Self {
        Self {
            object_store,
            vision,
            settings,
        }
    }

    fn object_key(&self, filename: &str) -> String {
        format!(
            "{}{}{}",
            self.settings.upload_prefix,
            Uuid::new_v4().simple(),
            upload_extension(filename)
        )
    }

    /// Store `image`, then run `mode` detection against the stored object
    pub async fn analyze(
        &self,
        image: ImageUpload,
        mode: AnalysisMode,
        min_confidence: f64,
    ) -> Result<AnalysisOutcome, AnalysisError> {
        let stored = ObjectRef::new(&self.settings.bucket, &self.object_key(&image.filename));
        let content_type = guess_content_type(&image.filename, &image.bytes);

        self.object_store
            .put_object(&stored, image.bytes, &content_type)
            .await?;
        info!("Uploaded {} ({})", stored, content_type);

        let result = match mode {
            AnalysisMode::Text => {
                let detections = self.vision.detect_text(&stored).await?;
                debug!("{} raw text detections", detections.len());
                AnalysisResult::Text(consolidate_lines(&detections, min_confidence))
            }
            AnalysisMode::Labels => {
                let labels = self
                    .vision
                    .detect_labels(&stored, self.settings.max_labels, min_confidence)
                    .await?;
                AnalysisResult::Labels(labels)
            }
        };

        Ok(AnalysisOutcome { stored, result })
    }
}
