// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Detection types exchanged with the external vision service

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::geometry::BoundingBox;

/// Reasons a raw detection is rejected before it reaches the text pipeline
#[derive(Debug, Clone, Error, PartialEq)]
pub enum DetectionError {
    #[error("invalid detection input: missing {0}")]
    MissingField(&'static str),

    #[error("invalid detection input: confidence {0} outside 0-100")]
    ConfidenceOutOfRange(f64),

    #[error("invalid detection input: malformed bounding box {0:?}")]
    MalformedBox(BoundingBox),
}

/// A single word reported by the vision service
#[derive(Debug, Clone, PartialEq)]
pub struct WordDetection {
    pub text: String,
    /// Confidence score (0.0-100.0)
    pub confidence: f64,
    pub bounding_box: BoundingBox,
}

/// A line of text, either reported directly or built from words
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct LineDetection {
    #[serde(rename = "DetectedText")]
    pub text: String,
    /// Confidence score (0.0-100.0)
    pub confidence: f64,
    #[serde(rename = "Box")]
    pub bounding_box: BoundingBox,
}

/// Granularity of a raw text detection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum DetectionKind {
    Line,
    Word,
    #[serde(other)]
    Other,
}

/// Geometry wrapper as returned by the vision service
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Geometry {
    #[serde(default)]
    pub bounding_box: Option<BoundingBox>,
}

/// Untrusted text detection, every field optional until validated
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct TextDetection {
    #[serde(rename = "Type")]
    pub kind: DetectionKind,
    #[serde(default)]
    pub detected_text: Option<String>,
    #[serde(default)]
    pub confidence: Option<f64>,
    #[serde(default)]
    pub geometry: Option<Geometry>,
}

impl TextDetection {
    pub fn new(kind: DetectionKind, text: &str, confidence: f64, bounding_box: BoundingBox) -> Self {
        Self {
            kind,
            detected_text: Some(text.to_string()),
            confidence: Some(confidence),
            geometry: Some(Geometry {
                bounding_box: Some(bounding_box),
            }),
        }
    }

    fn validated(&self) -> Result<(String, f64, BoundingBox), DetectionError> {
        let text = self
            .detected_text
            .clone()
            .ok_or(DetectionError::MissingField("DetectedText"))?;

        let confidence = self
            .confidence
            .ok_or(DetectionError::MissingField("Confidence"))?;
        if !confidence.is_finite() || !(0.0..=100.0).contains(&confidence) {
            return Err(DetectionError::ConfidenceOutOfRange(confidence));
        }

        let bounding_box = self
            .geometry
            .as_ref()
            .and_then(|g| g.bounding_box)
            .ok_or(DetectionError::MissingField("Geometry.BoundingBox"))?;
        if !bounding_box.is_well_formed() {
            return Err(DetectionError::MalformedBox(bounding_box));
        }

        Ok((text, confidence, bounding_box))
    }
}

impl TryFrom<&TextDetection> for WordDetection {
    type Error = DetectionError;

    fn try_from(raw: &TextDetection) -> Result<Self, Self::Error> {
        let (text, confidence, bounding_box) = raw.validated()?;
        Ok(Self {
            text,
            confidence,
            bounding_box,
        })
    }
}

impl TryFrom<&TextDetection> for LineDetection {
    type Error = DetectionError;

    fn try_from(raw: &TextDetection) -> Result<Self, Self::Error> {
        let (text, confidence, bounding_box) = raw.validated()?;
        Ok(Self {
            text,
            confidence,
            bounding_box,
        })
    }
}

/// Object/scene label passed through from the vision service unchanged
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Label {
    pub name: String,
    pub confidence: f64,
    #[serde(default)]
    pub parents: Vec<String>,
}
