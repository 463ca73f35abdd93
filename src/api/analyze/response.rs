// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Analyze response types

use serde::{Deserialize, Serialize};

use crate::analysis::{AnalysisMode, AnalysisOutcome, AnalysisResult};
use crate::vision::{Label, LineDetection};

/// Response from POST /analyze
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AnalyzeResponse {
    /// Location of the uploaded image (`s3://bucket/key`)
    pub stored: String,
    /// `text` or `labels`
    pub mode: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub texts: Option<Vec<LineDetection>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub labels: Option<Vec<Label>>,
}

impl From<AnalysisOutcome> for AnalyzeResponse {
    fn from(outcome: AnalysisOutcome) -> Self {
        let stored = outcome.stored.to_string();
        match outcome.result {
            AnalysisResult::Text(lines) => Self {
                stored,
                mode: AnalysisMode::Text.as_str().to_string(),
                texts: Some(lines),
                labels: None,
            },
            AnalysisResult::Labels(labels) => Self {
                stored,
                mode: AnalysisMode::Labels.as_str().to_string(),
                texts: None,
                labels: Some(labels),
            },
        }
    }
}
