// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
pub mod service;

pub use service::{
    AnalysisError, AnalysisMode, AnalysisOutcome, AnalysisResult, AnalysisService,
    AnalysisSettings, ImageUpload,
};
