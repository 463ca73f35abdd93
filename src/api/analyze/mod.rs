// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Analyze API endpoint module
//!
//! Provides POST /analyze and POST /admin/analyze for storing an image and
//! running label or text detection on it.

pub mod handler;
pub mod request;
pub mod response;

pub use handler::{admin_analyze_handler, analyze_handler, QUOTA_BYPASS_HEADER};
pub use request::{AnalyzeRequest, ValidatedAnalyze};
pub use response::AnalyzeResponse;
