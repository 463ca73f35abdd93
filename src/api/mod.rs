// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
pub mod analyze;
pub mod errors;
pub mod http_server;

pub use analyze::{admin_analyze_handler, analyze_handler, AnalyzeRequest, AnalyzeResponse};
pub use errors::{ApiError, ApiErrorResponse, ErrorResponse};
pub use http_server::{create_app, start_server, AppState, HealthResponse};
