// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
// Version information for the Image Analysis Node

/// Full version string with feature description
pub const VERSION: &str = "v0.1.0-daily-quota-2026-10-18";

/// Semantic version number
pub const VERSION_NUMBER: &str = "0.1.0";

/// Build date
pub const BUILD_DATE: &str = "2026-10-18";

/// Supported features in this version
pub const FEATURES: &[&str] = &[
    "label-detection",
    "text-detection",
    "line-grouping",
    "line-dedup",
    "daily-quota",
    "same-account-bypass",
];

/// Get formatted version string for logging
pub fn get_version_string() -> String {
    format!("Image Analysis Node {} ({})", VERSION_NUMBER, BUILD_DATE)
}
