// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Vision detection types and text consolidation
//!
//! This module provides:
//! - Bounding-box geometry (IoU, enclosing boxes)
//! - Word-to-line grouping for word-only detection output
//! - Near-duplicate line removal
//! - Clients for the external label/text detection service
//!
//! Everything except `client` is pure and safe to call from any number of
//! concurrent requests.

pub mod client;
pub mod dedup;
pub mod geometry;
pub mod image_utils;
pub mod line_grouper;
pub mod text_pipeline;
pub mod types;

pub use client::{
    decode_text_detections, HttpVisionClient, StaticVisionService, VisionError, VisionService,
};
pub use dedup::{deduplicate, is_duplicate, normalize_text};
pub use geometry::{intersection_over_union, BoundingBox};
pub use image_utils::{decode_base64_payload, guess_content_type, upload_extension, ImageError};
pub use line_grouper::group;
pub use text_pipeline::consolidate_lines;
pub use types::{
    DetectionError, DetectionKind, Geometry, Label, LineDetection, TextDetection, WordDetection,
};
