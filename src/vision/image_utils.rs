// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Upload payload helpers: base64 decoding, extensions and content types

use base64::{engine::general_purpose::STANDARD, Engine as _};
use image::ImageFormat;
use std::path::Path;
use thiserror::Error;

/// Maximum decoded upload size (10MB)
pub const MAX_IMAGE_SIZE: usize = 10 * 1024 * 1024;

/// Extension used when the filename has none
const DEFAULT_EXTENSION: &str = ".jpg";

const OCTET_STREAM: &str = "application/octet-stream";

#[derive(Debug, Error)]
pub enum ImageError {
    #[error("Image data is too large: {0} bytes (max: {1} bytes)")]
    TooLarge(usize, usize),

    #[error("Invalid base64 encoding: {0}")]
    InvalidBase64(#[from] base64::DecodeError),

    #[error("Image data is empty")]
    EmptyData,
}

/// Decode a base64 upload payload, rejecting empty or oversized images
pub fn decode_base64_payload(base64_str: &str) -> Result<Vec<u8>, ImageError> {
    if base64_str.is_empty() {
        return Err(ImageError::EmptyData);
    }

    let bytes = STANDARD.decode(base64_str.trim())?;
    if bytes.is_empty() {
        return Err(ImageError::EmptyData);
    }
    if bytes.len() > MAX_IMAGE_SIZE {
        return Err(ImageError::TooLarge(bytes.len(), MAX_IMAGE_SIZE));
    }
    Ok(bytes)
}

/// Lowercased extension of `filename` including the dot, `.jpg` when absent
pub fn upload_extension(filename: &str) -> String {
    Path::new(filename)
        .extension()
        .and_then(|e| e.to_str())
        .filter(|e| !e.is_empty())
        .map(|e| format!(".{}", e.to_lowercase()))
        .unwrap_or_else(|| DEFAULT_EXTENSION.to_string())
}

/// Content type from the filename extension, then from magic bytes
pub fn guess_content_type(filename: &str, bytes: &[u8]) -> String {
    let from_extension = Path::new(filename)
        .extension()
        .and_then(ImageFormat::from_extension);

    from_extension
        .or_else(|| image::guess_format(bytes).ok())
        .map(|format| format.to_mime_type().to_string())
        .unwrap_or_else(|| OCTET_STREAM.to_string())
}
