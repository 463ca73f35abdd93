// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Near-duplicate line removal

use super::geometry::intersection_over_union;
use super::types::LineDetection;

/// Lines whose boxes overlap by more than this IoU are candidates for removal
pub const DUPLICATE_IOU_THRESHOLD: f64 = 0.5;

/// Collapse whitespace runs to a single space, trim and lowercase
pub fn normalize_text(text: &str) -> String {
    text.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Two lines are duplicates when their normalized texts match and their boxes
/// overlap by more than [`DUPLICATE_IOU_THRESHOLD`]
pub fn is_duplicate(a: &LineDetection, b: &LineDetection) -> bool {
    normalize_text(&a.text) == normalize_text(&b.text)
        && intersection_over_union(&a.bounding_box, &b.bounding_box) > DUPLICATE_IOU_THRESHOLD
}

/// Drop lines below `min_confidence`, then drop near-duplicates
///
/// The first occurrence wins and survivors keep their input order.
pub fn deduplicate(lines: &[LineDetection], min_confidence: f64) -> Vec<LineDetection> {
    let mut kept: Vec<LineDetection> = Vec::with_capacity(lines.len());

    for line in lines.iter().filter(|l| l.confidence >= min_confidence) {
        let dominated = kept.iter().any(|k| is_duplicate(k, line));
        if !dominated {
            kept.push(line.clone());
        }
    }

    kept
}
