// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Word-to-line grouping for services that only return word-level boxes
//!
//! Words are bucketed into fixed-height horizontal bands by the vertical
//! center of their box, then each band is read left to right. A word that
//! straddles a band boundary can end up on its own line; that approximation
//! is accepted.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use super::geometry::BoundingBox;
use super::types::{LineDetection, WordDetection};

/// Band height as a fraction of normalized image height
pub const BAND: f64 = 0.04;

/// Row bucket for a word, counted from the top of the image
fn row_bucket(word: &WordDetection) -> i64 {
    (word.bounding_box.center_y() / BAND).floor() as i64
}

/// Vertical center rounded to hundredths of the image height
fn center_rank(word: &WordDetection) -> i64 {
    (word.bounding_box.center_y() * 100.0).round() as i64
}

/// Reading order inside a band: left edge, then the rounded vertical center.
/// Words still tied fall back to text and confidence so the output does not
/// depend on input order.
fn reading_order(a: &WordDetection, b: &WordDetection) -> Ordering {
    a.bounding_box
        .left
        .total_cmp(&b.bounding_box.left)
        .then_with(|| center_rank(a).cmp(&center_rank(b)))
        .then_with(|| a.text.cmp(&b.text))
        .then_with(|| a.confidence.total_cmp(&b.confidence))
}

fn build_line(words: &[&WordDetection]) -> Option<LineDetection> {
    let bounding_box = BoundingBox::enclosing(words.iter().map(|w| &w.bounding_box))?;
    let text = words
        .iter()
        .map(|w| w.text.as_str())
        .collect::<Vec<_>>()
        .join(" ");
    let confidence = words.iter().map(|w| w.confidence).sum::<f64>() / words.len() as f64;

    Some(LineDetection {
        text,
        confidence,
        bounding_box,
    })
}

/// Group unordered words into lines, top to bottom and left to right
///
/// Each line's confidence is the mean of its words and its box is the
/// smallest box enclosing them.
pub fn group(words: &[WordDetection]) -> Vec<LineDetection> {
    let mut rows: BTreeMap<i64, Vec<&WordDetection>> = BTreeMap::new();
    for word in words {
        rows.entry(row_bucket(word)).or_default().push(word);
    }

    rows.into_values()
        .filter_map(|mut row| {
            row.sort_by(|a, b| reading_order(a, b));
            build_line(&row)
        })
        .collect()
}
