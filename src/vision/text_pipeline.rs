// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Consolidate raw text detections into a stable, deduplicated line list

use tracing::{debug, warn};

use super::dedup::deduplicate;
use super::line_grouper::group;
use super::types::{DetectionError, DetectionKind, LineDetection, TextDetection, WordDetection};

/// Validate every detection of `kind`, dropping malformed ones with a warning
fn collect_valid<'a, T>(detections: &'a [TextDetection], kind: DetectionKind) -> Vec<T>
where
    T: TryFrom<&'a TextDetection, Error = DetectionError>,
{
    detections
        .iter()
        .filter(|d| d.kind == kind)
        .filter_map(|d| match T::try_from(d) {
            Ok(valid) => Some(valid),
            Err(e) => {
                warn!("Dropping {:?} detection: {}", kind, e);
                None
            }
        })
        .collect()
}

/// Turn vision-service text detections into the final line list
///
/// Line-level detections are preferred. When none survive the confidence
/// filter, word-level detections above `min_confidence` are grouped into
/// lines instead. Either way the result is deduplicated.
pub fn consolidate_lines(detections: &[TextDetection], min_confidence: f64) -> Vec<LineDetection> {
    let mut lines: Vec<LineDetection> = collect_valid(detections, DetectionKind::Line);
    lines.retain(|l| l.confidence >= min_confidence);

    if lines.is_empty() {
        let mut words: Vec<WordDetection> = collect_valid(detections, DetectionKind::Word);
        words.retain(|w| w.confidence >= min_confidence);
        debug!("No line detections, grouping {} words", words.len());
        lines = group(&words);
    }

    let unique = deduplicate(&lines, min_confidence);
    debug!(
        "Consolidated {} candidate lines into {}",
        lines.len(),
        unique.len()
    );
    unique
}
