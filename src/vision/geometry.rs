// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Normalized bounding-box geometry shared by line grouping and deduplication

use serde::{Deserialize, Serialize};

/// Added to the IoU denominator so two degenerate boxes never divide by zero
const IOU_EPSILON: f64 = 1e-9;

/// Axis-aligned box in normalized image coordinates (top-left origin)
///
/// All fields are fractions of the image dimensions, so a full-frame box is
/// `{left: 0, top: 0, width: 1, height: 1}`.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct BoundingBox {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

impl BoundingBox {
    pub fn new(left: f64, top: f64, width: f64, height: f64) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }

    /// Right edge.
    pub fn right(&self) -> f64 {
        self.left + self.width
    }

    /// Bottom edge.
    pub fn bottom(&self) -> f64 {
        self.top + self.height
    }

    pub fn area(&self) -> f64 {
        self.width * self.height
    }

    /// Vertical midpoint, used to assign words to line bands.
    pub fn center_y(&self) -> f64 {
        self.top + self.height / 2.0
    }

    /// True when every field is finite and the extent is non-negative
    pub fn is_well_formed(&self) -> bool {
        [self.left, self.top, self.width, self.height]
            .iter()
            .all(|v| v.is_finite())
            && self.width >= 0.0
            && self.height >= 0.0
    }

    /// Smallest box enclosing both `self` and `other`
    pub fn union(&self, other: &BoundingBox) -> BoundingBox {
        let left = self.left.min(other.left);
        let top = self.top.min(other.top);
        let right = self.right().max(other.right());
        let bottom = self.bottom().max(other.bottom());
        BoundingBox {
            left,
            top,
            width: right - left,
            height: bottom - top,
        }
    }

    /// Smallest box enclosing every box in `boxes`, or `None` when empty
    pub fn enclosing<'a, I>(boxes: I) -> Option<BoundingBox>
    where
        I: IntoIterator<Item = &'a BoundingBox>,
    {
        boxes
            .into_iter()
            .fold(None, |acc: Option<BoundingBox>, b| match acc {
                None => Some(*b),
                Some(a) => Some(a.union(b)),
            })
    }
}

/// Intersection-over-union of two boxes, in `[0, 1]`
///
/// Returns exactly `0.0` when the boxes do not overlap, without dividing.
pub fn intersection_over_union(a: &BoundingBox, b: &BoundingBox) -> f64 {
    let inter_w = (a.right().min(b.right()) - a.left.max(b.left)).max(0.0);
    let inter_h = (a.bottom().min(b.bottom()) - a.top.max(b.top)).max(0.0);
    let intersection = inter_w * inter_h;
    if intersection == 0.0 {
        return 0.0;
    }

    let union = a.area() + b.area() - intersection;
    (intersection / (union + IOU_EPSILON)).clamp(0.0, 1.0)
}
