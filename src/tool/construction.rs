// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Point-based rectangle construction.
//!
//! Rectangles are only created from clicked points: two diagonal corners
//! or four arbitrary corners. Free-hand dragging never creates anything.

use crate::models::annotation::{Point, Rect};
use crate::util::geometry::{from_four_points, from_two_points};

/// Active creation protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CreationMode {
    /// Edit existing rectangles only
    #[default]
    Drag,
    /// Two clicks on opposite corners
    TwoPoint,
    /// Four clicks, bounding box of the points
    FourPoint,
}

impl CreationMode {
    /// Clicks needed to complete a rectangle, `None` for Drag.
    pub fn required_points(self) -> Option<usize> {
        match self {
            CreationMode::Drag => None,
            CreationMode::TwoPoint => Some(2),
            CreationMode::FourPoint => Some(4),
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            CreationMode::Drag => "Drag",
            CreationMode::TwoPoint => "2 points",
            CreationMode::FourPoint => "4 points",
        }
    }
}

/// Result of feeding one click to the collector.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CollectOutcome {
    /// Not a point mode; the click was not consumed
    Ignored,
    /// Still collecting, with this many points so far
    Collecting(usize),
    /// Enough points, and the rectangle passed the size guard
    Created(Rect),
    /// Enough points, but the rectangle was too small
    Rejected(Rect),
}

/// Clicked points plus the live hover position for preview.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PointCollector {
    points: Vec<Point>,
    hover: Option<Point>,
}

impl PointCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn points(&self) -> &[Point] {
        &self.points
    }

    pub fn hover(&self) -> Option<Point> {
        self.hover
    }

    pub fn is_collecting(&self) -> bool {
        !self.points.is_empty()
    }

    /// Track the cursor; the hover point is kept only while collecting.
    pub fn set_hover(&mut self, position: Point) {
        self.hover = self.is_collecting().then_some(position);
    }

    /// Drop every collected point. Returns whether anything was pending.
    pub fn reset(&mut self) -> bool {
        let pending = self.is_collecting();
        self.points.clear();
        self.hover = None;
        pending
    }

    /// Append a click. Once the mode's point count is reached the
    /// collection is always cleared, whether or not a rectangle results.
    pub fn push(&mut self, mode: CreationMode, point: Point, min_size: f64) -> CollectOutcome {
        let Some(required) = mode.required_points() else {
            return CollectOutcome::Ignored;
        };

        self.points.push(point);
        if self.points.len() < required {
            return CollectOutcome::Collecting(self.points.len());
        }

        // Points left over from a switch between point modes are dropped
        let tail = &self.points[self.points.len() - required..];
        let rect = match tail {
            [a, b] => Some(from_two_points(*a, *b)),
            [a, b, c, d] => Some(from_four_points(&[*a, *b, *c, *d])),
            _ => None,
        };
        self.reset();

        let Some(rect) = rect else {
            return CollectOutcome::Ignored;
        };

        if rect.exceeds(min_size) {
            CollectOutcome::Created(rect)
        } else {
            log::debug!(
                "Discarded {}x{} rectangle below minimum size {}",
                rect.w,
                rect.h,
                min_size
            );
            CollectOutcome::Rejected(rect)
        }
    }
}
