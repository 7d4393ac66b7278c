// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Annotation data structures.
//!
//! This module defines the annotated rectangle, its review status, the
//! per-frame annotation map and the bounding-box shapes delivered by
//! external importers and detectors.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A 2D point in frame pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Plain axis-aligned geometry: `(x, y)` is the top-left corner.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub w: f64,
    pub h: f64,
}

impl Rect {
    pub fn new(x: f64, y: f64, w: f64, h: f64) -> Self {
        Self { x, y, w, h }
    }

    pub fn top_left(&self) -> Point {
        Point::new(self.x, self.y)
    }

    pub fn right(&self) -> f64 {
        self.x + self.w
    }

    pub fn bottom(&self) -> f64 {
        self.y + self.h
    }

    /// True when both sides are strictly larger than `min_size`.
    pub fn exceeds(&self, min_size: f64) -> bool {
        self.w > min_size && self.h > min_size
    }
}

/// Review status of an annotated object.
///
/// Exactly one status is active at a time. `Hold` and `Attack` freeze the
/// geometry; `Reject` hides the rectangle without removing it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    #[default]
    Hold,
    Attack,
    Reject,
}

impl Status {
    pub const ALL: [Status; 3] = [Status::Hold, Status::Attack, Status::Reject];

    /// Whether move/resize is forbidden for this status.
    pub fn freezes_geometry(self) -> bool {
        matches!(self, Status::Hold | Status::Attack)
    }

    pub fn is_visible(self) -> bool {
        !matches!(self, Status::Reject)
    }

    pub fn label(self) -> &'static str {
        match self {
            Status::Hold => "Hold",
            Status::Attack => "Attack",
            Status::Reject => "Reject",
        }
    }
}

/// An annotated rectangle with status and an optional original-geometry
/// snapshot used by Hold to revert edits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Rectangle {
    pub x: f64,
    pub y: f64,
    pub w: f64,
    pub h: f64,
    #[serde(default)]
    pub status: Status,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_x: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_y: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_w: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_h: Option<f64>,
}

impl Rectangle {
    /// Create a `Hold` rectangle without an original snapshot.
    pub fn new(rect: Rect) -> Self {
        Self {
            x: rect.x,
            y: rect.y,
            w: rect.w,
            h: rect.h,
            status: Status::Hold,
            original_x: None,
            original_y: None,
            original_w: None,
            original_h: None,
        }
    }

    /// Create a `Hold` rectangle whose original snapshot equals its geometry.
    pub fn pinned(rect: Rect) -> Self {
        let mut rectangle = Self::new(rect);
        rectangle.fill_missing_original();
        rectangle
    }

    pub fn with_status(mut self, status: Status) -> Self {
        self.status = status;
        self
    }

    pub fn rect(&self) -> Rect {
        Rect::new(self.x, self.y, self.w, self.h)
    }

    /// Replace geometry, keeping status and the original snapshot.
    pub fn set_rect(&mut self, rect: Rect) {
        self.x = rect.x;
        self.y = rect.y;
        self.w = rect.w;
        self.h = rect.h;
    }

    /// The original geometry, only when all four fields are present.
    pub fn original(&self) -> Option<Rect> {
        Some(Rect::new(
            self.original_x?,
            self.original_y?,
            self.original_w?,
            self.original_h?,
        ))
    }

    pub fn has_any_original(&self) -> bool {
        self.original_x.is_some()
            || self.original_y.is_some()
            || self.original_w.is_some()
            || self.original_h.is_some()
    }

    /// Seed each absent original field from the current geometry.
    /// Present fields are never overwritten.
    pub fn fill_missing_original(&mut self) {
        self.original_x = self.original_x.or(Some(self.x));
        self.original_y = self.original_y.or(Some(self.y));
        self.original_w = self.original_w.or(Some(self.w));
        self.original_h = self.original_h.or(Some(self.h));
    }

    /// Apply a status, maintaining the snapshot invariant.
    ///
    /// Becoming `Hold` restores the original geometry (seeding it first
    /// from the current geometry when absent). Any other status snapshots
    /// the current geometry only if no original field is set yet.
    pub fn apply_status(&mut self, status: Status) {
        match status {
            Status::Hold => {
                self.fill_missing_original();
                if let Some(original) = self.original() {
                    self.set_rect(original);
                }
            }
            Status::Attack | Status::Reject => {
                if !self.has_any_original() {
                    self.fill_missing_original();
                }
            }
        }
        self.status = status;
    }
}

/// Per-frame annotations keyed by string-encoded frame index.
///
/// List order inside a frame is significant and never re-sorted: the
/// position of a rectangle is its identity across frames.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FrameAnnotations {
    #[serde(default)]
    pub frames: BTreeMap<String, Vec<Rectangle>>,
}

impl FrameAnnotations {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&[Rectangle]> {
        self.frames.get(key).map(Vec::as_slice)
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Keys that parse as integers, in ascending numeric order.
    pub fn numeric_keys(&self) -> Vec<i64> {
        let mut keys: Vec<i64> = self
            .frames
            .keys()
            .filter_map(|k| k.trim().parse::<i64>().ok())
            .collect();
        keys.sort_unstable();
        keys
    }

    /// Total number of rectangles across every frame.
    pub fn rectangle_count(&self) -> usize {
        self.frames.values().map(Vec::len).sum()
    }
}

/// A box as delivered by an importer or detector, `{x, y, width, height}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frame: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub class: Option<String>,
}

impl BoundingBox {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
            frame: None,
            id: None,
            class: None,
        }
    }

    pub fn rect(&self) -> Rect {
        Rect::new(self.x, self.y, self.width, self.height)
    }
}

/// Raw detector box encodings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "format", content = "values", rename_all = "snake_case")]
pub enum BoxFormat {
    /// `[x, y, width, height]`
    Xywh([f64; 4]),
    /// `[x_min, y_min, x_max, y_max]`
    CornerPair([f64; 4]),
}

impl BoxFormat {
    /// Normalise to canonical `{x, y, w, h}`.
    pub fn normalize(&self) -> Rect {
        match *self {
            BoxFormat::Xywh([x, y, w, h]) => Rect::new(x, y, w, h),
            BoxFormat::CornerPair([x_min, y_min, x_max, y_max]) => {
                Rect::new(x_min, y_min, x_max - x_min, y_max - y_min)
            }
        }
    }
}

/// Parsed external annotation set, frame key to boxes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParsedAnnotation {
    #[serde(default)]
    pub frames: BTreeMap<String, Vec<BoundingBox>>,
}

impl ParsedAnnotation {
    pub fn box_count(&self) -> usize {
        self.frames.values().map(Vec::len).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_serializes_lowercase() {
        let json = serde_json::to_string(&Status::Attack).unwrap();
        assert_eq!(json, "\"attack\"");
    }

    #[test]
    fn test_missing_status_defaults_to_hold() {
        let rect: Rectangle = serde_json::from_str(r#"{"x":1,"y":2,"w":30,"h":40}"#).unwrap();
        assert_eq!(rect.status, Status::Hold);
        assert!(rect.original().is_none());
    }

    #[test]
    fn test_original_fields_use_camel_case() {
        let rect = Rectangle::pinned(Rect::new(1.0, 2.0, 30.0, 40.0));
        let json = serde_json::to_value(&rect).unwrap();
        assert_eq!(json["originalX"], 1.0);
        assert_eq!(json["originalH"], 40.0);
        assert_eq!(json["status"], "hold");
    }

    #[test]
    fn test_apply_hold_reverts_to_original() {
        let mut rect = Rectangle::pinned(Rect::new(10.0, 10.0, 20.0, 20.0));
        rect.status = Status::Reject;
        rect.set_rect(Rect::new(50.0, 60.0, 70.0, 80.0));

        rect.apply_status(Status::Hold);
        assert_eq!(rect.rect(), Rect::new(10.0, 10.0, 20.0, 20.0));
        assert_eq!(rect.status, Status::Hold);

        rect.apply_status(Status::Hold);
        assert_eq!(rect.rect(), Rect::new(10.0, 10.0, 20.0, 20.0));
    }

    #[test]
    fn test_snapshot_is_never_overwritten() {
        let mut rect = Rectangle::new(Rect::new(0.0, 0.0, 20.0, 20.0));
        rect.apply_status(Status::Attack);
        assert_eq!(rect.original(), Some(Rect::new(0.0, 0.0, 20.0, 20.0)));

        rect.set_rect(Rect::new(5.0, 5.0, 25.0, 25.0));
        rect.apply_status(Status::Reject);
        assert_eq!(rect.original(), Some(Rect::new(0.0, 0.0, 20.0, 20.0)));
    }

    #[test]
    fn test_partial_original_is_kept() {
        let mut rect = Rectangle::new(Rect::new(3.0, 4.0, 20.0, 20.0));
        rect.original_x = Some(1.0);
        rect.apply_status(Status::Attack);
        assert_eq!(rect.original_x, Some(1.0));
        assert_eq!(rect.original_y, None);

        rect.apply_status(Status::Hold);
        assert_eq!(rect.rect(), Rect::new(1.0, 4.0, 20.0, 20.0));
    }

    #[test]
    fn test_numeric_keys_skip_garbage() {
        let mut map = FrameAnnotations::new();
        map.frames.insert("10".into(), vec![]);
        map.frames.insert("2".into(), vec![]);
        map.frames.insert("meta".into(), vec![]);
        assert_eq!(map.numeric_keys(), vec![2, 10]);
    }

    #[test]
    fn test_box_format_normalize() {
        let corners = BoxFormat::CornerPair([10.0, 20.0, 60.0, 100.0]);
        assert_eq!(corners.normalize(), Rect::new(10.0, 20.0, 50.0, 80.0));

        let xywh = BoxFormat::Xywh([1.0, 2.0, 3.0, 4.0]);
        assert_eq!(xywh.normalize(), Rect::new(1.0, 2.0, 3.0, 4.0));
    }
}
