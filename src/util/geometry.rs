// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Geometric primitives for rectangle hit-testing and construction.
//!
//! All coordinates are frame pixel coordinates. Hit tests use per-axis
//! distances, never Euclidean ones.

use crate::models::annotation::{Point, Rect};

/// Default distance (pixels) for a point to count as "on" a side.
pub const EDGE_TOLERANCE: f64 = 5.0;

/// Default per-axis distance (pixels) for a corner handle hit.
pub const HANDLE_TOLERANCE: f64 = 16.0;

/// Rectangles must be strictly larger than this on both axes.
pub const MIN_SIZE: f64 = 10.0;

/// Corner handle of a rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Handle {
    Nw,
    Ne,
    Sw,
    Se,
}

impl Handle {
    /// Corners in hit-test priority order.
    pub const ORDER: [Handle; 4] = [Handle::Nw, Handle::Ne, Handle::Sw, Handle::Se];

    /// Position of this corner on `rect`.
    pub fn corner_of(self, rect: &Rect) -> Point {
        match self {
            Handle::Nw => Point::new(rect.x, rect.y),
            Handle::Ne => Point::new(rect.right(), rect.y),
            Handle::Sw => Point::new(rect.x, rect.bottom()),
            Handle::Se => Point::new(rect.right(), rect.bottom()),
        }
    }

    /// Geometry after dragging this corner to `cursor`; the opposite
    /// corner stays fixed. No size check is applied here.
    pub fn drag_to(self, rect: &Rect, cursor: Point) -> Rect {
        match self {
            Handle::Nw => Rect::new(
                cursor.x,
                cursor.y,
                rect.right() - cursor.x,
                rect.bottom() - cursor.y,
            ),
            Handle::Ne => Rect::new(
                rect.x,
                cursor.y,
                cursor.x - rect.x,
                rect.bottom() - cursor.y,
            ),
            Handle::Sw => Rect::new(
                cursor.x,
                rect.y,
                rect.right() - cursor.x,
                cursor.y - rect.y,
            ),
            Handle::Se => Rect::new(rect.x, rect.y, cursor.x - rect.x, cursor.y - rect.y),
        }
    }
}

/// Inclusive containment test.
pub fn contains_point(rect: &Rect, x: f64, y: f64) -> bool {
    x >= rect.x && x <= rect.right() && y >= rect.y && y <= rect.bottom()
}

/// True when the point lies within `tolerance` of a side, restricted to
/// that side's span.
pub fn on_edge(rect: &Rect, x: f64, y: f64, tolerance: f64) -> bool {
    let within_y = y >= rect.y && y <= rect.bottom();
    let within_x = x >= rect.x && x <= rect.right();

    let left = (x - rect.x).abs() < tolerance && within_y;
    let right = (x - rect.right()).abs() < tolerance && within_y;
    let top = (y - rect.y).abs() < tolerance && within_x;
    let bottom = (y - rect.bottom()).abs() < tolerance && within_x;

    left || right || top || bottom
}

/// First corner (NW, NE, SW, SE order) within `tolerance` on both axes.
pub fn resize_handle_at(rect: &Rect, x: f64, y: f64, tolerance: f64) -> Option<Handle> {
    Handle::ORDER.into_iter().find(|handle| {
        let corner = handle.corner_of(rect);
        (x - corner.x).abs() < tolerance && (y - corner.y).abs() < tolerance
    })
}

/// Rectangle spanned by two diagonal points.
pub fn from_two_points(p0: Point, p1: Point) -> Rect {
    Rect::new(
        p0.x.min(p1.x),
        p0.y.min(p1.y),
        (p1.x - p0.x).abs(),
        (p1.y - p0.y).abs(),
    )
}

/// Axis-aligned bounding box of four points.
pub fn from_four_points(points: &[Point; 4]) -> Rect {
    let min_x = points.iter().map(|p| p.x).fold(f64::INFINITY, f64::min);
    let max_x = points.iter().map(|p| p.x).fold(f64::NEG_INFINITY, f64::max);
    let min_y = points.iter().map(|p| p.y).fold(f64::INFINITY, f64::min);
    let max_y = points.iter().map(|p| p.y).fold(f64::NEG_INFINITY, f64::max);
    Rect::new(min_x, min_y, max_x - min_x, max_y - min_y)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Rect {
        Rect::new(100.0, 100.0, 200.0, 100.0)
    }

    #[test]
    fn test_contains_point_inclusive_bounds() {
        let rect = sample();
        assert!(contains_point(&rect, 100.0, 100.0));
        assert!(contains_point(&rect, 300.0, 200.0));
        assert!(!contains_point(&rect, 300.1, 150.0));
        assert!(!contains_point(&rect, 99.9, 150.0));
    }

    #[test]
    fn test_on_edge_respects_span() {
        let rect = sample();
        assert!(on_edge(&rect, 103.0, 150.0, EDGE_TOLERANCE));
        assert!(on_edge(&rect, 200.0, 198.0, EDGE_TOLERANCE));
        // Inside, far from every side
        assert!(!on_edge(&rect, 200.0, 150.0, EDGE_TOLERANCE));
        // Close to the left line but beyond its span
        assert!(!on_edge(&rect, 100.0, 210.0, EDGE_TOLERANCE));
        // Exactly at the tolerance is not a hit
        assert!(!on_edge(&rect, 95.0, 150.0, EDGE_TOLERANCE));
    }

    #[test]
    fn test_resize_handle_order_and_tolerance() {
        let rect = sample();
        assert_eq!(resize_handle_at(&rect, 110.0, 90.0, HANDLE_TOLERANCE), Some(Handle::Nw));
        assert_eq!(resize_handle_at(&rect, 295.0, 105.0, HANDLE_TOLERANCE), Some(Handle::Ne));
        assert_eq!(resize_handle_at(&rect, 101.0, 199.0, HANDLE_TOLERANCE), Some(Handle::Sw));
        assert_eq!(resize_handle_at(&rect, 315.0, 215.0, HANDLE_TOLERANCE), Some(Handle::Se));
        assert_eq!(resize_handle_at(&rect, 200.0, 150.0, HANDLE_TOLERANCE), None);
        assert_eq!(resize_handle_at(&rect, 116.0, 100.0, HANDLE_TOLERANCE), None);
    }

    #[test]
    fn test_overlapping_handles_prefer_nw() {
        let tiny = Rect::new(0.0, 0.0, 4.0, 4.0);
        assert_eq!(resize_handle_at(&tiny, 2.0, 2.0, HANDLE_TOLERANCE), Some(Handle::Nw));
    }

    #[test]
    fn test_drag_handle_keeps_opposite_corner() {
        let rect = sample();
        let moved = Handle::Nw.drag_to(&rect, Point::new(80.0, 90.0));
        assert_eq!(moved, Rect::new(80.0, 90.0, 220.0, 110.0));

        let moved = Handle::Se.drag_to(&rect, Point::new(320.0, 250.0));
        assert_eq!(moved, Rect::new(100.0, 100.0, 220.0, 150.0));

        let moved = Handle::Ne.drag_to(&rect, Point::new(250.0, 50.0));
        assert_eq!(moved, Rect::new(100.0, 50.0, 150.0, 150.0));

        let moved = Handle::Sw.drag_to(&rect, Point::new(150.0, 180.0));
        assert_eq!(moved, Rect::new(150.0, 100.0, 150.0, 80.0));
    }

    #[test]
    fn test_from_two_points_any_diagonal() {
        let rect = from_two_points(Point::new(50.0, 80.0), Point::new(10.0, 10.0));
        assert_eq!(rect, Rect::new(10.0, 10.0, 40.0, 70.0));
    }

    #[test]
    fn test_from_four_points_bounding_box() {
        let points = [
            Point::new(30.0, 5.0),
            Point::new(90.0, 20.0),
            Point::new(70.0, 60.0),
            Point::new(10.0, 40.0),
        ];
        assert_eq!(from_four_points(&points), Rect::new(10.0, 5.0, 80.0, 55.0));
    }
}
