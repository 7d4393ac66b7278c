// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Moving and resizing existing rectangles in Drag mode.
//!
//! Only rectangles whose status does not freeze geometry can be grabbed.
//! Hit testing scans topmost first (reverse list order): handles before
//! edges, and an edge hit inside a handle zone does not count as a move.

use crate::config::GeometryConfig;
use crate::models::annotation::{Point, Rectangle};
use crate::util::geometry::{on_edge, resize_handle_at, Handle};

/// Drag state of the manipulation engine.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum DragState {
    #[default]
    Idle,
    /// Dragging a side; `offset` is press position minus top-left corner
    Moving { index: usize, offset: Point },
    /// Dragging a corner; the opposite corner stays fixed
    Resizing { index: usize, handle: Handle },
}

impl DragState {
    pub fn index(&self) -> Option<usize> {
        match *self {
            DragState::Idle => None,
            DragState::Moving { index, .. } | DragState::Resizing { index, .. } => Some(index),
        }
    }

    pub fn is_active(&self) -> bool {
        !matches!(self, DragState::Idle)
    }
}

/// Cursor to show while hovering in Drag mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CursorHint {
    #[default]
    Default,
    Move,
    ResizeNwSe,
    ResizeNeSw,
}

fn editable(rect: &Rectangle) -> bool {
    !rect.status.freezes_geometry()
}

/// Decide what a press at `pos` grabs.
pub fn begin_drag(rects: &[Rectangle], pos: Point, geometry: &GeometryConfig) -> DragState {
    let topmost = || rects.iter().enumerate().rev().filter(|(_, r)| editable(r));

    for (index, rect) in topmost() {
        if let Some(handle) = resize_handle_at(&rect.rect(), pos.x, pos.y, geometry.handle_tolerance) {
            return DragState::Resizing { index, handle };
        }
    }

    for (index, rect) in topmost() {
        let r = rect.rect();
        if on_edge(&r, pos.x, pos.y, geometry.edge_tolerance)
            && resize_handle_at(&r, pos.x, pos.y, geometry.handle_tolerance).is_none()
        {
            return DragState::Moving {
                index,
                offset: Point::new(pos.x - r.x, pos.y - r.y),
            };
        }
    }

    DragState::Idle
}

/// The dragged rectangle after moving the cursor to `pos`, or `None` when
/// the update must be ignored. Status and original snapshot carry over.
pub fn drag_to(state: &DragState, rect: &Rectangle, pos: Point, min_size: f64) -> Option<Rectangle> {
    let mut updated = rect.clone();
    match *state {
        DragState::Idle => return None,
        DragState::Moving { offset, .. } => {
            updated.x = pos.x - offset.x;
            updated.y = pos.y - offset.y;
        }
        DragState::Resizing { handle, .. } => {
            let resized = handle.drag_to(&rect.rect(), pos);
            if !resized.exceeds(min_size) {
                return None;
            }
            updated.set_rect(resized);
        }
    }
    Some(updated)
}

/// Cursor feedback for an idle pointer, topmost rectangle first. This scan
/// looks at every rectangle regardless of status.
pub fn hover_cursor(rects: &[Rectangle], pos: Point, geometry: &GeometryConfig) -> CursorHint {
    for rect in rects.iter().rev() {
        let r = rect.rect();
        if let Some(handle) = resize_handle_at(&r, pos.x, pos.y, geometry.handle_tolerance) {
            return match handle {
                Handle::Nw | Handle::Se => CursorHint::ResizeNwSe,
                Handle::Ne | Handle::Sw => CursorHint::ResizeNeSw,
            };
        }
        if on_edge(&r, pos.x, pos.y, geometry.edge_tolerance) {
            return CursorHint::Move;
        }
    }
    CursorHint::Default
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::annotation::{Rect, Status};

    fn editable_rect(x: f64, y: f64, w: f64, h: f64) -> Rectangle {
        Rectangle::pinned(Rect::new(x, y, w, h)).with_status(Status::Reject)
    }

    #[test]
    fn test_frozen_statuses_are_not_grabbed() {
        let geometry = GeometryConfig::default();
        let rects = vec![
            Rectangle::new(Rect::new(0.0, 0.0, 100.0, 100.0)),
            Rectangle::new(Rect::new(0.0, 0.0, 100.0, 100.0)).with_status(Status::Attack),
        ];
        assert_eq!(begin_drag(&rects, Point::new(0.0, 0.0), &geometry), DragState::Idle);
        assert_eq!(begin_drag(&rects, Point::new(50.0, 0.0), &geometry), DragState::Idle);
    }

    #[test]
    fn test_handle_beats_edge_and_topmost_wins() {
        let geometry = GeometryConfig::default();
        let rects = vec![
            editable_rect(0.0, 0.0, 100.0, 100.0),
            editable_rect(0.0, 0.0, 100.0, 100.0),
        ];
        assert_eq!(
            begin_drag(&rects, Point::new(99.0, 98.0), &geometry),
            DragState::Resizing { index: 1, handle: Handle::Se }
        );
        assert_eq!(
            begin_drag(&rects, Point::new(50.0, 2.0), &geometry),
            DragState::Moving { index: 1, offset: Point::new(50.0, 2.0) }
        );
    }

    #[test]
    fn test_interior_press_grabs_nothing() {
        let geometry = GeometryConfig::default();
        let rects = vec![editable_rect(0.0, 0.0, 100.0, 100.0)];
        assert_eq!(begin_drag(&rects, Point::new(50.0, 50.0), &geometry), DragState::Idle);
    }

    #[test]
    fn test_move_keeps_size_and_snapshot() {
        let rect = editable_rect(10.0, 10.0, 40.0, 30.0);
        let state = DragState::Moving { index: 0, offset: Point::new(5.0, 0.0) };
        let moved = drag_to(&state, &rect, Point::new(105.0, 50.0), 10.0).unwrap();
        assert_eq!(moved.rect(), Rect::new(100.0, 50.0, 40.0, 30.0));
        assert_eq!(moved.status, Status::Reject);
        assert_eq!(moved.original(), Some(Rect::new(10.0, 10.0, 40.0, 30.0)));
    }

    #[test]
    fn test_resize_rejects_small_results() {
        let rect = editable_rect(10.0, 10.0, 40.0, 30.0);
        let state = DragState::Resizing { index: 0, handle: Handle::Se };
        assert!(drag_to(&state, &rect, Point::new(20.0, 35.0), 10.0).is_none());
        assert!(drag_to(&state, &rect, Point::new(21.0, 21.0), 10.0).is_some());
        // Dragging past the fixed corner flips sign and is ignored
        assert!(drag_to(&state, &rect, Point::new(0.0, 0.0), 10.0).is_none());

        let resized = drag_to(&state, &rect, Point::new(70.0, 60.0), 10.0).unwrap();
        assert_eq!(resized.rect(), Rect::new(10.0, 10.0, 60.0, 50.0));
    }

    #[test]
    fn test_hover_cursor_hints() {
        let geometry = GeometryConfig::default();
        let rects = vec![Rectangle::new(Rect::new(100.0, 100.0, 200.0, 200.0))];
        assert_eq!(hover_cursor(&rects, Point::new(100.0, 100.0), &geometry), CursorHint::ResizeNwSe);
        assert_eq!(hover_cursor(&rects, Point::new(300.0, 100.0), &geometry), CursorHint::ResizeNeSw);
        assert_eq!(hover_cursor(&rects, Point::new(200.0, 102.0), &geometry), CursorHint::Move);
        assert_eq!(hover_cursor(&rects, Point::new(200.0, 200.0), &geometry), CursorHint::Default);
    }
}
