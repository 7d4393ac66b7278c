// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Interactive rectangle tool.
//!
//! [`RectangleTool`] turns pointer input on one screen into proposed frame
//! lists. It never mutates annotations itself: every change is returned as
//! a [`ToolEvent`] carrying the complete new list, which the caller commits
//! through the annotation store.

pub mod construction;
pub mod manipulation;

use crate::config::GeometryConfig;
use crate::models::annotation::{Point, Rectangle};
use crate::util::geometry::{contains_point, Handle};
use construction::{CollectOutcome, CreationMode, PointCollector};
use manipulation::{begin_drag, drag_to, hover_cursor, CursorHint, DragState};

/// Mouse buttons the tool reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerButton {
    Primary,
    Secondary,
}

/// What the caller should do after feeding an event to the tool.
#[derive(Debug, Clone, PartialEq)]
pub enum ToolEvent {
    Nothing,
    /// Store this list for the current frame
    Commit(Vec<Rectangle>),
    /// Store this list; a rectangle was appended and the mode is back to Drag
    Created(Vec<Rectangle>),
}

impl ToolEvent {
    pub fn rectangles(&self) -> Option<&[Rectangle]> {
        match self {
            ToolEvent::Nothing => None,
            ToolEvent::Commit(rects) | ToolEvent::Created(rects) => Some(rects),
        }
    }
}

/// Snapshot of the in-progress interaction, read by the render policy.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum InteractionState {
    #[default]
    Idle,
    Collecting { points: Vec<Point>, hover: Option<Point> },
    Moving { index: usize },
    Resizing { index: usize, handle: Handle },
}

/// Pointer state machine for one screen.
#[derive(Debug, Clone, Default)]
pub struct RectangleTool {
    mode: CreationMode,
    collector: PointCollector,
    drag: DragState,
    selection: Option<usize>,
    geometry: GeometryConfig,
}

impl RectangleTool {
    pub fn new(geometry: GeometryConfig) -> Self {
        Self {
            geometry,
            ..Self::default()
        }
    }

    pub fn mode(&self) -> CreationMode {
        self.mode
    }

    /// Switch creation mode. Switching to Drag drops collected points.
    pub fn set_mode(&mut self, mode: CreationMode) {
        if mode == CreationMode::Drag && self.collector.reset() {
            log::debug!("Point collection cancelled by mode switch");
        }
        self.drag = DragState::Idle;
        self.mode = mode;
    }

    pub fn selection(&self) -> Option<usize> {
        self.selection
    }

    pub fn clear_selection(&mut self) {
        self.selection = None;
    }

    /// Drop a selection that no longer points into a list of `len` items.
    pub fn clamp_selection(&mut self, len: usize) {
        if self.selection.is_some_and(|i| i >= len) {
            self.selection = None;
        }
    }

    pub fn points(&self) -> &[Point] {
        self.collector.points()
    }

    /// Forget every transient state, e.g. on frame change.
    pub fn cancel(&mut self) {
        self.collector.reset();
        self.drag = DragState::Idle;
        self.selection = None;
    }

    pub fn interaction_state(&self) -> InteractionState {
        if self.collector.is_collecting() {
            return InteractionState::Collecting {
                points: self.collector.points().to_vec(),
                hover: self.collector.hover(),
            };
        }
        match self.drag {
            DragState::Idle => InteractionState::Idle,
            DragState::Moving { index, .. } => InteractionState::Moving { index },
            DragState::Resizing { index, handle } => InteractionState::Resizing { index, handle },
        }
    }

    pub fn pointer_down(&mut self, button: PointerButton, pos: Point, rects: &[Rectangle]) -> ToolEvent {
        match button {
            PointerButton::Secondary => self.secondary_click(pos, rects),
            PointerButton::Primary => match self.mode {
                CreationMode::Drag => {
                    self.drag = begin_drag(rects, pos, &self.geometry);
                    self.selection = self.drag.index();
                    ToolEvent::Nothing
                }
                mode => self.collect(mode, pos, rects),
            },
        }
    }

    fn secondary_click(&mut self, pos: Point, rects: &[Rectangle]) -> ToolEvent {
        if self.collector.reset() {
            log::debug!("Point collection cancelled");
            return ToolEvent::Nothing;
        }

        let Some(index) = rects
            .iter()
            .position(|r| contains_point(&r.rect(), pos.x, pos.y))
        else {
            return ToolEvent::Nothing;
        };

        let mut remaining = rects.to_vec();
        remaining.remove(index);
        self.selection = None;
        log::debug!("Deleted object {} by right-click", index + 1);
        ToolEvent::Commit(remaining)
    }

    fn collect(&mut self, mode: CreationMode, pos: Point, rects: &[Rectangle]) -> ToolEvent {
        match self.collector.push(mode, pos, self.geometry.min_size) {
            CollectOutcome::Created(rect) => {
                let mut updated = rects.to_vec();
                updated.push(Rectangle::new(rect));
                self.mode = CreationMode::Drag;
                ToolEvent::Created(updated)
            }
            CollectOutcome::Ignored | CollectOutcome::Collecting(_) | CollectOutcome::Rejected(_) => {
                ToolEvent::Nothing
            }
        }
    }

    pub fn pointer_move(&mut self, pos: Point, rects: &[Rectangle]) -> ToolEvent {
        self.collector.set_hover(pos);

        let Some(index) = self.drag.index() else {
            return ToolEvent::Nothing;
        };
        let Some(current) = rects.get(index) else {
            self.drag = DragState::Idle;
            return ToolEvent::Nothing;
        };

        match drag_to(&self.drag, current, pos, self.geometry.min_size) {
            Some(updated) => {
                let mut list = rects.to_vec();
                list[index] = updated;
                ToolEvent::Commit(list)
            }
            None => ToolEvent::Nothing,
        }
    }

    /// End any drag. Point collection survives a release.
    pub fn pointer_up(&mut self) {
        self.drag = DragState::Idle;
    }

    /// Remove the selected rectangle, if any.
    pub fn delete_selected(&mut self, rects: &[Rectangle]) -> ToolEvent {
        let Some(index) = self.selection.take() else {
            return ToolEvent::Nothing;
        };
        if index >= rects.len() {
            return ToolEvent::Nothing;
        }
        let mut remaining = rects.to_vec();
        remaining.remove(index);
        ToolEvent::Commit(remaining)
    }

    /// Cursor feedback while hovering in Drag mode with no drag active.
    pub fn hover_cursor(&self, pos: Point, rects: &[Rectangle]) -> CursorHint {
        if self.mode != CreationMode::Drag || self.drag.is_active() {
            return CursorHint::Default;
        }
        hover_cursor(rects, pos, &self.geometry)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::annotation::{Rect, Status};

    fn tool() -> RectangleTool {
        RectangleTool::new(GeometryConfig::default())
    }

    fn click(tool: &mut RectangleTool, x: f64, y: f64, rects: &[Rectangle]) -> ToolEvent {
        tool.pointer_down(PointerButton::Primary, Point::new(x, y), rects)
    }

    #[test]
    fn test_two_point_creates_hold_and_reverts_mode() {
        let mut tool = tool();
        tool.set_mode(CreationMode::TwoPoint);
        assert_eq!(click(&mut tool, 10.0, 10.0, &[]), ToolEvent::Nothing);
        let event = click(&mut tool, 50.0, 80.0, &[]);

        let rects = event.rectangles().unwrap();
        assert!(matches!(event, ToolEvent::Created(_)));
        assert_eq!(rects.len(), 1);
        assert_eq!(rects[0].rect(), Rect::new(10.0, 10.0, 40.0, 70.0));
        assert_eq!(rects[0].status, Status::Hold);
        assert_eq!(tool.mode(), CreationMode::Drag);
    }

    #[test]
    fn test_small_rectangle_keeps_mode() {
        let mut tool = tool();
        tool.set_mode(CreationMode::TwoPoint);
        click(&mut tool, 10.0, 10.0, &[]);
        assert_eq!(click(&mut tool, 15.0, 100.0, &[]), ToolEvent::Nothing);
        assert_eq!(tool.mode(), CreationMode::TwoPoint);
        assert!(tool.points().is_empty());
    }

    #[test]
    fn test_right_click_cancels_collection_first() {
        let mut tool = tool();
        let rects = vec![Rectangle::new(Rect::new(0.0, 0.0, 100.0, 100.0))];
        tool.set_mode(CreationMode::FourPoint);
        click(&mut tool, 10.0, 10.0, &rects);

        let event = tool.pointer_down(PointerButton::Secondary, Point::new(50.0, 50.0), &rects);
        assert_eq!(event, ToolEvent::Nothing);
        assert!(tool.points().is_empty());

        let event = tool.pointer_down(PointerButton::Secondary, Point::new(50.0, 50.0), &rects);
        assert_eq!(event, ToolEvent::Commit(vec![]));
    }

    #[test]
    fn test_right_click_deletes_first_in_list_order() {
        let mut tool = tool();
        let rects = vec![
            Rectangle::new(Rect::new(0.0, 0.0, 100.0, 100.0)),
            Rectangle::new(Rect::new(20.0, 20.0, 50.0, 50.0)),
        ];
        let event = tool.pointer_down(PointerButton::Secondary, Point::new(30.0, 30.0), &rects);
        let remaining = event.rectangles().unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].x, 20.0);
    }

    #[test]
    fn test_mouse_up_keeps_points_but_drag_mode_resets() {
        let mut tool = tool();
        tool.set_mode(CreationMode::FourPoint);
        click(&mut tool, 10.0, 10.0, &[]);
        tool.pointer_up();
        assert_eq!(tool.points().len(), 1);

        tool.pointer_move(Point::new(30.0, 40.0), &[]);
        assert_eq!(
            tool.interaction_state(),
            InteractionState::Collecting {
                points: vec![Point::new(10.0, 10.0)],
                hover: Some(Point::new(30.0, 40.0)),
            }
        );

        tool.set_mode(CreationMode::Drag);
        assert_eq!(tool.interaction_state(), InteractionState::Idle);
    }

    #[test]
    fn test_drag_moves_editable_rectangle() {
        let mut tool = tool();
        let rects = vec![Rectangle::pinned(Rect::new(10.0, 10.0, 50.0, 50.0)).with_status(Status::Reject)];
        click(&mut tool, 30.0, 11.0, &rects);
        assert_eq!(tool.selection(), Some(0));
        assert_eq!(tool.interaction_state(), InteractionState::Moving { index: 0 });

        let event = tool.pointer_move(Point::new(40.0, 21.0), &rects);
        let moved = &event.rectangles().unwrap()[0];
        assert_eq!(moved.rect(), Rect::new(20.0, 20.0, 50.0, 50.0));
        assert_eq!(moved.status, Status::Reject);

        tool.pointer_up();
        assert_eq!(tool.pointer_move(Point::new(90.0, 90.0), &rects), ToolEvent::Nothing);
    }

    #[test]
    fn test_drag_on_frozen_clears_selection() {
        let mut tool = tool();
        let rects = vec![Rectangle::new(Rect::new(10.0, 10.0, 50.0, 50.0))];
        click(&mut tool, 30.0, 11.0, &rects);
        assert_eq!(tool.selection(), None);
        assert_eq!(tool.pointer_move(Point::new(40.0, 21.0), &rects), ToolEvent::Nothing);
    }

    #[test]
    fn test_delete_selected() {
        let mut tool = tool();
        let rects = vec![
            Rectangle::new(Rect::new(200.0, 200.0, 50.0, 50.0)),
            Rectangle::pinned(Rect::new(10.0, 10.0, 50.0, 50.0)).with_status(Status::Reject),
        ];
        click(&mut tool, 10.0, 10.0, &rects);
        assert_eq!(tool.selection(), Some(1));
        tool.pointer_up();

        let event = tool.delete_selected(&rects);
        assert_eq!(event.rectangles().unwrap().len(), 1);
        assert_eq!(tool.selection(), None);
        assert_eq!(tool.delete_selected(&rects), ToolEvent::Nothing);
    }

    #[test]
    fn test_clamp_selection() {
        let mut tool = tool();
        let rects = vec![Rectangle::pinned(Rect::new(10.0, 10.0, 50.0, 50.0)).with_status(Status::Reject)];
        click(&mut tool, 10.0, 10.0, &rects);
        tool.clamp_selection(1);
        assert_eq!(tool.selection(), Some(0));
        tool.clamp_selection(0);
        assert_eq!(tool.selection(), None);
    }

    #[test]
    fn test_hover_cursor_only_in_drag_mode() {
        let mut tool = tool();
        let rects = vec![Rectangle::new(Rect::new(10.0, 10.0, 50.0, 50.0))];
        assert_eq!(tool.hover_cursor(Point::new(10.0, 10.0), &rects), CursorHint::ResizeNwSe);
        tool.set_mode(CreationMode::TwoPoint);
        assert_eq!(tool.hover_cursor(Point::new(10.0, 10.0), &rects), CursorHint::Default);
    }
}
