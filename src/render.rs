// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Render policy.
//!
//! Maps a frame's rectangles plus the current interaction state to an
//! ordered list of draw primitives in frame pixel coordinates. Nothing here
//! touches a drawing surface; the canvas replays the list.

use crate::models::annotation::{Point, Rect, Rectangle, Status};
use crate::tool::InteractionState;
use crate::util::geometry::Handle;

/// Side length of a resize handle square.
pub const HANDLE_SIZE: f64 = 8.0;

/// Label font size in pixels.
pub const LABEL_FONT_SIZE: f64 = 14.0;
/// Height of the label background strip.
pub const LABEL_HEIGHT: f64 = 18.0;
/// Horizontal padding around label text.
pub const LABEL_PADDING: f64 = 4.0;

/// Radius of collected point markers.
pub const POINT_RADIUS: f64 = 6.0;

/// RGBA colour, 8 bits per channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub const GREEN: Color = Color::rgb(0, 255, 0);
    pub const RED: Color = Color::rgb(255, 0, 0);
    pub const YELLOW: Color = Color::rgb(255, 255, 0);
    pub const CYAN: Color = Color::rgb(0, 255, 255);
    pub const BLACK: Color = Color::rgb(0, 0, 0);
    pub const WHITE: Color = Color::rgb(255, 255, 255);
    pub const LABEL_BACKGROUND: Color = Color::rgba(0, 0, 0, 178);
}

/// A single drawing instruction.
#[derive(Debug, Clone, PartialEq)]
pub enum DrawOp {
    StrokeRect {
        rect: Rect,
        color: Color,
        width: f64,
    },
    FillRect {
        rect: Rect,
        color: Color,
    },
    Line {
        from: Point,
        to: Point,
        color: Color,
        width: f64,
    },
    DashedPolyline {
        points: Vec<Point>,
        color: Color,
        width: f64,
        dash: f64,
        gap: f64,
    },
    Circle {
        center: Point,
        radius: f64,
        fill: Color,
        outline: Color,
    },
    /// Text on a background strip whose bottom-left corner is `anchor`.
    /// The strip is as wide as the text plus padding on both sides.
    Label {
        anchor: Point,
        text: String,
        font_size: f64,
        height: f64,
        padding: f64,
        text_color: Color,
        background: Color,
    },
}

/// Per-status drawing style. `None` from [`status_style`] means the
/// rectangle is not drawn at all.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StatusStyle {
    pub color: Color,
    pub width: f64,
    pub cross: bool,
    pub handles: bool,
}

pub fn status_style(status: Status) -> Option<StatusStyle> {
    match status {
        Status::Hold => Some(StatusStyle {
            color: Color::GREEN,
            width: 2.0,
            cross: false,
            handles: false,
        }),
        Status::Attack => Some(StatusStyle {
            color: Color::RED,
            width: 3.0,
            cross: true,
            handles: false,
        }),
        Status::Reject => None,
    }
}

fn drawable(rect: &Rect) -> bool {
    rect.x >= 0.0 && rect.y >= 0.0 && rect.w > 0.0 && rect.h > 0.0
}

/// Build the draw list for one screen's current frame.
///
/// `labels[i]` is the caption of `rects[i]`; missing entries draw no label.
pub fn draw_list(
    rects: &[Rectangle],
    labels: &[String],
    selection: Option<usize>,
    interaction: &InteractionState,
) -> Vec<DrawOp> {
    let mut ops = Vec::new();

    for (index, rectangle) in rects.iter().enumerate() {
        let Some(style) = status_style(rectangle.status) else {
            continue;
        };
        let rect = rectangle.rect();
        if !drawable(&rect) {
            continue;
        }

        ops.push(DrawOp::StrokeRect {
            rect,
            color: style.color,
            width: style.width,
        });

        if style.cross {
            push_cross(&mut ops, &rect, style.color);
        }

        if style.handles && selection == Some(index) {
            push_handles(&mut ops, &rect, style.color);
        }

        if let Some(text) = labels.get(index) {
            ops.push(DrawOp::Label {
                anchor: rect.top_left(),
                text: text.clone(),
                font_size: LABEL_FONT_SIZE,
                height: LABEL_HEIGHT,
                padding: LABEL_PADDING,
                text_color: Color::WHITE,
                background: Color::LABEL_BACKGROUND,
            });
        }
    }

    if let InteractionState::Collecting { points, hover } = interaction {
        push_point_preview(&mut ops, points, *hover);
    }

    ops
}

fn push_cross(ops: &mut Vec<DrawOp>, rect: &Rect, color: Color) {
    ops.push(DrawOp::Line {
        from: Point::new(rect.x, rect.y),
        to: Point::new(rect.right(), rect.bottom()),
        color,
        width: 2.0,
    });
    ops.push(DrawOp::Line {
        from: Point::new(rect.right(), rect.y),
        to: Point::new(rect.x, rect.bottom()),
        color,
        width: 2.0,
    });
}

fn push_handles(ops: &mut Vec<DrawOp>, rect: &Rect, color: Color) {
    let half = HANDLE_SIZE / 2.0;
    for handle in Handle::ORDER {
        let corner = handle.corner_of(rect);
        ops.push(DrawOp::FillRect {
            rect: Rect::new(corner.x - half, corner.y - half, HANDLE_SIZE, HANDLE_SIZE),
            color,
        });
    }
}

fn push_point_preview(ops: &mut Vec<DrawOp>, points: &[Point], hover: Option<Point>) {
    if points.len() >= 2 {
        let mut path = points.to_vec();
        path.extend(hover);
        ops.push(DrawOp::DashedPolyline {
            points: path,
            color: Color::YELLOW,
            width: 2.0,
            dash: 5.0,
            gap: 5.0,
        });
    }

    let last = points.len().saturating_sub(1);
    for (i, point) in points.iter().enumerate() {
        ops.push(DrawOp::Circle {
            center: *point,
            radius: POINT_RADIUS,
            fill: if i == last { Color::RED } else { Color::YELLOW },
            outline: Color::BLACK,
        });
    }

    if let Some(hover) = hover {
        ops.push(DrawOp::Circle {
            center: hover,
            radius: POINT_RADIUS,
            fill: Color::CYAN,
            outline: Color::BLACK,
        });
    }
}
