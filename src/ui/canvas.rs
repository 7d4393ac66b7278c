// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Drawing canvas for one screen.
//!
//! Displays the screen's current frame scaled to fit, replays the render
//! policy's draw list on top of it and reports pointer input in frame
//! pixel coordinates.

use framemark::models::annotation::Point;
use framemark::render::{Color, DrawOp};
use framemark::tool::PointerButton;

/// Pointer input captured on the canvas during this frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CanvasAction {
    PointerDown(PointerButton, Point),
    PointerMove(Point),
    PointerUp,
    /// Pointer is over the frame without moving
    Hover(Point),
}

/// Frame-to-screen mapping of a displayed frame.
#[derive(Debug, Clone, Copy)]
struct FrameTransform {
    image_rect: egui::Rect,
    scale: f32,
}

impl FrameTransform {
    fn to_screen(&self, p: Point) -> egui::Pos2 {
        self.image_rect.min + egui::vec2(p.x as f32 * self.scale, p.y as f32 * self.scale)
    }

    fn to_frame(&self, pos: egui::Pos2) -> Point {
        let rel = (pos - self.image_rect.min) / self.scale;
        Point::new(rel.x as f64, rel.y as f64)
    }

    fn length(&self, v: f64) -> f32 {
        v as f32 * self.scale
    }
}

fn color32(c: Color) -> egui::Color32 {
    egui::Color32::from_rgba_unmultiplied(c.r, c.g, c.b, c.a)
}

/// Display one screen and collect its pointer input.
pub fn show(
    ui: &mut egui::Ui,
    screen: usize,
    texture: Option<&egui::TextureHandle>,
    frame_size: Option<(u32, u32)>,
    ops: &[DrawOp],
) -> Vec<CanvasAction> {
    let mut actions = Vec::new();
    ui.style_mut().visuals.extreme_bg_color = egui::Color32::from_gray(40);
    let available_size = ui.available_size();

    egui::Frame::canvas(ui.style()).show(ui, |ui| {
        ui.set_min_size(available_size);

        let (Some(texture), Some((img_width, img_height))) = (texture, frame_size) else {
            ui.centered_and_justified(|ui| {
                ui.label(
                    egui::RichText::new(format!("Screen {}: loading frame...", screen))
                        .color(egui::Color32::from_gray(180)),
                );
            });
            return;
        };

        // Fit the frame into the available space, keeping aspect ratio
        let available = ui.available_size();
        let scale = (available.x / img_width as f32).min(available.y / img_height as f32);
        let display = egui::vec2(img_width as f32 * scale, img_height as f32 * scale);
        let offset = (available - display) / 2.0;
        let image_rect = egui::Rect::from_min_size(ui.min_rect().min + offset, display);
        let transform = FrameTransform { image_rect, scale };

        let response = ui.allocate_rect(image_rect, egui::Sense::click_and_drag());
        ui.painter().image(
            texture.id(),
            image_rect,
            egui::Rect::from_min_max(egui::pos2(0.0, 0.0), egui::pos2(1.0, 1.0)),
            egui::Color32::WHITE,
        );

        let painter = ui.painter_at(image_rect);
        for op in ops {
            paint(&painter, &transform, op);
        }

        collect_input(ui, &response, &transform, &mut actions);
    });

    actions
}

fn collect_input(
    ui: &egui::Ui,
    response: &egui::Response,
    transform: &FrameTransform,
    actions: &mut Vec<CanvasAction>,
) {
    let (pointer_pos, moving, primary_down, secondary_down, primary_up) = ui.input(|i| {
        (
            i.pointer.interact_pos(),
            i.pointer.is_moving(),
            i.pointer.button_pressed(egui::PointerButton::Primary),
            i.pointer.button_pressed(egui::PointerButton::Secondary),
            i.pointer.button_released(egui::PointerButton::Primary),
        )
    });

    let Some(pos) = pointer_pos else {
        return;
    };
    let point = transform.to_frame(pos);
    let over = response.hovered();
    let dragging = response.dragged();

    if over && primary_down {
        actions.push(CanvasAction::PointerDown(PointerButton::Primary, point));
    }
    if over && secondary_down {
        actions.push(CanvasAction::PointerDown(PointerButton::Secondary, point));
    }
    if (over || dragging) && moving {
        actions.push(CanvasAction::PointerMove(point));
    } else if over {
        actions.push(CanvasAction::Hover(point));
    }
    if primary_up {
        actions.push(CanvasAction::PointerUp);
    }
}

fn paint(painter: &egui::Painter, t: &FrameTransform, op: &DrawOp) {
    match op {
        DrawOp::StrokeRect { rect, color, width } => {
            let min = t.to_screen(Point::new(rect.x, rect.y));
            let size = egui::vec2(t.length(rect.w), t.length(rect.h));
            painter.rect_stroke(
                egui::Rect::from_min_size(min, size),
                0.0,
                egui::Stroke::new(*width as f32, color32(*color)),
            );
        }
        DrawOp::FillRect { rect, color } => {
            let min = t.to_screen(Point::new(rect.x, rect.y));
            let size = egui::vec2(t.length(rect.w), t.length(rect.h));
            painter.rect_filled(egui::Rect::from_min_size(min, size), 0.0, color32(*color));
        }
        DrawOp::Line { from, to, color, width } => {
            painter.line_segment(
                [t.to_screen(*from), t.to_screen(*to)],
                egui::Stroke::new(*width as f32, color32(*color)),
            );
        }
        DrawOp::DashedPolyline { points, color, width, dash, gap } => {
            let path: Vec<egui::Pos2> = points.iter().map(|p| t.to_screen(*p)).collect();
            painter.extend(egui::Shape::dashed_line(
                &path,
                egui::Stroke::new(*width as f32, color32(*color)),
                *dash as f32,
                *gap as f32,
            ));
        }
        DrawOp::Circle { center, radius, fill, outline } => {
            let c = t.to_screen(*center);
            painter.circle(
                c,
                *radius as f32,
                color32(*fill),
                egui::Stroke::new(1.0, color32(*outline)),
            );
        }
        DrawOp::Label {
            anchor,
            text,
            font_size,
            height,
            padding,
            text_color,
            background,
        } => {
            let galley = painter.layout_no_wrap(
                text.clone(),
                egui::FontId::proportional(*font_size as f32),
                color32(*text_color),
            );
            let bottom_left = t.to_screen(*anchor);
            let (height, padding) = (*height as f32, *padding as f32);
            let strip = egui::Rect::from_min_size(
                bottom_left - egui::vec2(0.0, height),
                egui::vec2(galley.size().x + padding * 2.0, height),
            );
            painter.rect_filled(strip, 0.0, color32(*background));
            let text_pos = strip.min + egui::vec2(padding, (height - galley.size().y) / 2.0);
            painter.galley(text_pos, galley, color32(*text_color));
        }
    }
}
