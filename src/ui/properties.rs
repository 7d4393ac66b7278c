// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Objects panel.
//!
//! Lists the objects of every screen's current frame with their status
//! toggles. Objects are named `<screen>_<position>`.

use framemark::models::annotation::Status;
use framemark::workspace::ScreenRect;

/// Result of objects panel interaction.
pub enum PropertiesAction {
    None,
    SetStatus {
        screen: usize,
        index: usize,
        status: Status,
    },
}

fn status_color(status: Status) -> egui::Color32 {
    match status {
        Status::Hold => egui::Color32::from_rgb(0, 200, 0),
        Status::Attack => egui::Color32::from_rgb(220, 40, 40),
        Status::Reject => egui::Color32::GRAY,
    }
}

/// Display the objects panel.
pub fn show(ui: &mut egui::Ui, objects: &[ScreenRect]) -> PropertiesAction {
    let mut action = PropertiesAction::None;

    ui.heading("Objects");
    ui.separator();

    if objects.is_empty() {
        ui.label(egui::RichText::new("No objects on this frame").weak());
        return action;
    }

    egui::ScrollArea::vertical().show(ui, |ui| {
        for object in objects {
            let rect = &object.rectangle;
            ui.horizontal(|ui| {
                ui.label(
                    egui::RichText::new(object.label())
                        .strong()
                        .color(status_color(rect.status)),
                );
                for status in Status::ALL {
                    if ui.selectable_label(rect.status == status, status.label()).clicked() {
                        action = PropertiesAction::SetStatus {
                            screen: object.screen,
                            index: object.local_index,
                            status,
                        };
                    }
                }
            });
            let mut details = format!(
                "x {:.0}  y {:.0}  w {:.0}  h {:.0}",
                rect.x, rect.y, rect.w, rect.h
            );
            if !rect.status.is_visible() {
                details.push_str("  (hidden)");
            }
            ui.label(egui::RichText::new(details).small().weak());
            ui.add_space(4.0);
        }
    });

    action
}
