// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Toolbar and creation mode selection.

use framemark::tool::construction::CreationMode;

/// Display the toolbar. Returns the newly chosen mode, if any.
pub fn show(ui: &mut egui::Ui, current_mode: CreationMode, collected: usize) -> Option<CreationMode> {
    let mut chosen = None;

    ui.horizontal(|ui| {
        ui.spacing_mut().item_spacing.x = 8.0;

        ui.label("Mode:");

        ui.separator();

        for mode in [CreationMode::Drag, CreationMode::TwoPoint, CreationMode::FourPoint] {
            if ui.selectable_label(current_mode == mode, mode.label()).clicked() && current_mode != mode {
                chosen = Some(mode);
            }
        }

        ui.separator();

        let hint = match current_mode {
            CreationMode::Drag => "Drag edges to move, corners to resize; right-click deletes".to_string(),
            CreationMode::TwoPoint => format!("Click two opposite corners ({}/2)", collected),
            CreationMode::FourPoint => format!("Click four corners ({}/4); right-click cancels", collected),
        };

        ui.label(egui::RichText::new(hint).italics().weak());
    });

    chosen
}
