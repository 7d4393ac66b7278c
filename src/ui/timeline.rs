// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Playback controls and frame counters.

/// What the timeline shows.
pub struct TimelineState {
    pub playing: bool,
    pub can_previous: bool,
    pub can_next: bool,
    /// `(screen, local frame, frame count)` per screen
    pub screens: Vec<(usize, usize, usize)>,
    pub total_frames: usize,
}

/// Result of timeline interaction.
pub enum TimelineAction {
    None,
    Previous,
    TogglePlay,
    Next,
    Seek(usize),
}

/// Display the timeline bar.
pub fn show(ui: &mut egui::Ui, state: &TimelineState, seek_target: &mut usize) -> TimelineAction {
    let mut action = TimelineAction::None;

    ui.horizontal(|ui| {
        if ui.add_enabled(state.can_previous, egui::Button::new("⏮ Prev")).clicked() {
            action = TimelineAction::Previous;
        }
        let play_label = if state.playing { "⏹ Stop" } else { "▶ Play" };
        if ui.button(play_label).clicked() {
            action = TimelineAction::TogglePlay;
        }
        if ui.add_enabled(state.can_next, egui::Button::new("Next ⏭")).clicked() {
            action = TimelineAction::Next;
        }

        ui.separator();

        for (screen, local, count) in &state.screens {
            ui.label(format!("Screen {}: {}/{}", screen, local + 1, count));
        }

        if state.total_frames > 0 {
            ui.separator();
            let slider = egui::Slider::new(seek_target, 0..=state.total_frames - 1).text("global frame");
            if ui.add(slider).changed() {
                action = TimelineAction::Seek(*seek_target);
            }
        }
    });

    action
}
