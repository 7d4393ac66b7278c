// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! FRAMEMARK - frame-by-frame rectangle annotation
//!
//! A cross-platform desktop application for marking objects in video
//! frames with rectangles, reviewing them as Hold, Attack or Reject and
//! comparing up to four screens side by side.

mod app;
mod ui;

use anyhow::Result;
use app::FramemarkApp;
use framemark::config::EngineConfig;

fn main() -> Result<()> {
    // Initialize logging
    env_logger::init();

    let config = EngineConfig::from_env();

    // Configure egui options
    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1280.0, 720.0])
            .with_min_inner_size([800.0, 600.0])
            .with_title("FRAMEMARK - Frame Annotation"),
        ..Default::default()
    };

    // Run the application
    eframe::run_native(
        "FRAMEMARK",
        options,
        Box::new(|_cc| Ok(Box::new(FramemarkApp::new(config)))),
    )
    .map_err(|e| anyhow::anyhow!("Application error: {}", e))?;

    Ok(())
}
