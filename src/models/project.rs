// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Project state management.
//!
//! A project is one media source (video frames or still images) together
//! with its annotation map. Multi-screen sessions are a set of projects,
//! one per screen.

use super::annotation::FrameAnnotations;
use super::layout::screen_number_from_file_name;
use serde::{Deserialize, Serialize};

/// Complete project data for serialization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectData {
    pub id: String,
    pub media_file: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub screen: Option<usize>,
    #[serde(default)]
    pub frame_width: u32,
    #[serde(default)]
    pub frame_height: u32,
    /// Frame image paths in frame-index order
    #[serde(default)]
    pub frames: Vec<String>,
    #[serde(default)]
    pub annotations: FrameAnnotations,
    /// Annotation key of local frame 0; derived from the keys when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frame_offset: Option<i64>,
}

impl ProjectData {
    /// Create a new project with the given media file and dimensions.
    pub fn new(media_file: String, frame_width: u32, frame_height: u32) -> Self {
        Self {
            id: project_id(&media_file),
            media_file,
            screen: None,
            frame_width,
            frame_height,
            frames: Vec::new(),
            annotations: FrameAnnotations::new(),
            frame_offset: None,
        }
    }

    /// Screen this project belongs to, falling back to the file name.
    pub fn screen_number(&self) -> Option<usize> {
        self.screen
            .or_else(|| screen_number_from_file_name(&self.media_file))
    }
}

/// Stable project id derived from a media path.
pub fn project_id(media_file: &str) -> String {
    let stem = std::path::Path::new(media_file)
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| media_file.to_string());

    let cleaned: String = stem
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect();

    if cleaned.is_empty() {
        "project".to_string()
    } else {
        cleaned
    }
}
