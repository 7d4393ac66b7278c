// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Multi-screen layout.
//!
//! A layout partitions the global frame sequence into up to four screens,
//! each with its own frame count. Screen numbers are 1-based.

use serde::{Deserialize, Serialize};

/// Where a global frame index lands inside the layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameLocation {
    /// 1-based screen number
    pub screen: usize,
    /// Frame index local to that screen
    pub local: usize,
}

/// Per-screen frame counts, in ascending screen order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScreenLayout {
    frame_counts: Vec<usize>,
}

impl ScreenLayout {
    pub fn new(frame_counts: Vec<usize>) -> Self {
        Self { frame_counts }
    }

    pub fn total_frames(&self) -> usize {
        self.frame_counts.iter().sum()
    }

    /// Global index of the first frame of `screen` (sum of earlier counts).
    pub fn start_index(&self, screen: usize) -> usize {
        let earlier = screen.saturating_sub(1).min(self.frame_counts.len());
        self.frame_counts[..earlier].iter().sum()
    }

    /// Decompose a global index: the first screen whose cumulative frame
    /// count exceeds `global` owns it. `None` past the last frame.
    pub fn locate(&self, global: usize) -> Option<FrameLocation> {
        let mut accumulated = 0;
        for (i, &count) in self.frame_counts.iter().enumerate() {
            if global < accumulated + count {
                return Some(FrameLocation {
                    screen: i + 1,
                    local: global - accumulated,
                });
            }
            accumulated += count;
        }
        None
    }
}

/// Recover a screen number from a `Screen_<n>_...` file name.
pub fn screen_number_from_file_name(file_name: &str) -> Option<usize> {
    let start = file_name.find("Screen_")? + "Screen_".len();
    let rest = &file_name[start..];
    let digits_end = rest.find(|c: char| !c.is_ascii_digit())?;
    if digits_end == 0 || !rest[digits_end..].starts_with('_') {
        return None;
    }
    rest[..digits_end].parse().ok()
}
