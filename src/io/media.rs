// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Frame image loading.
//!
//! Frames arrive as still images, either picked individually or as a
//! folder of extracted video frames. This module orders them into a frame
//! sequence and decodes single frames to RGBA for display and detection.

use crate::error::{MediaError, MediaResult};
use crate::models::project::ProjectData;
use std::path::{Path, PathBuf};

/// Extensions accepted as frame images.
pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "bmp", "tiff", "tif"];

/// A decoded frame, RGBA8 row-major.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameImage {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
}

impl FrameImage {
    /// An all-black frame.
    pub fn blank(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            pixels: vec![0; width as usize * height as usize * 4],
        }
    }

    pub fn size(&self) -> [usize; 2] {
        [self.width as usize, self.height as usize]
    }
}

/// Load an image file as RGBA.
pub fn load_image(path: &Path) -> MediaResult<FrameImage> {
    let img = image::open(path).map_err(|source| MediaError::Decode {
        path: path.display().to_string(),
        source,
    })?;
    let rgba = img.to_rgba8();
    Ok(FrameImage {
        width: rgba.width(),
        height: rgba.height(),
        pixels: rgba.into_raw(),
    })
}

pub fn is_image_file(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| IMAGE_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

/// Sort key placing `frame_2` before `frame_10`.
fn frame_order_key(path: &Path) -> (String, u64, String) {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let prefix = stem.trim_end_matches(|c: char| c.is_ascii_digit());
    let number = stem[prefix.len()..].parse().unwrap_or(0);
    (prefix.to_string(), number, stem.clone())
}

/// Keep image files and order them as a frame sequence.
pub fn frame_sequence(paths: Vec<PathBuf>) -> MediaResult<Vec<PathBuf>> {
    let mut frames: Vec<PathBuf> = paths.into_iter().filter(|p| is_image_file(p)).collect();
    if frames.is_empty() {
        return Err(MediaError::Empty);
    }
    frames.sort_by_cached_key(|p| frame_order_key(p));
    Ok(frames)
}

/// Every frame image inside a directory, in sequence order.
pub fn frames_in_dir(dir: &Path) -> MediaResult<Vec<PathBuf>> {
    let entries = std::fs::read_dir(dir).map_err(|source| MediaError::Io {
        path: dir.display().to_string(),
        source,
    })?;
    let paths = entries.filter_map(|e| e.ok().map(|e| e.path())).collect();
    frame_sequence(paths)
}

/// Build a new project from a frame sequence. The first frame is decoded
/// for the frame size and returned for display.
pub fn open_frames(paths: Vec<PathBuf>) -> MediaResult<(ProjectData, FrameImage)> {
    let frames = frame_sequence(paths)?;
    let first = load_image(&frames[0])?;

    let mut project = ProjectData::new(
        frames[0].to_string_lossy().into_owned(),
        first.width,
        first.height,
    );
    project.frames = frames
        .iter()
        .map(|p| p.to_string_lossy().into_owned())
        .collect();
    project.screen = project.screen_number();

    log::info!(
        "Opened {} frames ({}x{}) starting at {}",
        project.frames.len(),
        first.width,
        first.height,
        project.media_file
    );
    Ok((project, first))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_png(dir: &Path, name: &str, w: u32, h: u32) -> PathBuf {
        let path = dir.join(name);
        image::RgbaImage::new(w, h).save(&path).unwrap();
        path
    }

    #[test]
    fn test_load_image_rgba() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_png(dir.path(), "f.png", 4, 3);
        let frame = load_image(&path).unwrap();
        assert_eq!((frame.width, frame.height), (4, 3));
        assert_eq!(frame.pixels.len(), 48);
    }

    #[test]
    fn test_decode_failure() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.png");
        std::fs::write(&path, b"not an image").unwrap();
        assert!(matches!(load_image(&path), Err(MediaError::Decode { .. })));
    }

    #[test]
    fn test_frame_sequence_order_and_filter() {
        let paths = vec![
            PathBuf::from("clip/frame_10.png"),
            PathBuf::from("clip/frame_2.PNG"),
            PathBuf::from("clip/notes.txt"),
            PathBuf::from("clip/frame_1.jpg"),
        ];
        let frames = frame_sequence(paths).unwrap();
        let names: Vec<_> = frames.iter().map(|p| p.file_name().unwrap().to_str().unwrap()).collect();
        assert_eq!(names, vec!["frame_1.jpg", "frame_2.PNG", "frame_10.png"]);

        assert!(matches!(frame_sequence(vec![]), Err(MediaError::Empty)));
    }

    #[test]
    fn test_open_frames_builds_project() {
        let dir = tempfile::tempdir().unwrap();
        write_png(dir.path(), "Screen_3_cam_1.png", 8, 6);
        write_png(dir.path(), "Screen_3_cam_2.png", 8, 6);

        let (project, first) = open_frames(frames_in_dir(dir.path()).unwrap()).unwrap();
        assert_eq!(project.frames.len(), 2);
        assert_eq!((project.frame_width, project.frame_height), (8, 6));
        assert_eq!(project.screen, Some(3));
        assert_eq!(first.size(), [8, 6]);
    }
}
