// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Annotation and project serialization.
//!
//! The annotation export format is pretty-printed JSON of the form
//! `{"frames": {"<frameIndex>": [{x, y, w, h, status, originalX, ...}]}}`,
//! with a YAML equivalent.

use crate::error::{StorageError, StorageResult};
use crate::models::annotation::FrameAnnotations;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::Path;

/// File encodings chosen by extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Json,
    Yaml,
}

impl Format {
    pub fn from_path(path: &Path) -> StorageResult<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();
        match ext.as_str() {
            "json" => Ok(Format::Json),
            "yaml" | "yml" => Ok(Format::Yaml),
            _ => Err(StorageError::UnsupportedFormat(ext)),
        }
    }
}

fn encode<T: Serialize>(value: &T, format: Format) -> StorageResult<String> {
    Ok(match format {
        Format::Json => serde_json::to_string_pretty(value)?,
        Format::Yaml => serde_yaml::to_string(value)?,
    })
}

fn decode<T: DeserializeOwned>(text: &str, format: Format) -> StorageResult<T> {
    Ok(match format {
        Format::Json => serde_json::from_str(text)?,
        Format::Yaml => serde_yaml::from_str(text)?,
    })
}

fn write_file<T: Serialize>(value: &T, path: &Path) -> StorageResult<()> {
    let text = encode(value, Format::from_path(path)?)?;
    std::fs::write(path, text)?;
    Ok(())
}

fn read_file<T: DeserializeOwned>(path: &Path) -> StorageResult<T> {
    let format = Format::from_path(path)?;
    let text = std::fs::read_to_string(path)?;
    decode(&text, format)
}

/// Export annotations to JSON or YAML depending on the file extension.
pub fn export_annotations(annotations: &FrameAnnotations, path: &Path) -> StorageResult<()> {
    write_file(annotations, path)?;
    log::info!(
        "Exported {} rectangles over {} frames to {}",
        annotations.rectangle_count(),
        annotations.frames.len(),
        path.display()
    );
    Ok(())
}

/// Import annotations previously written by [`export_annotations`].
pub fn import_annotations(path: &Path) -> StorageResult<FrameAnnotations> {
    read_file(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::annotation::{Rect, Rectangle, Status};

    fn sample() -> FrameAnnotations {
        let mut map = FrameAnnotations::new();
        map.frames.insert(
            "0".into(),
            vec![
                Rectangle::new(Rect::new(10.0, 10.0, 40.0, 70.0)),
                Rectangle::pinned(Rect::new(1.0, 2.0, 30.0, 40.0)).with_status(Status::Attack),
            ],
        );
        map
    }

    #[test]
    fn test_json_export_shape() {
        let json = encode(&sample(), Format::Json).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        let rects = value["frames"]["0"].as_array().unwrap();
        assert_eq!(rects[0]["w"], 40.0);
        assert_eq!(rects[0]["status"], "hold");
        assert!(rects[0].get("originalX").is_none());
        assert_eq!(rects[1]["originalY"], 2.0);
        assert!(json.contains('\n'));
    }

    #[test]
    fn test_plain_geometry_import() {
        let text = r#"{"frames":{"5":[{"x":1,"y":2,"w":30,"h":40}]}}"#;
        let map: FrameAnnotations = decode(text, Format::Json).unwrap();
        assert_eq!(map.frames["5"][0].status, Status::Hold);
    }

    #[test]
    fn test_file_export_by_extension() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["out.json", "out.yaml"] {
            let path = dir.path().join(name);
            export_annotations(&sample(), &path).unwrap();
            assert_eq!(import_annotations(&path).unwrap(), sample());
        }
        let err = export_annotations(&sample(), &dir.path().join("out.txt")).unwrap_err();
        assert!(matches!(err, StorageError::UnsupportedFormat(ext) if ext == "txt"));
    }
}
