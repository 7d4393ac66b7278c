// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Project persistence.
//!
//! [`ProjectStore`] is the key-value contract the application saves
//! through. Loads and saves are all-or-nothing; a failed save leaves the
//! previous file untouched.

use crate::error::{StorageError, StorageResult};
use crate::models::project::{project_id, ProjectData};
use std::path::PathBuf;

/// Key-value store of projects by id.
pub trait ProjectStore {
    fn load_project(&self, id: &str) -> StorageResult<ProjectData>;
    fn save_project(&self, project: &ProjectData) -> StorageResult<()>;
    fn delete_project(&self, id: &str) -> StorageResult<()>;
    /// Ids of every stored project, sorted.
    fn list_projects(&self) -> StorageResult<Vec<String>>;
}

/// One pretty JSON file per project inside a directory.
#[derive(Debug, Clone)]
pub struct FileProjectStore {
    root: PathBuf,
}

impl FileProjectStore {
    /// Open a store, creating the directory if needed.
    pub fn open(root: impl Into<PathBuf>) -> StorageResult<Self> {
        let root = root.into();
        std::fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    fn path_for(&self, id: &str) -> PathBuf {
        self.root.join(format!("{}.json", project_id(id)))
    }
}

impl ProjectStore for FileProjectStore {
    fn load_project(&self, id: &str) -> StorageResult<ProjectData> {
        let path = self.path_for(id);
        if !path.exists() {
            return Err(StorageError::NotFound(id.to_string()));
        }
        let text = std::fs::read_to_string(&path)?;
        let project = serde_json::from_str(&text)?;
        log::debug!("Loaded project {} from {}", id, path.display());
        Ok(project)
    }

    fn save_project(&self, project: &ProjectData) -> StorageResult<()> {
        let path = self.path_for(&project.id);
        let tmp = path.with_extension("json.tmp");
        let json = serde_json::to_string_pretty(project)?;

        std::fs::write(&tmp, json).inspect_err(|e| {
            log::error!("Failed to write {}: {}", tmp.display(), e);
        })?;
        if let Err(e) = std::fs::rename(&tmp, &path) {
            log::error!("Failed to replace {}: {}", path.display(), e);
            let _ = std::fs::remove_file(&tmp);
            return Err(e.into());
        }

        log::info!(
            "Saved project {} ({} annotated frames)",
            project.id,
            project.annotations.frames.len()
        );
        Ok(())
    }

    fn delete_project(&self, id: &str) -> StorageResult<()> {
        let path = self.path_for(id);
        match std::fs::remove_file(&path) {
            Ok(()) => {
                log::info!("Deleted project {}", id);
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(StorageError::NotFound(id.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    fn list_projects(&self) -> StorageResult<Vec<String>> {
        let mut ids = Vec::new();
        for entry in std::fs::read_dir(&self.root)? {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) == Some("json") {
                if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                    ids.push(stem.to_string());
                }
            }
        }
        ids.sort();
        Ok(ids)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::annotation::{Rect, Rectangle};

    #[test]
    fn test_save_load_list() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileProjectStore::open(dir.path().join("projects")).unwrap();

        let mut project = ProjectData::new("Screen_2_cam.mp4".into(), 640, 480);
        project
            .annotations
            .frames
            .insert("0".into(), vec![Rectangle::new(Rect::new(1.0, 2.0, 30.0, 40.0))]);
        store.save_project(&project).unwrap();
        store
            .save_project(&ProjectData::new("a.mp4".into(), 1, 1))
            .unwrap();

        assert_eq!(store.load_project("Screen_2_cam").unwrap(), project);
        assert_eq!(store.list_projects().unwrap(), vec!["Screen_2_cam", "a"]);
    }

    #[test]
    fn test_missing_project() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileProjectStore::open(dir.path()).unwrap();
        let err = store.load_project("ghost").unwrap_err();
        assert!(matches!(err, StorageError::NotFound(id) if id == "ghost"));
    }

    #[test]
    fn test_save_overwrites_without_leftovers() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileProjectStore::open(dir.path()).unwrap();
        let mut project = ProjectData::new("clip.mp4".into(), 10, 10);
        store.save_project(&project).unwrap();
        project.frame_width = 20;
        store.save_project(&project).unwrap();

        assert_eq!(store.load_project("clip").unwrap().frame_width, 20);
        let files = std::fs::read_dir(dir.path()).unwrap().count();
        assert_eq!(files, 1);
    }

    #[test]
    fn test_delete_project() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileProjectStore::open(dir.path()).unwrap();
        store.save_project(&ProjectData::new("a.mp4".into(), 1, 1)).unwrap();
        store.save_project(&ProjectData::new("b.mp4".into(), 1, 1)).unwrap();

        store.delete_project("a").unwrap();
        assert_eq!(store.list_projects().unwrap(), vec!["b"]);
        assert!(matches!(store.delete_project("a"), Err(StorageError::NotFound(_))));
    }

    #[test]
    fn test_corrupt_file_is_json_error() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileProjectStore::open(dir.path()).unwrap();
        std::fs::write(dir.path().join("bad.json"), "{not json").unwrap();
        assert!(matches!(store.load_project("bad").unwrap_err(), StorageError::Json(_)));
    }
}
