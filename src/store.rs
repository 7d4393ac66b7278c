// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Annotation store for one screen.
//!
//! The store exclusively owns a screen's [`FrameAnnotations`] and the frame
//! offset that maps local frame indices onto its keys. Every mutation of a
//! frame's list goes through [`AnnotationStore::set_rectangles`], which
//! merges incoming rectangles with the previous ones by position.

use crate::models::annotation::{FrameAnnotations, Rectangle, Status};
use crate::reconcile;

/// Owner of a screen's frame-to-rectangles map.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AnnotationStore {
    annotations: FrameAnnotations,
    /// Key of local frame 0. Only loads and imports change it.
    frame_offset: i64,
    dirty: bool,
}

impl AnnotationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap loaded annotations; the offset is their smallest numeric key.
    pub fn from_annotations(annotations: FrameAnnotations) -> Self {
        let frame_offset = reconcile::annotation_offset(&annotations);
        Self {
            annotations,
            frame_offset,
            dirty: false,
        }
    }

    /// Use a previously saved offset instead of the derived one.
    pub fn with_frame_offset(mut self, frame_offset: i64) -> Self {
        self.frame_offset = frame_offset;
        self
    }

    pub fn annotations(&self) -> &FrameAnnotations {
        &self.annotations
    }

    pub fn frame_offset(&self) -> i64 {
        self.frame_offset
    }

    /// Key under which local frame `local` is written.
    pub fn lookup_key(&self, local: usize) -> String {
        reconcile::lookup_key(self.frame_offset, local).to_string()
    }

    /// Rectangles shown for local frame `local`, with nearest-frame fallback.
    pub fn rectangles_for(&self, local: usize, max_distance: u64) -> &[Rectangle] {
        reconcile::rectangles_for(&self.annotations, self.frame_offset, local, max_distance)
    }

    /// Rectangles stored under `key`, empty when absent.
    pub fn get(&self, key: &str) -> &[Rectangle] {
        self.annotations.get(key).unwrap_or(&[])
    }

    /// True when a mutation happened since the last [`mark_clean`](Self::mark_clean).
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn mark_clean(&mut self) {
        self.dirty = false;
    }

    /// Replace a frame's list.
    ///
    /// Each incoming rectangle at position `i` keeps its own status and
    /// inherits the original snapshot of the previous rectangle at `i`.
    /// Missing original fields are seeded from the incoming rectangle
    /// (its own snapshot first, then its geometry).
    pub fn set_rectangles(&mut self, key: &str, rects: Vec<Rectangle>) {
        let previous = self.annotations.frames.remove(key).unwrap_or_default();

        let merged: Vec<Rectangle> = rects
            .into_iter()
            .enumerate()
            .map(|(i, mut rect)| {
                if let Some(prev) = previous.get(i) {
                    rect.original_x = prev.original_x.or(rect.original_x);
                    rect.original_y = prev.original_y.or(rect.original_y);
                    rect.original_w = prev.original_w.or(rect.original_w);
                    rect.original_h = prev.original_h.or(rect.original_h);
                }
                rect.fill_missing_original();
                rect
            })
            .collect();

        log::debug!("Frame {}: stored {} rectangles", key, merged.len());
        self.annotations.frames.insert(key.to_string(), merged);
        self.dirty = true;
    }

    /// Swap in a whole new map keyed from `frame_offset`, e.g. after
    /// merging an import.
    pub fn replace(&mut self, annotations: FrameAnnotations, frame_offset: i64) {
        log::debug!(
            "Replaced annotations: {} frames, {} rectangles, offset {}",
            annotations.frames.len(),
            annotations.rectangle_count(),
            frame_offset
        );
        self.annotations = annotations;
        self.frame_offset = frame_offset;
        self.dirty = true;
    }

    /// Append rectangles to a frame through the merge path.
    pub fn append(&mut self, key: &str, extra: impl IntoIterator<Item = Rectangle>) {
        let mut rects = self.get(key).to_vec();
        rects.extend(extra);
        self.set_rectangles(key, rects);
    }

    /// Remove the rectangle at `index` of a frame.
    pub fn remove(&mut self, key: &str, index: usize) -> Option<Rectangle> {
        let mut rects = self.get(key).to_vec();
        if index >= rects.len() {
            return None;
        }
        let removed = rects.remove(index);
        self.set_rectangles(key, rects);
        Some(removed)
    }

    /// Set the status of the object at list position `position` in every
    /// frame holding at least `position + 1` rectangles. Returns the
    /// number of frames touched.
    pub fn set_status(&mut self, position: usize, status: Status) -> usize {
        let mut touched = 0;
        for rects in self.annotations.frames.values_mut() {
            if let Some(rect) = rects.get_mut(position) {
                rect.apply_status(status);
                touched += 1;
            }
        }
        if touched > 0 {
            self.dirty = true;
        }
        log::info!(
            "Status {:?} applied to object {} in {} frames",
            status,
            position + 1,
            touched
        );
        touched
    }
}

/// Interpret a status button press against the object's current status.
///
/// Pressing the active non-Hold status turns it off (back to Hold);
/// pressing Hold while already Hold does nothing.
pub fn resolve_status_action(current: Status, target: Status) -> Option<Status> {
    match (current, target) {
        (Status::Hold, Status::Hold) => None,
        (current, target) if current == target => Some(Status::Hold),
        (_, target) => Some(target),
    }
}
