// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Frame-index reconciliation.
//!
//! Video extraction, multi-screen layouts and imported annotation files all
//! count frames independently. This module maps a screen-local frame index
//! onto the keys actually present in that screen's annotation map, and
//! converts imported or detected boxes into stored rectangles.
//!
//! Lookup for local frame `n` uses key `offset + n`. The offset belongs to
//! the screen: it is taken once from the smallest numeric key when
//! annotations are loaded or imported, and rectangles the user draws never
//! move it. When the lookup key has no rectangles, the closest numeric key
//! within `max_distance` is used instead; ties go to the smaller key.

use crate::models::annotation::{
    BoxFormat, FrameAnnotations, ParsedAnnotation, Rect, Rectangle,
};

/// Smallest numeric key in the map, or 0 when there is none.
pub fn annotation_offset(map: &FrameAnnotations) -> i64 {
    map.numeric_keys().first().copied().unwrap_or(0)
}

/// Key under which local frame `local` is read and written.
pub fn lookup_key(offset: i64, local: usize) -> i64 {
    offset + local as i64
}

/// Move every numeric key from offset `from` to offset `to`, keeping each
/// frame's local index. Non-numeric keys are carried over unchanged.
pub fn rebase_keys(map: &FrameAnnotations, from: i64, to: i64) -> FrameAnnotations {
    if from == to {
        return map.clone();
    }
    let mut rebased = FrameAnnotations::new();
    for (key, rects) in &map.frames {
        let new_key = match key.trim().parse::<i64>() {
            Ok(value) => (value - from + to).to_string(),
            Err(_) => key.clone(),
        };
        rebased.frames.entry(new_key).or_default().extend(rects.iter().cloned());
    }
    rebased
}

/// Closest numeric key to `target` within `max_distance`, returned as the
/// key string present in the map together with its distance.
pub fn nearest_key(map: &FrameAnnotations, target: i64, max_distance: u64) -> Option<(String, u64)> {
    let mut best: Option<(i64, &String)> = None;
    for key in map.frames.keys() {
        let Ok(value) = key.trim().parse::<i64>() else {
            continue;
        };
        let closer = match best {
            None => true,
            Some((current, _)) => {
                let (d_new, d_cur) = (value.abs_diff(target), current.abs_diff(target));
                d_new < d_cur || (d_new == d_cur && value < current)
            }
        };
        if closer {
            best = Some((value, key));
        }
    }

    let (value, key) = best?;
    let distance = value.abs_diff(target);
    (distance <= max_distance).then(|| (key.clone(), distance))
}

/// Outcome of resolving a local frame index against an annotation map.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedFrame {
    /// Key for writes: `offset + local`
    pub lookup_key: String,
    /// Key the rectangles are read from, `None` when nothing matched
    pub source_key: Option<String>,
}

impl ResolvedFrame {
    pub fn is_fallback(&self) -> bool {
        self.source_key
            .as_ref()
            .is_some_and(|source| *source != self.lookup_key)
    }
}

/// Resolve which stored frame backs local frame `local`.
pub fn resolve_frame(map: &FrameAnnotations, offset: i64, local: usize, max_distance: u64) -> ResolvedFrame {
    let target = lookup_key(offset, local);
    let lookup_key = target.to_string();

    if map.get(&lookup_key).is_some_and(|rects| !rects.is_empty()) {
        return ResolvedFrame {
            source_key: Some(lookup_key.clone()),
            lookup_key,
        };
    }

    let source_key = nearest_key(map, target, max_distance).map(|(key, distance)| {
        if distance > 0 {
            log::debug!(
                "Frame {}: using nearest annotated frame {} (distance {})",
                target,
                key,
                distance
            );
        }
        key
    });

    ResolvedFrame {
        lookup_key,
        source_key,
    }
}

/// Rectangles shown for local frame `local`; empty when nothing is close.
pub fn rectangles_for(
    map: &FrameAnnotations,
    offset: i64,
    local: usize,
    max_distance: u64,
) -> &[Rectangle] {
    let resolved = resolve_frame(map, offset, local, max_distance);
    resolved
        .source_key
        .and_then(|key| map.get(&key))
        .unwrap_or(&[])
}

/// Convert an imported annotation set for a screen starting at global
/// frame `screen_start` into stored rectangles.
///
/// The smallest numeric key of the import is its offset; key `k` becomes
/// `screen_start + (k - offset)`. Rectangles start as `Hold` with their
/// original snapshot equal to the imported geometry. Non-numeric keys are
/// dropped.
pub fn convert_imported(parsed: &ParsedAnnotation, screen_start: usize) -> FrameAnnotations {
    let offset = parsed
        .frames
        .keys()
        .filter_map(|k| k.trim().parse::<i64>().ok())
        .min()
        .unwrap_or(0);

    let mut converted = FrameAnnotations::new();
    for (key, boxes) in &parsed.frames {
        let Ok(imported) = key.trim().parse::<i64>() else {
            log::warn!("Skipping imported frame with non-numeric key {:?}", key);
            continue;
        };
        let global = screen_start as i64 + (imported - offset);
        let rects = boxes.iter().map(|b| Rectangle::pinned(b.rect()));
        converted
            .frames
            .entry(global.to_string())
            .or_default()
            .extend(rects);
    }

    log::info!(
        "Converted {} imported boxes over {} frames (offset {}, start {})",
        parsed.box_count(),
        converted.frames.len(),
        offset,
        screen_start
    );
    converted
}

/// Merge converted imports with a project's own annotations: for each key
/// the imported rectangles come first, followed by the project's.
pub fn merge_imported(base: &FrameAnnotations, imported: FrameAnnotations) -> FrameAnnotations {
    let mut merged = imported;
    for (key, rects) in &base.frames {
        merged
            .frames
            .entry(key.clone())
            .or_default()
            .extend(rects.iter().cloned());
    }
    merged
}

/// Turn detector boxes into `Hold` rectangles with originals set.
///
/// With `bounds = Some((width, height))` boxes are clamped to the frame.
/// Boxes left with a non-positive side are dropped.
pub fn detections_to_rectangles(boxes: &[BoxFormat], bounds: Option<(f64, f64)>) -> Vec<Rectangle> {
    boxes
        .iter()
        .map(|b| {
            let rect = b.normalize();
            match bounds {
                Some((width, height)) => clamp_to_frame(rect, width, height),
                None => rect,
            }
        })
        .filter(|rect| rect.w > 0.0 && rect.h > 0.0)
        .map(Rectangle::pinned)
        .collect()
}

fn clamp_to_frame(rect: Rect, width: f64, height: f64) -> Rect {
    let x = rect.x.clamp(0.0, width);
    let y = rect.y.clamp(0.0, height);
    let w = rect.w.min(width - x).max(0.0);
    let h = rect.h.min(height - y).max(0.0);
    Rect::new(x, y, w, h)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::annotation::{BoundingBox, Status};

    fn map_with(keys: &[(&str, usize)]) -> FrameAnnotations {
        let mut map = FrameAnnotations::new();
        for (key, count) in keys {
            let rects = (0..*count)
                .map(|i| Rectangle::new(Rect::new(i as f64, 0.0, 20.0, 20.0)))
                .collect();
            map.frames.insert(key.to_string(), rects);
        }
        map
    }

    #[test]
    fn test_offset_is_min_numeric_key() {
        assert_eq!(annotation_offset(&FrameAnnotations::new()), 0);
        assert_eq!(annotation_offset(&map_with(&[("12", 1), ("7", 1), ("x", 1)])), 7);
        assert_eq!(annotation_offset(&map_with(&[("x", 1)])), 0);
    }

    #[test]
    fn test_exact_lookup_uses_offset() {
        let map = map_with(&[("100", 1), ("101", 2)]);
        let offset = annotation_offset(&map);
        let resolved = resolve_frame(&map, offset, 1, 5);
        assert_eq!(resolved.lookup_key, "101");
        assert_eq!(resolved.source_key.as_deref(), Some("101"));
        assert!(!resolved.is_fallback());
        assert_eq!(rectangles_for(&map, offset, 1, 5).len(), 2);
    }

    #[test]
    fn test_fallback_boundary() {
        let map = map_with(&[("0", 0), ("10", 1), ("20", 2)]);
        assert_eq!(rectangles_for(&map, 0, 15, 5).len(), 1);
        assert_eq!(rectangles_for(&map, 0, 16, 5).len(), 2);
        assert!(rectangles_for(&map, 0, 26, 5).is_empty());

        let resolved = resolve_frame(&map, 0, 15, 5);
        assert_eq!(resolved.source_key.as_deref(), Some("10"));
        assert!(resolved.is_fallback());
    }

    #[test]
    fn test_nearest_key_tie_prefers_smaller() {
        let map = map_with(&[("10", 1), ("20", 1)]);
        assert_eq!(nearest_key(&map, 15, 5), Some(("10".to_string(), 5)));
        assert_eq!(nearest_key(&map, 16, 5), Some(("20".to_string(), 4)));
        assert_eq!(nearest_key(&map, 30, 5), None);
        assert_eq!(nearest_key(&map, 31, 20), Some(("20".to_string(), 11)));
    }

    #[test]
    fn test_empty_exact_frame_stays_empty() {
        let map = map_with(&[("0", 1), ("1", 0)]);
        assert!(rectangles_for(&map, 0, 1, 5).is_empty());
    }

    #[test]
    fn test_offset_is_independent_of_written_keys() {
        // A rectangle written at local 7 of an empty screen reads back there
        let map = map_with(&[("7", 1)]);
        assert_eq!(rectangles_for(&map, 0, 7, 5).len(), 1);
        assert!(rectangles_for(&map, 0, 0, 5).is_empty());
    }

    #[test]
    fn test_rebase_keeps_local_indices() {
        let map = map_with(&[("0", 1), ("2", 2), ("note", 1)]);
        let rebased = rebase_keys(&map, 0, 120);
        let keys: Vec<&String> = rebased.frames.keys().collect();
        assert_eq!(keys, vec!["120", "122", "note"]);
        assert_eq!(rebased.frames["122"].len(), 2);
        assert_eq!(rebase_keys(&map, 4, 4), map);
    }

    #[test]
    fn test_convert_imported_applies_offset_and_start() {
        let mut parsed = ParsedAnnotation::default();
        parsed.frames.insert("5".into(), vec![BoundingBox::new(1.0, 2.0, 30.0, 40.0)]);
        parsed.frames.insert("7".into(), vec![BoundingBox::new(3.0, 4.0, 50.0, 60.0)]);

        let converted = convert_imported(&parsed, 3);
        let keys: Vec<&String> = converted.frames.keys().collect();
        assert_eq!(keys, vec!["3", "5"]);

        let rect = &converted.frames["5"][0];
        assert_eq!(rect.status, Status::Hold);
        assert_eq!(rect.rect(), Rect::new(3.0, 4.0, 50.0, 60.0));
        assert_eq!(rect.original(), Some(rect.rect()));
    }

    #[test]
    fn test_merge_imported_puts_imports_first() {
        let base = map_with(&[("0", 1)]);
        let mut imported = FrameAnnotations::new();
        imported
            .frames
            .insert("0".into(), vec![Rectangle::pinned(Rect::new(99.0, 0.0, 20.0, 20.0))]);

        let merged = merge_imported(&base, imported);
        let rects = &merged.frames["0"];
        assert_eq!(rects.len(), 2);
        assert_eq!(rects[0].x, 99.0);
        assert_eq!(rects[1].x, 0.0);
    }

    #[test]
    fn test_detections_are_normalized_and_filtered() {
        let boxes = [
            BoxFormat::CornerPair([10.0, 10.0, 60.0, 40.0]),
            BoxFormat::Xywh([600.0, 400.0, 100.0, 100.0]),
            BoxFormat::Xywh([5.0, 5.0, 0.0, 10.0]),
        ];
        let rects = detections_to_rectangles(&boxes, Some((640.0, 480.0)));
        assert_eq!(rects.len(), 2);
        assert_eq!(rects[0].rect(), Rect::new(10.0, 10.0, 50.0, 30.0));
        assert_eq!(rects[1].rect(), Rect::new(600.0, 400.0, 40.0, 80.0));
        assert!(rects.iter().all(|r| r.status == Status::Hold && r.original().is_some()));
    }
}
