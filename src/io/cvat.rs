// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! CVAT / VOC annotation import.
//!
//! Two layouts are understood:
//! - CVAT video tracks: `<track label id>` containing `<box frame outside
//!   xtl ytl xbr ybr>`. Boxes marked `outside="1"` are skipped.
//! - VOC-style objects: `<object>` with a `<bndbox>` holding `xmin`,
//!   `ymin`, `xmax`, `ymax`, plus optional `frame` and `name` given as
//!   child elements or attributes.
//!
//! When any `<track>` is present only tracks are read. Missing or
//! unparsable numbers become 0 so partial annotations still import.

use crate::error::{ImportError, ImportResult};
use crate::models::annotation::{BoundingBox, ParsedAnnotation};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::collections::HashMap;
use std::path::Path;

/// Read and parse an annotation file.
pub fn load_annotations(path: &Path) -> ImportResult<ParsedAnnotation> {
    let text = std::fs::read_to_string(path)?;
    let parsed = parse_annotations(&text)?;
    log::info!(
        "Loaded {} boxes over {} frames from {}",
        parsed.box_count(),
        parsed.frames.len(),
        path.display()
    );
    Ok(parsed)
}

/// `<object>` being assembled while its children stream past.
#[derive(Default)]
struct PendingObject {
    index: usize,
    id: Option<String>,
    frame_attr: Option<String>,
    name_attr: Option<String>,
    frame_text: Option<String>,
    name_text: Option<String>,
    bndbox: Option<HashMap<String, String>>,
}

impl PendingObject {
    fn into_box(self) -> Option<(String, BoundingBox)> {
        let coords = self.bndbox?;
        let coord = |k: &str| coords.get(k).map(|v| parse_number(v)).unwrap_or(0.0);
        let (xmin, ymin, xmax, ymax) = (coord("xmin"), coord("ymin"), coord("xmax"), coord("ymax"));

        let frame = self
            .frame_text
            .or(self.frame_attr)
            .unwrap_or_else(|| "0".to_string());
        let class = self
            .name_text
            .or(self.name_attr)
            .unwrap_or_else(|| "object".to_string());

        let mut bbox = BoundingBox::new(xmin, ymin, xmax - xmin, ymax - ymin);
        bbox.frame = frame.trim().parse().ok();
        bbox.id = Some(self.id.unwrap_or_else(|| format!("obj_{}", self.index)));
        bbox.class = Some(class);
        Some((frame, bbox))
    }
}

/// Parse annotation XML text.
pub fn parse_annotations(text: &str) -> ImportResult<ParsedAnnotation> {
    let mut reader = Reader::from_str(text);
    let mut buf = Vec::new();

    let mut tracks = ParsedAnnotation::default();
    let mut objects = ParsedAnnotation::default();
    let mut saw_track = false;

    // (label, id) of the open <track>
    let mut track: Option<(String, String)> = None;
    let mut object: Option<PendingObject> = None;
    let mut object_count = 0;
    let mut in_bndbox = false;
    // Name of the element whose text is being captured
    let mut text_target: Option<String> = None;

    loop {
        let event = reader.read_event_into(&mut buf).map_err(|source| ImportError::Xml {
            position: reader.buffer_position() as u64,
            source,
        });

        match event? {
            Event::Start(ref e) => {
                let name = element_name(e);
                match name.as_str() {
                    "track" => {
                        saw_track = true;
                        let attrs = attributes(e)?;
                        let label = attrs.get("label").cloned().unwrap_or_else(|| "object".to_string());
                        let id = attrs.get("id").cloned().unwrap_or_default();
                        track = Some((label, id));
                    }
                    "box" => push_track_box(&mut tracks, track.as_ref(), e)?,
                    "object" => {
                        let attrs = attributes(e)?;
                        object = Some(PendingObject {
                            index: object_count,
                            id: attrs.get("id").cloned(),
                            frame_attr: attrs.get("frame").cloned(),
                            name_attr: attrs.get("name").cloned(),
                            ..PendingObject::default()
                        });
                        object_count += 1;
                    }
                    "bndbox" => {
                        if let Some(obj) = object.as_mut() {
                            obj.bndbox.get_or_insert_with(HashMap::new);
                            in_bndbox = true;
                        }
                    }
                    _ => {}
                }
                text_target = Some(name);
            }
            Event::Empty(ref e) => match element_name(e).as_str() {
                "track" => saw_track = true,
                "box" => push_track_box(&mut tracks, track.as_ref(), e)?,
                "object" => object_count += 1,
                _ => {}
            },
            Event::Text(ref e) => {
                let value = String::from_utf8_lossy(e).trim().to_string();
                if let (Some(obj), Some(target), false) =
                    (object.as_mut(), text_target.as_deref(), value.is_empty())
                {
                    match target {
                        "xmin" | "ymin" | "xmax" | "ymax" if in_bndbox => {
                            if let Some(coords) = obj.bndbox.as_mut() {
                                coords.entry(target.to_string()).or_insert(value);
                            }
                        }
                        "frame" if !in_bndbox => {
                            obj.frame_text.get_or_insert(value);
                        }
                        "name" if !in_bndbox => {
                            obj.name_text.get_or_insert(value);
                        }
                        _ => {}
                    }
                }
            }
            Event::End(ref e) => {
                text_target = None;
                match e.name().as_ref() {
                    b"track" => track = None,
                    b"bndbox" => in_bndbox = false,
                    b"object" => {
                        if let Some((frame, bbox)) = object.take().and_then(PendingObject::into_box) {
                            objects.frames.entry(frame).or_default().push(bbox);
                        }
                    }
                    _ => {}
                }
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    let parsed = if saw_track { tracks } else { objects };
    log::debug!(
        "Parsed {} annotation: {} boxes in {} frames",
        if saw_track { "CVAT track" } else { "object" },
        parsed.box_count(),
        parsed.frames.len()
    );
    Ok(parsed)
}

fn element_name(e: &BytesStart) -> String {
    String::from_utf8_lossy(e.name().as_ref()).into_owned()
}

fn attributes(e: &BytesStart) -> ImportResult<HashMap<String, String>> {
    let mut map = HashMap::new();
    for attr in e.attributes() {
        let attr = attr.map_err(|err| ImportError::Attribute {
            element: element_name(e),
            message: err.to_string(),
        })?;
        let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
        let value = String::from_utf8_lossy(&attr.value).into_owned();
        map.insert(key, value);
    }
    Ok(map)
}

fn push_track_box(
    parsed: &mut ParsedAnnotation,
    track: Option<&(String, String)>,
    e: &BytesStart,
) -> ImportResult<()> {
    let Some((label, track_id)) = track else {
        return Ok(());
    };
    let attrs = attributes(e)?;
    if attrs.get("outside").map(String::as_str) == Some("1") {
        return Ok(());
    }

    let frame = attrs.get("frame").cloned().unwrap_or_else(|| "0".to_string());
    let coord = |k: &str| attrs.get(k).map(|v| parse_number(v)).unwrap_or(0.0);
    let (xtl, ytl, xbr, ybr) = (coord("xtl"), coord("ytl"), coord("xbr"), coord("ybr"));

    let mut bbox = BoundingBox::new(xtl, ytl, xbr - xtl, ybr - ytl);
    bbox.frame = frame.trim().parse().ok();
    bbox.id = Some(format!("{}_{}", track_id, frame));
    bbox.class = Some(label.clone());
    parsed.frames.entry(frame).or_default().push(bbox);
    Ok(())
}

fn parse_number(value: &str) -> f64 {
    value
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .unwrap_or(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    const CVAT: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<annotations>
  <version>1.1</version>
  <track id="3" label="car" source="manual">
    <box frame="10" outside="0" occluded="0" keyframe="1" xtl="100.5" ytl="50" xbr="200.5" ybr="150"/>
    <box frame="11" outside="1" occluded="0" keyframe="1" xtl="101" ytl="51" xbr="201" ybr="151"/>
    <box frame="12" outside="0" occluded="0" keyframe="1" xtl="102" ytl="52" xbr="202" ybr="152">
      <attribute name="color">red</attribute>
    </box>
  </track>
  <track id="4">
    <box frame="10" outside="0" xtl="0" ytl="0" xbr="20"/>
  </track>
</annotations>"#;

    #[test]
    fn test_cvat_tracks() {
        let parsed = parse_annotations(CVAT).unwrap();
        assert_eq!(parsed.box_count(), 3);
        assert!(parsed.frames.get("11").is_none());

        let first = &parsed.frames["10"][0];
        assert_eq!((first.x, first.y, first.width, first.height), (100.5, 50.0, 100.0, 100.0));
        assert_eq!(first.id.as_deref(), Some("3_10"));
        assert_eq!(first.class.as_deref(), Some("car"));
        assert_eq!(first.frame, Some(10));

        // Missing ybr defaults to 0; missing label defaults to "object"
        let second = &parsed.frames["10"][1];
        assert_eq!(second.height, 0.0);
        assert_eq!(second.class.as_deref(), Some("object"));

        assert_eq!(parsed.frames["12"][0].id.as_deref(), Some("3_12"));
    }

    #[test]
    fn test_voc_objects() {
        let xml = r#"<annotation>
  <object id="a1">
    <name>person</name>
    <frame>4</frame>
    <bndbox><xmin>10</xmin><ymin>20</ymin><xmax>40</xmax><ymax>80</ymax></bndbox>
  </object>
  <object frame="7" name="dog">
    <bndbox><xmin>1</xmin><ymin>abc</ymin><xmax>11</xmax><ymax>21</ymax></bndbox>
  </object>
  <object><name>nobox</name></object>
  <object>
    <bndbox><xmin>5</xmin><ymin>5</ymin><xmax>15</xmax><ymax>15</ymax></bndbox>
  </object>
</annotation>"#;
        let parsed = parse_annotations(xml).unwrap();
        assert_eq!(parsed.box_count(), 3);

        let person = &parsed.frames["4"][0];
        assert_eq!((person.x, person.y, person.width, person.height), (10.0, 20.0, 30.0, 60.0));
        assert_eq!(person.id.as_deref(), Some("a1"));
        assert_eq!(person.class.as_deref(), Some("person"));

        let dog = &parsed.frames["7"][0];
        assert_eq!(dog.y, 0.0);
        assert_eq!(dog.height, 21.0);
        assert_eq!(dog.class.as_deref(), Some("dog"));
        assert_eq!(dog.id.as_deref(), Some("obj_1"));

        let anonymous = &parsed.frames["0"][0];
        assert_eq!(anonymous.id.as_deref(), Some("obj_3"));
        assert_eq!(anonymous.class.as_deref(), Some("object"));
    }

    #[test]
    fn test_tracks_take_precedence() {
        let xml = r#"<annotations>
  <track id="1" label="car"><box frame="0" xtl="0" ytl="0" xbr="20" ybr="20"/></track>
  <object><bndbox><xmin>1</xmin><ymin>1</ymin><xmax>30</xmax><ymax>30</ymax></bndbox></object>
</annotations>"#;
        let parsed = parse_annotations(xml).unwrap();
        assert_eq!(parsed.box_count(), 1);
        assert_eq!(parsed.frames["0"][0].class.as_deref(), Some("car"));
    }

    #[test]
    fn test_malformed_xml_is_an_error() {
        let err = parse_annotations("<annotations><track></annotations>").unwrap_err();
        assert!(matches!(err, ImportError::Xml { .. }));
    }

    #[test]
    fn test_empty_document() {
        let parsed = parse_annotations("<annotations/>").unwrap();
        assert_eq!(parsed.box_count(), 0);
    }

    #[test]
    fn test_load_annotations_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("labels.xml");
        std::fs::write(&path, CVAT).unwrap();
        assert_eq!(load_annotations(&path).unwrap().box_count(), 3);

        let missing = load_annotations(&dir.path().join("nope.xml")).unwrap_err();
        assert!(matches!(missing, ImportError::Io(_)));
    }
}
