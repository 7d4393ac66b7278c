// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Multi-screen workspace.
//!
//! A workspace holds up to `layout.max_screens` screens. Each screen owns an
//! annotation store, a local frame cursor and a rectangle tool. Pointer
//! input, status actions, imports, detections and playback are routed here
//! so every mutation ends up in the owning screen's store.

use crate::config::EngineConfig;
use crate::error::DetectionResult;
use crate::io::media::FrameImage;
use crate::models::annotation::{BoxFormat, FrameAnnotations, ParsedAnnotation, Point, Rectangle, Status};
use crate::models::layout::{FrameLocation, ScreenLayout};
use crate::models::project::ProjectData;
use crate::reconcile;
use crate::render::{self, DrawOp};
use crate::store::{resolve_status_action, AnnotationStore};
use crate::tool::construction::CreationMode;
use crate::tool::manipulation::CursorHint;
use crate::tool::{PointerButton, RectangleTool, ToolEvent};

/// External object detector.
pub trait Detector {
    fn detect(&self, frame: &FrameImage) -> DetectionResult<Vec<BoxFormat>>;
}

/// Identifies the frame a detection request was issued for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DetectionTicket {
    pub screen: usize,
    pub local_frame: usize,
    pub generation: u64,
}

/// One rectangle of the current frame, as listed in the objects panel.
#[derive(Debug, Clone, PartialEq)]
pub struct ScreenRect {
    pub screen: usize,
    pub local_index: usize,
    pub rectangle: Rectangle,
}

impl ScreenRect {
    pub fn label(&self) -> String {
        object_label(self.screen, self.local_index)
    }
}

/// Caption of object `local_index` on `screen`.
pub fn object_label(screen: usize, local_index: usize) -> String {
    format!("{}_{}", screen, local_index + 1)
}

/// One independently indexed frame sequence.
#[derive(Debug, Clone)]
pub struct Screen {
    number: usize,
    project: ProjectData,
    store: AnnotationStore,
    frame_count: usize,
    local_frame: usize,
    tool: RectangleTool,
    detection_generation: u64,
}

impl Screen {
    fn new(number: usize, mut project: ProjectData, config: &EngineConfig) -> Self {
        project.screen = Some(number);
        let annotations = std::mem::take(&mut project.annotations);
        let mut store = AnnotationStore::from_annotations(annotations);
        if let Some(offset) = project.frame_offset {
            store = store.with_frame_offset(offset);
        }
        Self {
            number,
            frame_count: project.frames.len(),
            project,
            store,
            local_frame: 0,
            tool: RectangleTool::new(config.geometry),
            detection_generation: 0,
        }
    }

    pub fn number(&self) -> usize {
        self.number
    }

    pub fn store(&self) -> &AnnotationStore {
        &self.store
    }

    pub fn tool(&self) -> &RectangleTool {
        &self.tool
    }

    pub fn frame_count(&self) -> usize {
        self.frame_count
    }

    pub fn local_frame(&self) -> usize {
        self.local_frame
    }

    pub fn project(&self) -> &ProjectData {
        &self.project
    }

    /// Image path of the current frame.
    pub fn current_frame_path(&self) -> Option<&str> {
        self.project.frames.get(self.local_frame).map(String::as_str)
    }

    /// The project with the store's current annotations.
    pub fn project_snapshot(&self) -> ProjectData {
        let mut project = self.project.clone();
        project.annotations = self.store.annotations().clone();
        project.frame_offset = Some(self.store.frame_offset());
        project
    }

    /// Key under which the current frame is written.
    pub fn lookup_key(&self) -> String {
        self.store.lookup_key(self.local_frame)
    }

    pub fn rectangles(&self, fallback_distance: u64) -> &[Rectangle] {
        self.store.rectangles_for(self.local_frame, fallback_distance)
    }

    pub fn at_end(&self) -> bool {
        self.local_frame + 1 >= self.frame_count
    }

    pub fn at_start(&self) -> bool {
        self.local_frame == 0
    }

    fn set_local_frame(&mut self, local: usize) {
        if local != self.local_frame {
            self.local_frame = local;
            self.tool.pointer_up();
            self.tool.clear_selection();
        }
    }

    fn frame_bounds(&self) -> Option<(f64, f64)> {
        (self.project.frame_width > 0 && self.project.frame_height > 0)
            .then(|| (self.project.frame_width as f64, self.project.frame_height as f64))
    }
}

/// All screens plus global playback state.
#[derive(Debug, Clone, Default)]
pub struct Workspace {
    config: EngineConfig,
    screens: Vec<Screen>,
    mode: CreationMode,
    playing: bool,
    next_generation: u64,
}

impl Workspace {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    /// Build a workspace from per-screen projects. Projects are ordered by
    /// their screen number (explicit or from a `Screen_<n>_` file name);
    /// projects beyond the screen limit are dropped.
    pub fn from_projects(config: EngineConfig, mut projects: Vec<ProjectData>) -> Self {
        projects.sort_by_key(|p| p.screen_number().unwrap_or(usize::MAX));
        let mut workspace = Self::new(config);
        for project in projects {
            if workspace.add_screen(project).is_none() {
                break;
            }
        }
        workspace
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Append a screen. Returns its number, or `None` when full.
    pub fn add_screen(&mut self, project: ProjectData) -> Option<usize> {
        if self.screens.len() >= self.config.layout.max_screens {
            log::warn!(
                "Screen limit {} reached, ignoring {}",
                self.config.layout.max_screens,
                project.media_file
            );
            return None;
        }
        let number = self.screens.len() + 1;
        let mut screen = Screen::new(number, project, &self.config);
        screen.tool.set_mode(self.mode);
        log::info!(
            "Screen {}: {} frames, {} annotated frames",
            number,
            screen.frame_count,
            screen.store.annotations().frames.len()
        );
        self.screens.push(screen);
        Some(number)
    }

    pub fn clear(&mut self) {
        self.screens.clear();
        self.playing = false;
    }

    pub fn screens(&self) -> &[Screen] {
        &self.screens
    }

    pub fn screen(&self, number: usize) -> Option<&Screen> {
        number.checked_sub(1).and_then(|i| self.screens.get(i))
    }

    fn screen_mut(&mut self, number: usize) -> Option<&mut Screen> {
        number.checked_sub(1).and_then(|i| self.screens.get_mut(i))
    }

    pub fn layout(&self) -> ScreenLayout {
        ScreenLayout::new(self.screens.iter().map(|s| s.frame_count).collect())
    }

    pub fn is_dirty(&self) -> bool {
        self.screens.iter().any(|s| s.store.is_dirty())
    }

    pub fn mark_clean(&mut self) {
        for screen in &mut self.screens {
            screen.store.mark_clean();
        }
    }

    /// Rectangles shown on `screen` for its current frame.
    pub fn rectangles(&self, screen: usize) -> &[Rectangle] {
        self.screen(screen)
            .map(|s| s.rectangles(self.config.reconcile.fallback_distance))
            .unwrap_or(&[])
    }

    /// Current-frame rectangles of every screen, in screen order.
    pub fn screen_rectangles(&self) -> Vec<ScreenRect> {
        self.screens
            .iter()
            .flat_map(|screen| {
                screen
                    .rectangles(self.config.reconcile.fallback_distance)
                    .iter()
                    .enumerate()
                    .map(|(local_index, rectangle)| ScreenRect {
                        screen: screen.number,
                        local_index,
                        rectangle: rectangle.clone(),
                    })
            })
            .collect()
    }

    pub fn labels(&self, screen: usize) -> Vec<String> {
        (0..self.rectangles(screen).len())
            .map(|i| object_label(screen, i))
            .collect()
    }

    pub fn draw_list(&self, screen: usize) -> Vec<DrawOp> {
        let Some(s) = self.screen(screen) else {
            return Vec::new();
        };
        render::draw_list(
            self.rectangles(screen),
            &self.labels(screen),
            s.tool.selection(),
            &s.tool.interaction_state(),
        )
    }

    // ---- Interaction ----

    pub fn mode(&self) -> CreationMode {
        self.mode
    }

    pub fn set_mode(&mut self, mode: CreationMode) {
        self.mode = mode;
        for screen in &mut self.screens {
            screen.tool.set_mode(mode);
        }
    }

    pub fn pointer_down(&mut self, screen: usize, button: PointerButton, pos: Point) -> bool {
        let rects = self.rectangles(screen).to_vec();
        let Some(s) = self.screen_mut(screen) else {
            return false;
        };
        let event = s.tool.pointer_down(button, pos, &rects);
        self.apply_event(screen, event)
    }

    pub fn pointer_move(&mut self, screen: usize, pos: Point) -> bool {
        let rects = self.rectangles(screen).to_vec();
        let Some(s) = self.screen_mut(screen) else {
            return false;
        };
        let event = s.tool.pointer_move(pos, &rects);
        self.apply_event(screen, event)
    }

    pub fn pointer_up(&mut self, screen: usize) {
        if let Some(s) = self.screen_mut(screen) {
            s.tool.pointer_up();
        }
    }

    pub fn delete_selected(&mut self, screen: usize) -> bool {
        let rects = self.rectangles(screen).to_vec();
        let Some(s) = self.screen_mut(screen) else {
            return false;
        };
        let event = s.tool.delete_selected(&rects);
        self.apply_event(screen, event)
    }

    pub fn hover_cursor(&self, screen: usize, pos: Point) -> CursorHint {
        self.screen(screen)
            .map(|s| s.tool.hover_cursor(pos, self.rectangles(screen)))
            .unwrap_or_default()
    }

    fn apply_event(&mut self, screen: usize, event: ToolEvent) -> bool {
        let created = matches!(event, ToolEvent::Created(_));
        let rects = match event {
            ToolEvent::Nothing => return false,
            ToolEvent::Commit(rects) | ToolEvent::Created(rects) => rects,
        };
        let Some(s) = self.screen_mut(screen) else {
            return false;
        };

        let key = s.lookup_key();
        let len = rects.len();
        s.store.set_rectangles(&key, rects);
        s.tool.clamp_selection(len);

        if created {
            log::info!("Screen {}: created object {} on frame {}", screen, len, key);
            self.set_mode(CreationMode::Drag);
        }
        true
    }

    // ---- Status ----

    /// Toggle-style status action on object `index` of `screen`'s current
    /// frame. Returns the status applied, `None` for a no-op.
    pub fn status_action(&mut self, screen: usize, index: usize, target: Status) -> Option<Status> {
        let current = self.rectangles(screen).get(index)?.status;
        let status = resolve_status_action(current, target)?;
        let s = self.screen_mut(screen)?;
        s.store.set_status(index, status);
        Some(status)
    }

    // ---- Import and detection ----

    /// Merge an imported annotation set into `screen`. Imported boxes come
    /// first for each frame, followed by the screen's own rectangles.
    ///
    /// The import's first frame becomes local frame 0: the screen offset
    /// moves to the smallest converted key and the screen's own rectangles
    /// are rebased so they stay on the local frames they were drawn on.
    pub fn import_annotations(&mut self, screen: usize, parsed: &ParsedAnnotation) -> bool {
        let start = self.layout().start_index(screen);
        let Some(s) = self.screen_mut(screen) else {
            return false;
        };
        let converted = reconcile::convert_imported(parsed, start);
        let current = s.store.frame_offset();
        let offset = if converted.frames.is_empty() {
            current
        } else {
            reconcile::annotation_offset(&converted)
        };
        let own = reconcile::rebase_keys(s.store.annotations(), current, offset);
        let merged = reconcile::merge_imported(&own, converted);
        s.store.replace(merged, offset);
        s.tool.clear_selection();
        log::info!(
            "Screen {}: imported {} boxes starting at global frame {} (offset {} -> {})",
            screen,
            parsed.box_count(),
            start,
            current,
            offset
        );
        true
    }

    /// Replace `screen`'s annotations with a previously exported map. The
    /// offset is taken from the map's smallest key, as on project load.
    pub fn load_annotations(&mut self, screen: usize, annotations: FrameAnnotations) -> bool {
        let Some(s) = self.screen_mut(screen) else {
            return false;
        };
        let offset = reconcile::annotation_offset(&annotations);
        log::info!(
            "Screen {}: loaded {} rectangles over {} frames (offset {})",
            screen,
            annotations.rectangle_count(),
            annotations.frames.len(),
            offset
        );
        s.store.replace(annotations, offset);
        s.tool.clear_selection();
        true
    }

    /// Start a detection request for `screen`'s current frame. A newer
    /// request for the same screen supersedes older tickets.
    pub fn request_detection(&mut self, screen: usize) -> Option<DetectionTicket> {
        self.next_generation += 1;
        let generation = self.next_generation;
        let s = self.screen_mut(screen)?;
        s.detection_generation = generation;
        Some(DetectionTicket {
            screen,
            local_frame: s.local_frame,
            generation,
        })
    }

    /// Whether a ticket still refers to what its screen is showing.
    pub fn is_current(&self, ticket: &DetectionTicket) -> bool {
        self.screen(ticket.screen).is_some_and(|s| {
            s.local_frame == ticket.local_frame && s.detection_generation == ticket.generation
        })
    }

    /// Append detector output to the ticket's frame. Stale tickets are
    /// ignored. Returns the number of rectangles added.
    pub fn apply_detection(&mut self, ticket: &DetectionTicket, boxes: &[BoxFormat]) -> usize {
        if !self.is_current(ticket) {
            log::debug!(
                "Ignoring stale detection for screen {} frame {}",
                ticket.screen,
                ticket.local_frame
            );
            return 0;
        }
        let Some(s) = self.screen_mut(ticket.screen) else {
            return 0;
        };
        let rects = reconcile::detections_to_rectangles(boxes, s.frame_bounds());
        let added = rects.len();
        let key = s.lookup_key();
        s.store.append(&key, rects);
        log::info!("Screen {}: added {} detected objects", ticket.screen, added);
        added
    }

    /// Run a detector synchronously on `screen`'s current frame.
    pub fn detect_with(
        &mut self,
        screen: usize,
        detector: &dyn Detector,
        frame: &FrameImage,
    ) -> DetectionResult<usize> {
        let Some(ticket) = self.request_detection(screen) else {
            return Ok(0);
        };
        let boxes = detector.detect(frame).inspect_err(|e| {
            log::error!("Detection failed on screen {}: {}", screen, e);
        })?;
        Ok(self.apply_detection(&ticket, &boxes))
    }

    // ---- Navigation and playback ----

    pub fn all_at_end(&self) -> bool {
        self.screens.iter().all(Screen::at_end)
    }

    pub fn all_at_start(&self) -> bool {
        self.screens.iter().all(Screen::at_start)
    }

    /// Advance every screen not yet at its last frame.
    pub fn next_frame(&mut self) -> bool {
        if self.all_at_end() {
            return false;
        }
        for screen in &mut self.screens {
            if !screen.at_end() {
                let next = screen.local_frame + 1;
                screen.set_local_frame(next);
            }
        }
        true
    }

    /// Step back every screen not yet at its first frame.
    pub fn previous_frame(&mut self) -> bool {
        if self.all_at_start() {
            return false;
        }
        for screen in &mut self.screens {
            if !screen.at_start() {
                let previous = screen.local_frame - 1;
                screen.set_local_frame(previous);
            }
        }
        true
    }

    /// Jump to a global frame index. Returns where it landed.
    pub fn seek(&mut self, global: usize) -> Option<FrameLocation> {
        let location = self.layout().locate(global)?;
        self.screen_mut(location.screen)?
            .set_local_frame(location.local);
        Some(location)
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    /// Start playback. Refused when any screen has no frames or all are
    /// already at their end.
    pub fn play(&mut self) -> bool {
        let min_frames = self.screens.iter().map(|s| s.frame_count).min().unwrap_or(0);
        if min_frames == 0 || self.all_at_end() {
            return false;
        }
        self.playing = true;
        true
    }

    pub fn stop(&mut self) {
        self.playing = false;
    }

    /// One playback step. Stops itself once every screen is at its end.
    pub fn tick(&mut self) -> bool {
        if !self.playing {
            return false;
        }
        let advanced = self.next_frame();
        if !advanced || self.all_at_end() {
            self.playing = false;
            log::debug!("Playback finished");
        }
        advanced
    }
}
