// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Main application state and egui App implementation.
//!
//! The application owns a [`Workspace`] and forwards canvas input, status
//! buttons and playback controls to it. Frame images and saved sessions
//! load on background threads; results are picked up once per UI frame.

use crate::ui::{canvas, properties, timeline, toolbar};
use anyhow::{Context, Result};
use framemark::config::EngineConfig;
use framemark::error::StorageError;
use framemark::io::loader::{LoadPoll, PendingLoad};
use framemark::io::media::{self, FrameImage};
use framemark::io::store::{FileProjectStore, ProjectStore};
use framemark::io::{cvat, serialization};
use framemark::models::project::ProjectData;
use framemark::tool::construction::CreationMode;
use framemark::tool::manipulation::CursorHint;
use framemark::workspace::Workspace;
use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Instant;

/// Texture of the frame currently displayed on a screen.
struct ScreenTexture {
    path: String,
    size: (u32, u32),
    texture: egui::TextureHandle,
}

/// Outstanding frame image load for a screen.
struct FrameRequest {
    path: String,
    load: PendingLoad<FrameImage>,
}

/// What a screen needs for the frame it should display.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FrameStep {
    /// The texture already shows it
    Shown,
    /// A previous load of this frame failed; wait for a frame change
    Failed,
    /// No load in flight for this frame
    Request,
    /// A load for this frame is in flight
    Poll,
}

fn frame_step(shown: Option<&str>, requested: Option<&str>, failed: Option<&str>, wanted: &str) -> FrameStep {
    if shown == Some(wanted) {
        FrameStep::Shown
    } else if failed == Some(wanted) {
        FrameStep::Failed
    } else if requested == Some(wanted) {
        FrameStep::Poll
    } else {
        FrameStep::Request
    }
}

/// Result of a background project load.
enum Loaded {
    NewScreen(ProjectData, FrameImage),
    Session(PathBuf, Vec<ProjectData>),
}

/// Main application state.
pub struct FramemarkApp {
    workspace: Workspace,

    /// Per-screen frame textures
    textures: HashMap<usize, ScreenTexture>,

    /// Per-screen frame loads in flight
    frame_requests: HashMap<usize, FrameRequest>,

    /// Per-screen frame that failed to load, not retried until it changes
    failed_frames: HashMap<usize, String>,

    /// Background project or session load
    project_load: Option<PendingLoad<Loaded>>,

    /// Loading state message
    loading_message: Option<String>,

    /// Last reported outcome, shown in the status bar
    status_message: Option<String>,

    /// Screen that last received pointer input
    active_screen: usize,

    /// Folder the session was opened from or saved to
    session_dir: Option<PathBuf>,

    /// Project ids stored in `session_dir` by this session
    session_projects: Vec<String>,

    last_tick: Instant,
    seek_target: usize,
    next_generation: u64,
}

impl FramemarkApp {
    /// Create a new application instance.
    pub fn new(config: EngineConfig) -> Self {
        Self {
            workspace: Workspace::new(config),
            textures: HashMap::new(),
            frame_requests: HashMap::new(),
            failed_frames: HashMap::new(),
            project_load: None,
            loading_message: None,
            status_message: None,
            active_screen: 1,
            session_dir: None,
            session_projects: Vec::new(),
            last_tick: Instant::now(),
            seek_target: 0,
            next_generation: 0,
        }
    }

    fn generation(&mut self) -> u64 {
        self.next_generation += 1;
        self.next_generation
    }

    /// Log a failed operation and surface it in the status bar.
    fn report(&mut self, result: Result<()>) {
        if let Err(e) = result {
            log::error!("{:#}", e);
            self.status_message = Some(format!("Error: {:#}", e));
        }
    }

    /// Open picked frame images as a new screen (asynchronously).
    fn open_frames(&mut self, paths: Vec<PathBuf>) {
        let generation = self.generation();
        let timeout = self.workspace.config().media.load_timeout();
        self.loading_message = Some("Loading frames...".to_string());
        self.project_load = Some(PendingLoad::spawn(generation, timeout, move || {
            let (project, first) = media::open_frames(paths)?;
            Ok(Loaded::NewScreen(project, first))
        }));
    }

    /// Open every frame image in a folder as a new screen (asynchronously).
    fn open_frame_folder(&mut self, dir: PathBuf) {
        let generation = self.generation();
        let timeout = self.workspace.config().media.load_timeout();
        self.loading_message = Some("Loading frames...".to_string());
        self.project_load = Some(PendingLoad::spawn(generation, timeout, move || {
            let (project, first) = media::open_frames(media::frames_in_dir(&dir)?)?;
            Ok(Loaded::NewScreen(project, first))
        }));
    }

    /// Load every project of a saved session folder (asynchronously).
    fn open_session(&mut self, dir: PathBuf) {
        let generation = self.generation();
        let timeout = self.workspace.config().media.load_timeout();
        self.loading_message = Some("Loading session...".to_string());
        self.project_load = Some(PendingLoad::spawn(generation, timeout, move || {
            let load = || -> framemark::error::StorageResult<Vec<ProjectData>> {
                let store = FileProjectStore::open(&dir)?;
                store
                    .list_projects()?
                    .iter()
                    .map(|id| store.load_project(id))
                    .collect()
            };
            let projects = load()?;
            Ok(Loaded::Session(dir, projects))
        }));
    }

    /// Save every screen's project into the session folder.
    fn save_session(&mut self, dir: PathBuf) -> Result<()> {
        let store = FileProjectStore::open(&dir)
            .with_context(|| format!("Cannot open session folder {}", dir.display()))?;
        let mut saved = Vec::new();
        for screen in self.workspace.screens() {
            let project = screen.project_snapshot();
            store
                .save_project(&project)
                .with_context(|| format!("Failed to save project {}", project.id))?;
            saved.push(project.id);
        }
        // Projects of screens closed since this session was opened or saved
        if self.session_dir.as_ref() == Some(&dir) {
            for id in self.session_projects.iter().filter(|id| !saved.contains(id)) {
                match store.delete_project(id) {
                    Ok(()) | Err(StorageError::NotFound(_)) => {}
                    Err(e) => {
                        return Err(e).with_context(|| format!("Failed to remove stale project {}", id));
                    }
                }
            }
        }
        self.session_projects = saved;
        self.workspace.mark_clean();
        self.status_message = Some(format!("Saved session to {}", dir.display()));
        self.session_dir = Some(dir);
        Ok(())
    }

    /// Import a CVAT/VOC XML file into a screen.
    fn import_cvat(&mut self, screen: usize, path: PathBuf) -> Result<()> {
        let parsed = cvat::load_annotations(&path)
            .with_context(|| format!("Failed to import {}", path.display()))?;
        self.workspace.import_annotations(screen, &parsed);
        self.status_message = Some(format!(
            "Imported {} boxes into screen {}",
            parsed.box_count(),
            screen
        ));
        Ok(())
    }

    /// Export a screen's annotations to JSON or YAML.
    fn export_annotations(&mut self, screen: usize, path: PathBuf) -> Result<()> {
        let screen_ref = self
            .workspace
            .screen(screen)
            .with_context(|| format!("No screen {}", screen))?;
        serialization::export_annotations(screen_ref.store().annotations(), &path)
            .with_context(|| format!("Failed to export {}", path.display()))?;
        self.status_message = Some(format!("Exported screen {} to {}", screen, path.display()));
        Ok(())
    }

    /// Replace a screen's annotations with a JSON or YAML export.
    fn load_annotations(&mut self, screen: usize, path: PathBuf) -> Result<()> {
        let annotations = serialization::import_annotations(&path)
            .with_context(|| format!("Failed to load {}", path.display()))?;
        let count = annotations.rectangle_count();
        if !self.workspace.load_annotations(screen, annotations) {
            anyhow::bail!("No screen {}", screen);
        }
        self.status_message = Some(format!("Loaded {} rectangles into screen {}", count, screen));
        Ok(())
    }

    fn install_texture(&mut self, ctx: &egui::Context, screen: usize, path: String, image: &FrameImage) {
        let color_image = egui::ColorImage::from_rgba_unmultiplied(image.size(), &image.pixels);
        let texture = ctx.load_texture(
            format!("screen_{}", screen),
            color_image,
            egui::TextureOptions::LINEAR,
        );
        self.textures.insert(
            screen,
            ScreenTexture {
                path,
                size: (image.width, image.height),
                texture,
            },
        );
    }

    /// Pick up a finished project or session load.
    fn poll_project_load(&mut self, ctx: &egui::Context) {
        let Some(load) = self.project_load.as_ref() else {
            return;
        };
        let LoadPoll::Ready(result) = load.poll() else {
            return;
        };
        log::debug!("Project load {} finished", load.generation());
        self.project_load = None;
        self.loading_message = None;

        match result {
            Ok(Loaded::NewScreen(project, first)) => {
                let path = project.frames.first().cloned().unwrap_or_default();
                match self.workspace.add_screen(project) {
                    Some(screen) => {
                        self.install_texture(ctx, screen, path, &first);
                        self.active_screen = screen;
                    }
                    None => {
                        self.status_message = Some("All screens are in use".to_string());
                    }
                }
            }
            Ok(Loaded::Session(dir, projects)) => {
                log::info!("Opened session {} with {} projects", dir.display(), projects.len());
                self.session_projects = projects.iter().map(|p| p.id.clone()).collect();
                let config = self.workspace.config().clone();
                self.workspace = Workspace::from_projects(config, projects);
                self.textures.clear();
                self.frame_requests.clear();
                self.failed_frames.clear();
                self.active_screen = 1;
                self.session_dir = Some(dir);
            }
            Err(e) => {
                log::error!("Load failed: {}", e);
                self.status_message = Some(format!("Error: {}", e));
            }
        }
    }

    /// Keep each screen's texture in step with its current frame.
    fn sync_frame_textures(&mut self, ctx: &egui::Context) {
        let timeout = self.workspace.config().media.load_timeout();
        let wanted: Vec<(usize, String)> = self
            .workspace
            .screens()
            .iter()
            .filter_map(|s| s.current_frame_path().map(|p| (s.number(), p.to_string())))
            .collect();

        for (screen, path) in wanted {
            let step = frame_step(
                self.textures.get(&screen).map(|t| t.path.as_str()),
                self.frame_requests.get(&screen).map(|r| r.path.as_str()),
                self.failed_frames.get(&screen).map(String::as_str),
                &path,
            );
            match step {
                FrameStep::Shown | FrameStep::Failed => {
                    self.frame_requests.remove(&screen);
                }
                FrameStep::Request => {
                    self.failed_frames.remove(&screen);
                    let generation = self.generation();
                    let frame_path = PathBuf::from(&path);
                    let load = PendingLoad::spawn(generation, timeout, move || media::load_image(&frame_path));
                    self.frame_requests.insert(screen, FrameRequest { path, load });
                }
                FrameStep::Poll => {
                    let Some(request) = self.frame_requests.get(&screen) else {
                        continue;
                    };
                    let LoadPoll::Ready(result) = request.load.poll() else {
                        continue;
                    };
                    log::debug!("Screen {}: frame load {} finished", screen, request.load.generation());
                    let Some(request) = self.frame_requests.remove(&screen) else {
                        continue;
                    };
                    match result {
                        Ok(image) => self.install_texture(ctx, screen, request.path, &image),
                        Err(e) => {
                            log::error!("Screen {}: failed to load {}: {}", screen, request.path, e);
                            self.status_message = Some(format!("Error: {}", e));
                            self.failed_frames.insert(screen, request.path);
                        }
                    }
                }
            }
        }

        if !self.frame_requests.is_empty() {
            ctx.request_repaint();
        }
    }

    fn advance_playback(&mut self, ctx: &egui::Context) {
        if !self.workspace.is_playing() {
            return;
        }
        let interval = self.workspace.config().playback.interval();
        if self.last_tick.elapsed() >= interval {
            self.workspace.tick();
            self.last_tick = Instant::now();
        }
        ctx.request_repaint_after(interval);
    }

    fn apply_canvas_action(&mut self, ctx: &egui::Context, screen: usize, action: canvas::CanvasAction) {
        let hover = match action {
            canvas::CanvasAction::PointerDown(button, point) => {
                self.active_screen = screen;
                self.workspace.pointer_down(screen, button, point);
                None
            }
            canvas::CanvasAction::PointerMove(point) => {
                self.workspace.pointer_move(screen, point);
                Some(point)
            }
            canvas::CanvasAction::Hover(point) => Some(point),
            canvas::CanvasAction::PointerUp => {
                for number in 1..=self.workspace.screens().len() {
                    self.workspace.pointer_up(number);
                }
                None
            }
        };

        if let Some(point) = hover {
            let icon = match self.workspace.hover_cursor(screen, point) {
                CursorHint::Default => return,
                CursorHint::Move => egui::CursorIcon::Move,
                CursorHint::ResizeNwSe => egui::CursorIcon::ResizeNwSe,
                CursorHint::ResizeNeSw => egui::CursorIcon::ResizeNeSw,
            };
            ctx.set_cursor_icon(icon);
        }
    }

    fn timeline_state(&self) -> timeline::TimelineState {
        timeline::TimelineState {
            playing: self.workspace.is_playing(),
            can_previous: !self.workspace.all_at_start(),
            can_next: !self.workspace.all_at_end(),
            screens: self
                .workspace
                .screens()
                .iter()
                .map(|s| (s.number(), s.local_frame(), s.frame_count()))
                .collect(),
            total_frames: self.workspace.layout().total_frames(),
        }
    }

    fn file_menu(&mut self, ui: &mut egui::Ui, ctx: &egui::Context) {
        if ui.button("Open Frames...").clicked() {
            if let Some(paths) = rfd::FileDialog::new()
                .add_filter("Images", media::IMAGE_EXTENSIONS)
                .pick_files()
            {
                self.open_frames(paths);
            }
            ui.close_menu();
        }
        if ui.button("Open Frame Folder...").clicked() {
            if let Some(dir) = rfd::FileDialog::new().pick_folder() {
                self.open_frame_folder(dir);
            }
            ui.close_menu();
        }
        ui.separator();
        if ui.button("Open Session...").clicked() {
            if let Some(dir) = rfd::FileDialog::new().pick_folder() {
                self.open_session(dir);
            }
            ui.close_menu();
        }
        let can_save = !self.workspace.screens().is_empty();
        if ui.add_enabled(can_save, egui::Button::new("Save Session")).clicked() {
            let dir = self
                .session_dir
                .clone()
                .or_else(|| rfd::FileDialog::new().pick_folder());
            if let Some(dir) = dir {
                let result = self.save_session(dir);
                self.report(result);
            }
            ui.close_menu();
        }
        ui.separator();

        let numbers: Vec<usize> = self.workspace.screens().iter().map(|s| s.number()).collect();
        for screen in numbers {
            ui.menu_button(format!("Screen {}", screen), |ui| {
                if ui.button("Import CVAT XML...").clicked() {
                    if let Some(path) = rfd::FileDialog::new()
                        .add_filter("XML", &["xml"])
                        .pick_file()
                    {
                        let result = self.import_cvat(screen, path);
                        self.report(result);
                    }
                    ui.close_menu();
                }
                if ui.button("Load Annotations...").clicked() {
                    if let Some(path) = rfd::FileDialog::new()
                        .add_filter("Annotations", &["json", "yaml", "yml"])
                        .pick_file()
                    {
                        let result = self.load_annotations(screen, path);
                        self.report(result);
                    }
                    ui.close_menu();
                }
                ui.separator();
                if ui.button("Export as JSON...").clicked() {
                    if let Some(path) = rfd::FileDialog::new()
                        .add_filter("JSON", &["json"])
                        .set_file_name("annotations.json")
                        .save_file()
                    {
                        let result = self.export_annotations(screen, path);
                        self.report(result);
                    }
                    ui.close_menu();
                }
                if ui.button("Export as YAML...").clicked() {
                    if let Some(path) = rfd::FileDialog::new()
                        .add_filter("YAML", &["yaml", "yml"])
                        .set_file_name("annotations.yaml")
                        .save_file()
                    {
                        let result = self.export_annotations(screen, path);
                        self.report(result);
                    }
                    ui.close_menu();
                }
            });
        }

        if ui.button("Close All").clicked() {
            if self.workspace.is_dirty() {
                log::warn!("Closing screens with unsaved changes");
            }
            self.workspace.clear();
            self.textures.clear();
            self.frame_requests.clear();
            self.failed_frames.clear();
            self.session_dir = None;
            self.session_projects.clear();
            ui.close_menu();
        }
        ui.separator();
        if ui.button("Quit").clicked() {
            if self.workspace.is_dirty() {
                log::warn!("Quitting with unsaved changes");
            }
            ctx.send_viewport_cmd(egui::ViewportCommand::Close);
        }
    }

    fn show_screens(&self, ui: &mut egui::Ui) -> Vec<(usize, canvas::CanvasAction)> {
        let numbers: Vec<usize> = self.workspace.screens().iter().map(|s| s.number()).collect();
        let mut collected = Vec::new();
        let cols = if numbers.len() > 1 { 2 } else { 1 };
        let rows = numbers.len().div_ceil(cols).max(1);
        let row_height = ui.available_height() / rows as f32;

        for row in numbers.chunks(cols) {
            let size = egui::vec2(ui.available_width(), row_height);
            ui.allocate_ui(size, |ui| {
                ui.columns(cols, |columns| {
                    for (column, &screen) in columns.iter_mut().zip(row) {
                        let texture = self.textures.get(&screen);
                        let ops = self.workspace.draw_list(screen);
                        let actions = canvas::show(
                            column,
                            screen,
                            texture.map(|t| &t.texture),
                            texture.map(|t| t.size),
                            &ops,
                        );
                        collected.extend(actions.into_iter().map(|a| (screen, a)));
                    }
                });
            });
        }
        collected
    }
}

impl eframe::App for FramemarkApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.poll_project_load(ctx);
        self.advance_playback(ctx);
        self.sync_frame_textures(ctx);

        // Request repaint if still loading (to update spinner)
        if self.loading_message.is_some() {
            ctx.request_repaint();
        }

        // Top menu bar
        egui::TopBottomPanel::top("menu_bar").show(ctx, |ui| {
            egui::menu::bar(ui, |ui| {
                ui.menu_button("File", |ui| self.file_menu(ui, ctx));
            });
        });

        // Toolbar
        let collected = self
            .workspace
            .screen(self.active_screen)
            .map_or(0, |s| s.tool().points().len());
        let chosen = egui::TopBottomPanel::top("toolbar")
            .show(ctx, |ui| toolbar::show(ui, self.workspace.mode(), collected))
            .inner;
        if let Some(mode) = chosen {
            self.workspace.set_mode(mode);
        }

        // Timeline and status bar
        let state = self.timeline_state();
        let timeline_action = egui::TopBottomPanel::bottom("timeline")
            .show(ctx, |ui| {
                let action = timeline::show(ui, &state, &mut self.seek_target);
                if let Some(ref message) = self.status_message {
                    ui.separator();
                    ui.label(egui::RichText::new(message).weak());
                }
                action
            })
            .inner;

        match timeline_action {
            timeline::TimelineAction::Previous => {
                self.workspace.previous_frame();
            }
            timeline::TimelineAction::Next => {
                self.workspace.next_frame();
            }
            timeline::TimelineAction::TogglePlay => {
                if self.workspace.is_playing() {
                    self.workspace.stop();
                } else if self.workspace.play() {
                    self.last_tick = Instant::now();
                } else {
                    self.status_message = Some("Nothing to play".to_string());
                }
            }
            timeline::TimelineAction::Seek(global) => {
                self.workspace.seek(global);
            }
            timeline::TimelineAction::None => {}
        }

        // Objects panel (right side)
        let objects = self.workspace.screen_rectangles();
        let properties_action = egui::SidePanel::right("objects")
            .default_width(250.0)
            .show(ctx, |ui| properties::show(ui, &objects))
            .inner;

        if let properties::PropertiesAction::SetStatus { screen, index, status } = properties_action {
            if let Some(applied) = self.workspace.status_action(screen, index, status) {
                log::info!("Object {}_{} is now {:?}", screen, index + 1, applied);
            }
        }

        // Keyboard: Delete removes the selection, Escape returns to Drag
        if !ctx.wants_keyboard_input() {
            if ctx.input(|i| i.key_pressed(egui::Key::Delete) || i.key_pressed(egui::Key::Backspace)) {
                self.workspace.delete_selected(self.active_screen);
            }
            if ctx.input(|i| i.key_pressed(egui::Key::Escape)) {
                self.workspace.set_mode(CreationMode::Drag);
            }
        }

        // Screens (center)
        let actions = egui::CentralPanel::default()
            .show(ctx, |ui| {
                if let Some(ref message) = self.loading_message {
                    ui.centered_and_justified(|ui| {
                        ui.vertical_centered(|ui| {
                            ui.add_space(20.0);
                            ui.spinner();
                            ui.add_space(10.0);
                            ui.label(
                                egui::RichText::new(message)
                                    .size(16.0)
                                    .color(egui::Color32::from_gray(200)),
                            );
                        });
                    });
                    Vec::new()
                } else if self.workspace.screens().is_empty() {
                    ui.centered_and_justified(|ui| {
                        ui.vertical_centered(|ui| {
                            ui.add_space(20.0);
                            ui.heading(
                                egui::RichText::new("FRAMEMARK")
                                    .size(32.0)
                                    .color(egui::Color32::from_gray(200)),
                            );
                            ui.add_space(20.0);
                            ui.label(
                                egui::RichText::new("File → Open Frames... to begin annotating")
                                    .color(egui::Color32::from_gray(180)),
                            );
                        });
                    });
                    Vec::new()
                } else {
                    self.show_screens(ui)
                }
            })
            .inner;

        for (screen, action) in actions {
            self.apply_canvas_action(ctx, screen, action);
        }
    }
}
