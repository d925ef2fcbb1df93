//! Interactive viewer for wind-swept trees built with eframe/egui.
//!
//! This module defines [`Viewer`], which owns the simulation [`Scene`] and
//! the last recorded frame, and implements [`eframe::App`] to play the
//! scene and expose its settings through an egui UI.

use eframe::App;
use glam::Vec2;
use rand::{SeedableRng, rngs::StdRng};
use tracing::{info, warn};
use windbranch_core::{
    SimResult,
    config::{Config, Layout, MAX_DEPTH_LIMIT},
    render::{CommandBuffer, DrawCommand},
    scene::Scene,
};

use crate::LayoutArg;

/// Main application state for the interactive viewer.
///
/// [`Viewer`] glues together:
/// - The simulation core: a [`Scene`] grown from `config` and `seed`.
/// - The draw instructions of the last frame, replayed on every repaint.
/// - UI state (pan/zoom, timing, pending config edits).
///
/// The typical per-frame update is:
/// 1. Handle UI interactions / input.
/// 2. If `running` is `true` and enough time has passed, call [`Viewer::step_once`].
/// 3. Replay `commands` onto the central panel.
///
/// ### Fields
/// - `scene` - The running scene.
/// - `config` - Settings the next rebuild will use; edited by the side panel.
/// - `seed` - Seed the current scene was grown from.
/// - `commands` - Draw instructions of the most recent frame.
/// - `last_wind` - Wind force applied in the most recent frame.
///
/// - `running` - Whether the simulation is currently auto-advancing.
/// - `zoom` - Zoom factor for canvas-to-screen coordinate mapping.
/// - `pan` - Screen-space pan offset in pixels.
///
/// - `step_interval` - Target time between automatic frames (seconds).
/// - `last_step_time` - Time stamp of the last frame (egui time).
/// - `last_step_dt` - Actual time delta between the last two frames.
pub struct Viewer {
    scene: Scene,
    config: Config,
    seed: u64,
    commands: CommandBuffer,
    last_wind: Vec2,

    running: bool,
    zoom: f32,
    pan: egui::Vec2,

    step_interval: f64,
    last_step_time: f64,
    last_step_dt: f64,
}

/// Grows a fresh scene from `config`, with every random draw taken from `seed`.
fn build_scene(config: &Config, seed: u64) -> SimResult<Scene> {
    let mut rng = StdRng::seed_from_u64(seed);
    let canvas = Vec2::new(config.scene.canvas_width, config.scene.canvas_height);
    Scene::with_perlin(config.clone(), canvas, &mut rng)
}

impl Viewer {
    /// Creates a viewer showing the rest pose of a freshly grown scene.
    ///
    /// ### Errors
    /// Returns the scene setup error if `config` is invalid.
    pub fn new(config: Config, seed: u64) -> SimResult<Self> {
        let scene = build_scene(&config, seed)?;
        let mut commands = CommandBuffer::new();
        scene.render(&mut commands);

        Ok(Self {
            scene,
            config,
            seed,
            commands,
            last_wind: Vec2::ZERO,
            running: true,
            zoom: 1.0,
            pan: egui::vec2(0.0, 0.0),
            step_interval: 1.0 / 60.0,
            last_step_time: 0.0,
            last_step_dt: 0.0,
        })
    }

    /// Regrows the scene from the pending `config` and the current seed.
    ///
    /// If the pending config is invalid, the current scene is kept and the
    /// error is logged.
    fn rebuild(&mut self) {
        match build_scene(&self.config, self.seed) {
            Ok(scene) => {
                info!(
                    "Rebuilt scene with seed {} ({} branches)",
                    self.seed,
                    scene.branch_count()
                );
                self.scene = scene;
                self.scene.render(&mut self.commands);
                self.last_wind = Vec2::ZERO;
            }
            Err(e) => warn!("Keeping previous scene: {e}"),
        }
    }

    fn reseed(&mut self, seed: u64) {
        self.seed = seed;
        self.rebuild();
    }

    /// Advances the scene by one frame and records its draw instructions.
    fn step_once(&mut self) {
        self.last_wind = self.scene.frame(&mut self.commands);
    }

    /// Converts a canvas position to screen-space.
    ///
    /// The canvas is centered inside `rect`, scaled by `zoom` and offset by
    /// `pan`. Canvas and screen both have y pointing down.
    fn world_to_screen(&self, p: Vec2, rect: egui::Rect) -> egui::Pos2 {
        let center = rect.center();
        let half = self.scene.canvas() * 0.5;
        egui::pos2(
            center.x + (p.x - half.x) * self.zoom + self.pan.x,
            center.y + (p.y - half.y) * self.zoom + self.pan.y,
        )
    }

    /// Converts a screen position back to canvas space.
    ///
    /// This is the inverse of [`Viewer::world_to_screen`] (up to floating
    /// point rounding).
    fn screen_to_world(&self, p: egui::Pos2, rect: egui::Rect) -> Vec2 {
        let center = rect.center();
        let half = self.scene.canvas() * 0.5;
        Vec2::new(
            (p.x - center.x - self.pan.x) / self.zoom + half.x,
            (p.y - center.y - self.pan.y) / self.zoom + half.y,
        )
    }

    /// Helper to draw a labeled `f32` [`egui::DragValue`].
    fn labeled_drag_f32(
        ui: &mut egui::Ui,
        label: &str,
        value: &mut f32,
        range: std::ops::RangeInclusive<f32>,
        speed: f64,
    ) {
        ui.horizontal(|ui| {
            ui.label(label);
            ui.add(egui::DragValue::new(value).range(range).speed(speed));
        });
    }

    /// Builds the top panel UI (run controls, stepping, reseeding, zoom).
    fn ui_top_panel(&mut self, ctx: &egui::Context) {
        egui::TopBottomPanel::top("top_panel").show(ctx, |ui| {
            ui.horizontal(|ui| {
                if ui
                    .button(if self.running { "⏸ Pause" } else { "▶ Run" })
                    .clicked()
                {
                    self.running = !self.running;
                }

                ui.add(
                    egui::DragValue::new(&mut self.step_interval)
                        .prefix("dt target = ")
                        .range(0.005..=1.0)
                        .speed(0.005),
                );

                if ui.button("Step").clicked() {
                    self.step_once();
                }

                if ui.button("Reseed").clicked() {
                    self.reseed(rand::random());
                }

                ui.separator();
                ui.add(egui::Slider::new(&mut self.zoom, 0.1..=10.0).text("Zoom"));
            });
        });
    }

    /// Builds the bottom status bar (frame, time, wind, sizes).
    fn ui_status_bar(&self, ctx: &egui::Context) {
        egui::TopBottomPanel::bottom("status_bar").show(ctx, |ui| {
            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                ui.label(format!("dt last = {:.3} s", self.last_step_dt));
                ui.separator();
                ui.label(format!("wind = {:+.3}", self.last_wind.x));
                ui.label(format!("t = {:.2}", self.scene.time()));
                ui.label(format!("frame = {}", self.scene.frame_index()));
                ui.separator();
                ui.label(format!("branches = {}", self.scene.branch_count()));
                ui.label(format!("trees = {}", self.scene.trees().len()));
                ui.label(format!("seed = {}", self.seed));
            });
        });
    }

    /// Builds the right-hand panel for editing and applying the config.
    fn ui_config_panel(&mut self, ctx: &egui::Context) {
        egui::SidePanel::right("config_panel")
            .resizable(true)
            .default_width(220.0)
            .show(ctx, |ui| {
                ui.heading("Config");

                ui.separator();
                ui.label("Layout");
                let current = match self.config.scene.layout {
                    Layout::Fan { .. } => LayoutArg::Fan,
                    Layout::GroundRow { .. } => LayoutArg::GroundRow,
                };
                for (arg, text) in [(LayoutArg::Fan, "Fan"), (LayoutArg::GroundRow, "Ground row")] {
                    if ui.radio(current == arg, text).clicked() && current != arg {
                        self.config.scene.layout = arg.to_layout();
                    }
                }

                ui.separator();
                ui.label("Wind");
                let wind = &mut self.config.wind;
                Self::labeled_drag_f32(ui, "base:", &mut wind.base_amplitude, 0.0..=5.0, 0.01);
                Self::labeled_drag_f32(ui, "gust:", &mut wind.gust_amplitude, 0.0..=5.0, 0.01);
                Self::labeled_drag_f32(
                    ui,
                    "gust freq:",
                    &mut wind.gust_frequency,
                    0.0..=20.0,
                    0.05,
                );
                Self::labeled_drag_f32(ui, "time step:", &mut wind.time_step, 0.0..=0.2, 0.001);

                ui.separator();
                ui.label("Growth");
                let growth = &mut self.config.growth;
                ui.horizontal(|ui| {
                    ui.label("max depth:");
                    ui.add(
                        egui::DragValue::new(&mut growth.max_depth).range(0..=MAX_DEPTH_LIMIT),
                    );
                });
                Self::labeled_drag_f32(ui, "spread°:", &mut growth.spread_deg, 0.0..=90.0, 0.5);
                Self::labeled_drag_f32(ui, "damping:", &mut growth.damping, 0.01..=1.0, 0.005);

                ui.separator();
                if ui.button("Apply").clicked() {
                    self.rebuild();
                }
                if ui.button("Reset cfg to default").clicked() {
                    self.config = Config::default();
                }
            });
    }

    /// Replays the recorded frame onto the painter.
    fn paint_commands(&self, painter: &egui::Painter, rect: egui::Rect) {
        let canvas = egui::Rect::from_two_pos(
            self.world_to_screen(Vec2::ZERO, rect),
            self.world_to_screen(self.scene.canvas(), rect),
        );

        for command in self.commands.commands() {
            match *command {
                DrawCommand::Clear { gray } => {
                    painter.rect_filled(canvas, egui::CornerRadius::ZERO, egui::Color32::from_gray(gray));
                }
                DrawCommand::Line {
                    from,
                    to,
                    stroke_weight,
                } => {
                    let a = self.world_to_screen(from, rect);
                    let b = self.world_to_screen(to, rect);
                    painter.line_segment(
                        [a, b],
                        egui::Stroke::new(stroke_weight * self.zoom, egui::Color32::BLACK),
                    );
                }
            }
        }
    }

    /// Builds the central panel where the canvas is drawn and panned/zoomed.
    fn ui_central_panel(&mut self, ctx: &egui::Context) {
        egui::CentralPanel::default().show(ctx, |ui| {
            let response = ui.allocate_response(ui.available_size(), egui::Sense::drag());
            let rect = response.rect;
            let painter = ui.painter_at(rect);

            // Pan with drag.
            if response.dragged() {
                self.pan += response.drag_delta();
            }

            // Zoom around the mouse cursor.
            let scroll = ui.ctx().input(|i| i.raw_scroll_delta.y);
            if scroll != 0.0 {
                let pointer_screen = response.hover_pos().unwrap_or(rect.center());
                let world_before = self.screen_to_world(pointer_screen, rect);

                let factor = (1.0 + scroll * 0.001).clamp(0.5, 2.0);
                self.zoom = (self.zoom * factor).clamp(0.1, 10.0);

                let screen_after = self.world_to_screen(world_before, rect);
                self.pan += pointer_screen - screen_after;
            }

            self.paint_commands(&painter, rect);

            // Auto-run simulation if requested.
            if self.running {
                let now = ctx.input(|i| i.time);
                let elapsed = now - self.last_step_time;
                if elapsed >= self.step_interval {
                    if self.last_step_time > 0.0 {
                        self.last_step_dt = elapsed;
                    }
                    self.step_once();
                    self.last_step_time = now;
                }

                ctx.request_repaint();
            }
        });
    }
}

impl App for Viewer {
    /// eframe callback that builds all UI panels for each frame.
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.ui_top_panel(ctx);
        self.ui_status_bar(ctx);
        self.ui_config_panel(ctx);
        self.ui_central_panel(ctx);
    }
}
