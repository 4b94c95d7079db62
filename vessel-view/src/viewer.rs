//! Interactive vessel-synthesis viewer built with eframe/egui.
//!
//! This module defines [`Viewer`], which owns a [`Synthesizer`] together
//! with its tissue domain, steps the coupled arterial/venous simulation
//! frame by frame, and draws both systems projected onto the XY plane.

use eframe::App;
use glam::Vec3;
use tracing::warn;
use vessel_core::{
    Domain, Settings, SphereDomain, Synthesizer, System,
    domain::DEFAULT_SEED,
};

/// Which tool is currently selected for spawning objects in the scene.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum SpawnTool {
    /// Start a new arterial tree at the clicked position.
    ArterialRoot,
    /// Start a new venous tree at the clicked position.
    VenousRoot,
    /// Scatter a cloud of arterial attractions around the clicked position.
    Attractions,
}

/// Radius of the spherical tissue domain the viewer simulates.
const DOMAIN_RADIUS: f32 = 60.0;

fn make_domain() -> SphereDomain {
    let mut domain = SphereDomain::new(Vec3::ZERO, DOMAIN_RADIUS);
    domain.seed(DEFAULT_SEED);
    domain
}

fn make_settings() -> Settings {
    let mut settings = Settings::default();
    settings.sample_count = 60;
    for sys in &mut settings.systems {
        sys.influence_attr = 12.0;
        sys.kill_attr = 2.0;
        sys.birth_attr = 1.5;
        sys.birth_node = 1.5;
        sys.growth_distance = 1.0;
        sys.term_radius = 0.35;
        sys.percept_angle = 110.0;
        sys.parent_inertia = 0.4;
        sys.bif_thresh = 12.0;
    }
    settings
}

/// Main application state for the interactive viewer.
///
/// The typical per-frame update is:
/// 1. Handle UI interactions / input.
/// 2. If `running` and enough time has passed, call [`Viewer::step_once`].
/// 3. Render both vessel systems and their pending attractions.
pub struct Viewer {
    synth: Synthesizer,
    domain: SphereDomain,
    settings: Settings,

    running: bool,
    step_count: usize,
    /// Set when growth escaped the index bounds; stops the simulation.
    error: Option<String>,

    zoom: f32,
    pan: egui::Vec2,

    tool: SpawnTool,
    spawn_count: usize,
    spawn_radius: f32,
    /// Bumped per attraction cloud so consecutive clicks differ.
    spawn_seed: u32,

    step_interval: f64,
    last_step_time: f64,
    last_step_dt: f64,
}

impl Viewer {
    /// Creates a viewer with one arterial and one venous root on opposite
    /// sides of the domain center.
    pub fn new() -> Self {
        let domain = make_domain();
        let settings = make_settings();

        let mut synth = Synthesizer::new(&domain);
        synth.set_settings(settings);
        Self::place_default_roots(&mut synth);
        synth.begin();

        Self {
            synth,
            domain,
            settings,
            running: false,
            step_count: 0,
            error: None,
            zoom: 5.0,
            pan: egui::vec2(0.0, 0.0),
            tool: SpawnTool::Attractions,
            spawn_count: 200,
            spawn_radius: 15.0,
            spawn_seed: 1,
            step_interval: 0.05,
            last_step_time: 0.0,
            last_step_dt: 0.0,
        }
    }

    fn place_default_roots(synth: &mut Synthesizer) {
        // Both positions are well inside the domain; the inserts cannot
        // fail.
        let _ = synth.create_root(System::Arterial, Vec3::new(-20.0, 0.0, 0.0));
        let _ = synth.create_root(System::Venous, Vec3::new(20.0, 0.0, 0.0));
    }

    /// Resets the simulation to the initial two-root state, keeping the
    /// current camera and tool configuration.
    fn reset(&mut self) {
        self.domain = make_domain();
        let mut synth = Synthesizer::new(&self.domain);
        synth.set_settings(self.settings);
        Self::place_default_roots(&mut synth);
        synth.begin();

        self.synth = synth;
        self.step_count = 0;
        self.error = None;
        self.running = false;
    }

    /// Advances the coupled simulation by a single step.
    ///
    /// Stops and records the error if growth escapes the index bounds.
    fn step_once(&mut self) {
        if self.error.is_some() {
            return;
        }
        match self.synth.advance(&mut self.domain) {
            Ok(()) => self.step_count += 1,
            Err(err) => {
                warn!(%err, "growth escaped the index bounds, stopping");
                self.error = Some(err.to_string());
                self.running = false;
            }
        }
    }

    /// Applies the edited settings to the synthesizer.
    ///
    /// Re-derives the runtime parameters, which also resets any
    /// accumulated domain-growth scaling.
    fn apply_settings(&mut self) {
        self.synth.set_settings(self.settings);
    }

    /// Converts a world-space position (XY projection) to screen-space.
    fn world_to_screen(&self, p: Vec3, rect: egui::Rect) -> egui::Pos2 {
        let center = rect.center();
        egui::pos2(
            center.x + p.x * self.zoom + self.pan.x,
            center.y - p.y * self.zoom + self.pan.y,
        )
    }

    /// Converts a screen-space position back to a world-space position on
    /// the z = 0 plane.
    fn screen_to_world(&self, p: egui::Pos2, rect: egui::Rect) -> Vec3 {
        let center = rect.center();
        let x = (p.x - center.x - self.pan.x) / self.zoom;
        let y = (center.y - p.y + self.pan.y) / self.zoom;
        Vec3::new(x, y, 0.0)
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

    /// Helper to draw a labeled `usize` [`egui::DragValue`].
    fn labeled_drag_usize(
        ui: &mut egui::Ui,
        label: &str,
        value: &mut usize,
        range: std::ops::RangeInclusive<usize>,
        speed: f64,
    ) {
        ui.horizontal(|ui| {
            ui.label(label);
            ui.add(egui::DragValue::new(value).range(range).speed(speed));
        });
    }

    /// Builds the top panel UI (run controls, stepping, zoom).
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
                        .range(0.01..=1.0)
                        .speed(0.01),
                );

                if ui.button("Step").clicked() {
                    let now = ctx.input(|i| i.time);
                    if self.last_step_time > 0.0 {
                        self.last_step_dt = now - self.last_step_time;
                    }
                    self.step_once();
                    self.last_step_time = now;
                }

                if ui.button("Reset").clicked() {
                    self.reset();
                }

                ui.separator();
                ui.add(egui::Slider::new(&mut self.zoom, 0.5..=20.0).text("Zoom"));

                if let Some(err) = &self.error {
                    ui.separator();
                    ui.colored_label(egui::Color32::RED, err.as_str());
                }
            });
        });
    }

    /// Builds the bottom status bar (step count, node and attraction
    /// counts per system).
    fn ui_status_bar(&self, ctx: &egui::Context) {
        egui::TopBottomPanel::bottom("status_bar").show(ctx, |ui| {
            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                ui.label(format!("dt last = {:.3} s", self.last_step_dt));
                ui.separator();
                ui.label(format!("step = {}", self.step_count));
                ui.label(format!(
                    "arterial: {} nodes / {} attrs",
                    self.synth.node_count(System::Arterial),
                    self.synth.attraction_count(System::Arterial)
                ));
                ui.label(format!(
                    "venous: {} nodes / {} attrs",
                    self.synth.node_count(System::Venous),
                    self.synth.attraction_count(System::Venous)
                ));
            });
        });
    }

    fn ui_system_settings(ui: &mut egui::Ui, label: &str, sys: &mut vessel_core::SystemSettings) {
        ui.separator();
        ui.label(label);
        Self::labeled_drag_f32(ui, "influence:", &mut sys.influence_attr, 0.0..=100.0, 0.2);
        Self::labeled_drag_f32(ui, "kill:", &mut sys.kill_attr, 0.0..=50.0, 0.1);
        Self::labeled_drag_f32(ui, "birth attr:", &mut sys.birth_attr, 0.0..=50.0, 0.1);
        Self::labeled_drag_f32(ui, "birth node:", &mut sys.birth_node, 0.0..=50.0, 0.1);
        Self::labeled_drag_f32(ui, "growth dist:", &mut sys.growth_distance, 0.01..=20.0, 0.05);
        Self::labeled_drag_f32(ui, "term radius:", &mut sys.term_radius, 0.01..=5.0, 0.01);
        Self::labeled_drag_f32(ui, "percept angle:", &mut sys.percept_angle, 0.0..=360.0, 1.0);
        Self::labeled_drag_f32(ui, "inertia:", &mut sys.parent_inertia, 0.0..=1.0, 0.01);
        Self::labeled_drag_f32(ui, "bif thresh:", &mut sys.bif_thresh, -1.0..=180.0, 0.5);
    }

    /// Builds the right-hand configuration panel for simulation parameters.
    fn ui_config_panel(&mut self, ctx: &egui::Context) {
        egui::SidePanel::right("config_panel")
            .resizable(true)
            .default_width(230.0)
            .show(ctx, |ui| {
                ui.heading("Config");

                ui.separator();
                Self::labeled_drag_usize(
                    ui,
                    "samples / step:",
                    &mut self.settings.sample_count,
                    0..=2000,
                    1.0,
                );

                Self::ui_system_settings(
                    ui,
                    "Arterial",
                    &mut self.settings.systems[System::Arterial.index()],
                );
                Self::ui_system_settings(
                    ui,
                    "Venous",
                    &mut self.settings.systems[System::Venous.index()],
                );

                ui.separator();
                ui.label("Spawning");
                Self::labeled_drag_usize(ui, "count:", &mut self.spawn_count, 1..=2000, 1.0);
                Self::labeled_drag_f32(ui, "radius:", &mut self.spawn_radius, 1.0..=60.0, 0.5);

                ui.separator();
                ui.horizontal(|ui| {
                    if ui.button("Apply").clicked() {
                        self.apply_settings();
                    }
                    if ui.button("Defaults").clicked() {
                        self.settings = make_settings();
                        self.apply_settings();
                    }
                });
            });
    }

    /// Builds the small floating toolbar for choosing the spawn tool.
    fn ui_toolbar(&mut self, ctx: &egui::Context) {
        egui::Area::new("toolbar".into())
            .anchor(egui::Align2::LEFT_TOP, egui::vec2(10.0, 80.0))
            .movable(false)
            .show(ctx, |ui| {
                egui::Frame::new()
                    .fill(egui::Color32::from_rgba_unmultiplied(0, 0, 0, 32))
                    .show(ui, |ui| {
                        ui.vertical(|ui| {
                            if ui
                                .selectable_label(
                                    matches!(self.tool, SpawnTool::ArterialRoot),
                                    "◎ Arterial root",
                                )
                                .clicked()
                            {
                                self.tool = SpawnTool::ArterialRoot;
                            }

                            if ui
                                .selectable_label(
                                    matches!(self.tool, SpawnTool::VenousRoot),
                                    "◎ Venous root",
                                )
                                .clicked()
                            {
                                self.tool = SpawnTool::VenousRoot;
                            }

                            if ui
                                .selectable_label(
                                    matches!(self.tool, SpawnTool::Attractions),
                                    "○ Attractions",
                                )
                                .clicked()
                            {
                                self.tool = SpawnTool::Attractions;
                            }
                        });
                    });
            });
    }

    /// Handles a click of the active spawn tool at a world position on the
    /// z = 0 plane. Positions outside the domain extents are ignored.
    fn spawn_at(&mut self, center: Vec3) {
        match self.tool {
            SpawnTool::ArterialRoot => {
                if self.synth.create_root(System::Arterial, center).is_err() {
                    warn!(%center, "root outside the domain, ignored");
                }
            }
            SpawnTool::VenousRoot => {
                if self.synth.create_root(System::Venous, center).is_err() {
                    warn!(%center, "root outside the domain, ignored");
                }
            }
            SpawnTool::Attractions => {
                // A one-shot seeded sampler keeps clicks reproducible while
                // differing from each other.
                let mut cloud = SphereDomain::new(center, self.spawn_radius);
                cloud.seed(self.spawn_seed);
                self.spawn_seed = self.spawn_seed.wrapping_add(1);

                let mut points = Vec::new();
                cloud.samples(self.spawn_count, &mut points);
                for p in points {
                    // Birth filters apply; points outside the domain are
                    // skipped.
                    let _ = self.synth.try_attr(System::Arterial, p);
                }
            }
        }
    }

    fn draw_forest(&self, painter: &egui::Painter, rect: egui::Rect, sys: System) {
        let (edge_color, node_color) = match sys {
            System::Arterial => (egui::Color32::LIGHT_RED, egui::Color32::RED),
            System::Venous => (egui::Color32::LIGHT_BLUE, egui::Color32::BLUE),
        };

        let forest = self.synth.forest(sys);
        for tree in &forest.trees {
            for node in &tree.nodes {
                let a = self.world_to_screen(node.pos, rect);
                for &child in &node.children {
                    let b = self.world_to_screen(tree.nodes[child].pos, rect);
                    let width = (tree.nodes[child].radius * self.zoom).clamp(1.0, 12.0);
                    painter.line_segment([a, b], egui::Stroke::new(width, edge_color));
                }
                if node.parent.is_none() {
                    painter.circle_filled(a, (self.zoom * 0.8).max(3.0), node_color);
                }
            }
        }
    }

    fn draw_attractions(&self, painter: &egui::Painter, rect: egui::Rect, sys: System) {
        let color = match sys {
            System::Arterial => egui::Color32::from_rgb(255, 180, 180),
            System::Venous => egui::Color32::from_rgb(180, 180, 255),
        };
        self.synth.for_each_attraction(sys, |pos| {
            let p = self.world_to_screen(pos, rect);
            painter.circle_filled(p, 1.5, color);
        });
    }

    /// Draws the domain outline and a hint for the attraction cloud tool.
    fn ui_tool_hint(&self, painter: &egui::Painter, rect: egui::Rect, hover_world: Option<Vec3>) {
        let domain_center = self.world_to_screen(Vec3::ZERO, rect);
        painter.circle_stroke(
            domain_center,
            DOMAIN_RADIUS * self.zoom,
            egui::Stroke::new(1.0, egui::Color32::DARK_GRAY),
        );

        let Some(center) = hover_world else {
            return;
        };
        let stroke = egui::Stroke::new(1.5, egui::Color32::YELLOW);

        match self.tool {
            SpawnTool::ArterialRoot | SpawnTool::VenousRoot => {
                let p = self.world_to_screen(center, rect);
                painter.circle_filled(p, (self.zoom * 0.8).max(3.0), egui::Color32::GREEN);
            }
            SpawnTool::Attractions => {
                let p = self.world_to_screen(center, rect);
                painter.circle_stroke(p, self.spawn_radius * self.zoom, stroke);
            }
        }
    }

    /// Builds the central panel where the vessel systems are drawn and
    /// interacted with.
    fn ui_central_panel(&mut self, ctx: &egui::Context) {
        egui::CentralPanel::default().show(ctx, |ui| {
            let response = ui.allocate_response(ui.available_size(), egui::Sense::click_and_drag());
            let rect = response.rect;
            let painter = ui.painter_at(rect);

            // Pan with drag.
            if response.dragged() {
                self.pan += response.drag_delta();
            }

            let hover_world = response.hover_pos().map(|p| self.screen_to_world(p, rect));

            // Handle click-based spawning.
            if response.clicked() {
                if let Some(center) = hover_world {
                    self.spawn_at(center);
                }
            }

            // Zoom around the mouse cursor.
            let scroll = ui.ctx().input(|i| i.raw_scroll_delta.y);
            if scroll != 0.0 {
                let pointer_screen = response.hover_pos().unwrap_or(rect.center());
                let world_before = self.screen_to_world(pointer_screen, rect);

                let factor = (1.0 + scroll * 0.001).clamp(0.5, 2.0);
                self.zoom = (self.zoom * factor).clamp(0.5, 20.0);

                let screen_after = self.world_to_screen(world_before, rect);
                self.pan += pointer_screen - screen_after;
            }

            self.draw_attractions(&painter, rect, System::Arterial);
            self.draw_attractions(&painter, rect, System::Venous);
            self.draw_forest(&painter, rect, System::Arterial);
            self.draw_forest(&painter, rect, System::Venous);
            self.ui_tool_hint(&painter, rect, hover_world);

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

impl Default for Viewer {
    fn default() -> Self {
        Self::new()
    }
}

impl App for Viewer {
    /// eframe callback that builds all UI panels for each frame.
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.ui_top_panel(ctx);
        self.ui_status_bar(ctx);
        self.ui_config_panel(ctx);
        self.ui_central_panel(ctx);
        self.ui_toolbar(ctx);
    }
}
