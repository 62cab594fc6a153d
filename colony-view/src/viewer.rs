//! Interactive space-colonization viewer built with eframe/egui.
//!
//! [`Viewer`] owns a [`GrowthEngine`] plus a draft [`Config`], steps the
//! simulation on a timer, and, once the attractor cloud is exhausted, runs
//! the reduction pipeline and paints the finished polylines through an
//! [`egui::Painter`]-backed [`Renderer`] implementation.

use colony_core::config::{Config, DistortionMode, SteeringMode};
use colony_core::engine::GrowthEngine;
use colony_core::polyline::Polyline;
use colony_core::render::{DrawStyle, Renderer, present};
use colony_core::types::NodeId;
use eframe::App;
use glam::Vec2;
use rand::{Rng, SeedableRng, rngs::SmallRng};

/// Main application state.
pub struct Viewer {
    engine: GrowthEngine,
    /// Parameters being edited in the panel; applied on reset.
    cfg: Config,
    /// Reduced strokes, present once the run has finished.
    polylines: Option<Vec<Polyline>>,
    style: DrawStyle,
    error: Option<String>,

    running: bool,
    show_attractors: bool,
    zoom: f32,
    pan: egui::Vec2,

    last_new_ids: Vec<NodeId>,

    step_interval: f64,
    last_step_time: f64,
    last_step_dt: f64,
}

impl Viewer {
    pub fn new() -> Self {
        let cfg = Config::default();
        let engine = GrowthEngine::new(cfg).expect("default config is valid");

        Self {
            engine,
            cfg,
            polylines: None,
            style: DrawStyle::Line,
            error: None,
            running: false,
            show_attractors: true,
            zoom: 1.5,
            pan: egui::vec2(0.0, 0.0),
            last_new_ids: Vec::with_capacity(16),
            step_interval: 0.05,
            last_step_time: 0.0,
            last_step_dt: 0.0,
        }
    }

    /// Rebuilds the engine from the draft config, discarding the grown
    /// structure. Keeps the old engine (and reports why) when the draft is
    /// invalid.
    fn reset(&mut self) {
        match GrowthEngine::new(self.cfg) {
            Ok(engine) => {
                self.engine = engine;
                self.error = None;
            }
            Err(e) => self.error = Some(e.to_string()),
        }
        self.polylines = None;
        self.last_new_ids.clear();
        self.running = false;
    }

    /// One simulation tick; finishes automatically once every attractor is
    /// consumed.
    fn step_once(&mut self) {
        if self.polylines.is_some() {
            return;
        }
        self.last_new_ids = self.engine.grow();
        if self.engine.is_exhausted() {
            self.finish();
        }
    }

    /// Stops growing and runs the reduction pipeline.
    fn finish(&mut self) {
        self.polylines = Some(self.engine.reduce());
        self.running = false;
    }

    fn canvas_center(&self) -> Vec2 {
        let cfg = self.engine.current_config();
        Vec2::new(cfg.width, cfg.height) * 0.5
    }

    /// Canvas coordinates (y down) to screen coordinates.
    fn world_to_screen(&self, p: Vec2, rect: egui::Rect) -> egui::Pos2 {
        let center = rect.center();
        let rel = (p - self.canvas_center()) * self.zoom;
        egui::pos2(center.x + rel.x + self.pan.x, center.y + rel.y + self.pan.y)
    }

    fn screen_to_world(&self, p: egui::Pos2, rect: egui::Rect) -> Vec2 {
        let center = rect.center();
        let x = (p.x - center.x - self.pan.x) / self.zoom;
        let y = (p.y - center.y - self.pan.y) / self.zoom;
        self.canvas_center() + Vec2::new(x, y)
    }

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

                if ui.button("Finish").clicked() {
                    self.finish();
                }

                if ui.button("Reset").clicked() {
                    self.reset();
                }

                ui.separator();
                ui.add(egui::Slider::new(&mut self.zoom, 0.1..=10.0).text("Zoom"));
            });
        });
    }

    fn ui_status_bar(&self, ctx: &egui::Context) {
        egui::TopBottomPanel::bottom("status_bar").show(ctx, |ui| {
            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                ui.label(format!("dt last = {:.3} s", self.last_step_dt));
                ui.separator();
                ui.label(format!("nodes = {}", self.engine.tree().nodes.len()));
                ui.label(format!(
                    "active attractors = {}",
                    self.engine.active_attractor_count()
                ));
                ui.label(format!("dropped = {}", self.engine.dropped_node_count()));
                if let Some(polylines) = &self.polylines {
                    ui.separator();
                    ui.label(format!("polylines = {}", polylines.len()));
                }
            });
        });
    }

    fn ui_config_panel(&mut self, ctx: &egui::Context) {
        egui::SidePanel::right("config_panel")
            .resizable(true)
            .default_width(230.0)
            .show(ctx, |ui| {
                ui.heading("Config");
                ui.label("Applied on Reset");

                ui.separator();
                ui.label("Canvas");
                Self::labeled_drag_f32(ui, "width:", &mut self.cfg.width, 100.0..=2160.0, 10.0);
                Self::labeled_drag_f32(ui, "height:", &mut self.cfg.height, 100.0..=2160.0, 10.0);

                ui.separator();
                ui.label("Seeding");
                Self::labeled_drag_usize(
                    ui,
                    "attractors:",
                    &mut self.cfg.num_attractors,
                    0..=50_000,
                    50.0,
                );
                Self::labeled_drag_usize(ui, "roots:", &mut self.cfg.num_roots, 1..=16, 1.0);
                ui.horizontal(|ui| {
                    ui.label("seed:");
                    ui.add(egui::DragValue::new(&mut self.cfg.seed).speed(1.0));
                });

                ui.separator();
                ui.label("Growth");
                Self::labeled_drag_f32(
                    ui,
                    "branch length:",
                    &mut self.cfg.branch_length,
                    1.0..=32.0,
                    0.5,
                );
                Self::labeled_drag_f32(ui, "min dist:", &mut self.cfg.min_dist, 1.0..=128.0, 1.0);
                Self::labeled_drag_f32(ui, "max dist:", &mut self.cfg.max_dist, 2.0..=256.0, 1.0);
                Self::labeled_drag_f32(ui, "angle:", &mut self.cfg.angle, 1.0..=180.0, 1.0);

                egui::ComboBox::from_label("steering")
                    .selected_text(steering_label(self.cfg.steering))
                    .show_ui(ui, |ui| {
                        for mode in [
                            SteeringMode::None,
                            SteeringMode::Rounding,
                            SteeringMode::LeftRounding,
                            SteeringMode::RightRounding,
                        ] {
                            ui.selectable_value(&mut self.cfg.steering, mode, steering_label(mode));
                        }
                    });

                egui::ComboBox::from_label("distortion")
                    .selected_text(distortion_label(self.cfg.distortion))
                    .show_ui(ui, |ui| {
                        for mode in [
                            DistortionMode::None,
                            DistortionMode::SinWave1,
                            DistortionMode::SinWave2,
                            DistortionMode::SinWave3,
                            DistortionMode::Warp,
                            DistortionMode::Flow,
                        ] {
                            ui.selectable_value(
                                &mut self.cfg.distortion,
                                mode,
                                distortion_label(mode),
                            );
                        }
                    });

                ui.separator();
                ui.label("Drawing");
                egui::ComboBox::from_label("style")
                    .selected_text(style_label(self.style))
                    .show_ui(ui, |ui| {
                        for style in [
                            DrawStyle::Line,
                            DrawStyle::LineWithVertices,
                            DrawStyle::Knuckles,
                            DrawStyle::Blobs,
                            DrawStyle::BlobsFilled,
                            DrawStyle::BlobsTranslucent,
                            DrawStyle::LineWithBlobs,
                        ] {
                            ui.selectable_value(&mut self.style, style, style_label(style));
                        }
                    });
                ui.checkbox(&mut self.show_attractors, "show attractors");

                ui.separator();
                if ui.button("Presets: dense").clicked() {
                    self.cfg = Config::dense();
                }
                if ui.button("Presets: boxy").clicked() {
                    self.cfg = Config::boxy();
                }
                if ui.button("Presets: flow field").clicked() {
                    self.cfg = Config::flow_field();
                }
                if ui.button("Presets: rhizomes").clicked() {
                    self.cfg = Config::rhizomes();
                }

                if let Some(error) = &self.error {
                    ui.separator();
                    ui.colored_label(egui::Color32::LIGHT_RED, error);
                }
            });
    }

    fn ui_central_panel(&mut self, ctx: &egui::Context) {
        egui::CentralPanel::default().show(ctx, |ui| {
            let response = ui.allocate_response(ui.available_size(), egui::Sense::click_and_drag());
            let rect = response.rect;
            let painter = ui.painter_at(rect);

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

            self.draw_canvas_border(&painter, rect);

            if let Some(polylines) = &self.polylines {
                let cfg = *self.engine.current_config();
                let mut renderer = PainterRenderer {
                    painter: &painter,
                    viewer: self,
                    rect,
                    rng: SmallRng::seed_from_u64(cfg.seed),
                };
                present(self.engine.tree(), polylines, &mut renderer, self.style);
            } else {
                self.draw_growth(&painter, rect);
            }

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

    fn draw_canvas_border(&self, painter: &egui::Painter, rect: egui::Rect) {
        let cfg = self.engine.current_config();
        let min = self.world_to_screen(Vec2::ZERO, rect);
        let max = self.world_to_screen(Vec2::new(cfg.width, cfg.height), rect);
        painter.rect_stroke(
            egui::Rect::from_two_pos(min, max),
            egui::CornerRadius::ZERO,
            egui::Stroke::new(1.0, egui::Color32::DARK_GRAY),
            egui::StrokeKind::Middle,
        );
    }

    /// Draws the in-progress structure: every parent edge, highlighting the
    /// nodes emitted by the last tick.
    fn draw_growth(&self, painter: &egui::Painter, rect: egui::Rect) {
        let tree = self.engine.tree();

        for id in self.engine.flatten() {
            let node = &tree.nodes[id];
            if let Some(parent) = node.parent {
                let a = self.world_to_screen(node.pos, rect);
                let b = self.world_to_screen(tree.nodes[parent].pos, rect);
                painter.line_segment([a, b], egui::Stroke::new(1.0, egui::Color32::LIGHT_GREEN));
            }
            if self.last_new_ids.contains(&id) {
                let p = self.world_to_screen(node.pos, rect);
                painter.circle_filled(p, 2.0, egui::Color32::RED);
            }
        }

        if self.show_attractors {
            for a in &self.engine.attractors().points {
                if a.reached {
                    continue;
                }
                let p = self.world_to_screen(a.pos, rect);
                painter.circle_filled(p, 1.5, egui::Color32::LIGHT_RED);
            }
        }
    }
}

impl App for Viewer {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.ui_top_panel(ctx);
        self.ui_status_bar(ctx);
        self.ui_config_panel(ctx);
        self.ui_central_panel(ctx);
    }
}

fn steering_label(mode: SteeringMode) -> &'static str {
    match mode {
        SteeringMode::None => "none",
        SteeringMode::Rounding => "rounding",
        SteeringMode::LeftRounding => "left rounding",
        SteeringMode::RightRounding => "right rounding",
    }
}

fn distortion_label(mode: DistortionMode) -> &'static str {
    match mode {
        DistortionMode::None => "none",
        DistortionMode::SinWave1 => "sine wave 1",
        DistortionMode::SinWave2 => "sine wave 2",
        DistortionMode::SinWave3 => "sine wave 3",
        DistortionMode::Warp => "warp",
        DistortionMode::Flow => "flow field",
    }
}

fn style_label(style: DrawStyle) -> &'static str {
    match style {
        DrawStyle::Line => "line",
        DrawStyle::LineWithVertices => "line + vertices",
        DrawStyle::Knuckles => "knuckles",
        DrawStyle::Blobs => "blobs",
        DrawStyle::BlobsFilled => "blobs (filled)",
        DrawStyle::BlobsTranslucent => "blobs (translucent)",
        DrawStyle::LineWithBlobs => "line + blobs",
    }
}

/// [`Renderer`] that paints polylines straight onto an [`egui::Painter`].
///
/// Blob jitter is seeded from the engine config so repaints are stable.
struct PainterRenderer<'a> {
    painter: &'a egui::Painter,
    viewer: &'a Viewer,
    rect: egui::Rect,
    rng: SmallRng,
}

impl PainterRenderer<'_> {
    const STROKE: egui::Color32 = egui::Color32::from_rgb(20, 20, 20);

    fn map(&self, p: Vec2) -> egui::Pos2 {
        self.viewer.world_to_screen(p, self.rect)
    }

    fn stroke(&self) -> egui::Stroke {
        egui::Stroke::new(2.0, Self::STROKE)
    }

    fn draw_line(&self, vertices: &[Vec2]) {
        let points: Vec<egui::Pos2> = vertices.iter().map(|&v| self.map(v)).collect();
        self.painter.add(egui::Shape::line(points, self.stroke()));
    }

    /// Jittered closed polygon standing in for the blob curves.
    fn draw_blob(&mut self, center: Vec2, radius: f32, fill: egui::Color32, outlined: bool) {
        const STEPS: usize = 6;
        let mut points = Vec::with_capacity(STEPS);
        for n in 0..STEPS {
            let angle = (n as f32 / STEPS as f32) * std::f32::consts::TAU;
            let r = radius + self.rng.random_range(0.0..radius * 0.5);
            let p = center + Vec2::new(angle.cos(), angle.sin()) * r;
            points.push(self.map(p));
        }
        let stroke = if outlined {
            self.stroke()
        } else {
            egui::Stroke::NONE
        };
        self.painter
            .add(egui::Shape::convex_polygon(points, fill, stroke));
    }

    fn draw_blobs(&mut self, vertices: &[Vec2], fill: egui::Color32, outlined: bool) {
        for (i, &v) in vertices.iter().enumerate() {
            let r = (i + 2).min(8) as f32;
            self.draw_blob(v, r, fill, outlined);
        }
    }
}

impl Renderer for PainterRenderer<'_> {
    fn polyline(&mut self, vertices: &[Vec2], style: DrawStyle) {
        match style {
            DrawStyle::Line => self.draw_line(vertices),
            DrawStyle::LineWithVertices => {
                self.draw_line(vertices);
                for &v in vertices {
                    self.painter.circle_filled(self.map(v), 1.5, Self::STROKE);
                }
            }
            DrawStyle::Knuckles => {
                self.draw_line(vertices);
                for (i, &v) in vertices.iter().enumerate() {
                    let r = (2 + i).min(10) as f32;
                    self.painter.circle_filled(self.map(v), r, Self::STROKE);
                }
            }
            DrawStyle::Blobs => {
                self.draw_blobs(vertices, egui::Color32::TRANSPARENT, true);
            }
            DrawStyle::BlobsFilled => {
                self.draw_blobs(vertices, egui::Color32::from_rgb(185, 212, 197), true);
            }
            DrawStyle::BlobsTranslucent => {
                self.draw_blobs(
                    vertices,
                    egui::Color32::from_rgba_unmultiplied(0, 0, 0, 0x47),
                    true,
                );
            }
            DrawStyle::LineWithBlobs => {
                self.draw_line(vertices);
                self.draw_blobs(
                    vertices,
                    egui::Color32::from_rgba_unmultiplied(0, 0, 0, 0x47),
                    false,
                );
            }
        }
    }
}
