//! Interactive hex grid viewer built with eframe/egui.
//!
//! This module defines [`Viewer`], which owns the [`Stage`] and implements
//! [`eframe::App`]. It is the input adapter (pointer position to tile,
//! hover and click) and the renderer of the stage's retained scene.

use std::time::Duration;

use eframe::App;
use glam::Vec2;
use hex_core::color::Hsl;
use hex_core::config::Options;
use hex_core::post::PostData;
use hex_core::scene::{Fill, Overlay, PostPlacement, Scene, TileShape};
use hex_core::stage::Stage;
use hex_core::types::TileId;
use log::{debug, error, warn};

use crate::controls::{Control, Selectors, sections};

/// Main application state for the interactive viewer.
///
/// The typical per-frame update is:
/// 1. Build the side panels; apply edited options to the stage.
/// 2. Create the stage on the first frame, or resize it when the central
///    panel changed size.
/// 3. Forward hover and click to the stage, then [`Stage::tick`].
/// 4. Paint the scene and schedule the next repaint.
///
/// ### Fields
/// - `stage` - Grid, animator and timers; created once the viewport size is known.
/// - `options` - Working copy of the options, edited by the config panel.
/// - `selectors` - Combo box state for enum-valued options.
/// - `posts` - Content handed to the stage whenever it is created.
/// - `seed` - Seed of the stage's random number generator.
/// - `viewport` - Size of the central panel the stage was laid out for.
/// - `show_config` - Whether the config panel is open.
pub struct Viewer {
    stage: Option<Stage>,
    options: Options,
    selectors: Selectors,
    posts: Vec<PostData>,
    seed: u64,
    viewport: Vec2,
    show_config: bool,
}

impl Viewer {
    pub fn new(options: Options, posts: Vec<PostData>, seed: u64) -> Self {
        Self {
            selectors: Selectors::read(&options),
            stage: None,
            options,
            posts,
            seed,
            viewport: Vec2::ZERO,
            show_config: false,
        }
    }

    /// Creates the stage for `viewport`, or resizes it if the size changed.
    fn ensure_stage(&mut self, viewport: Vec2, now: f64) {
        if viewport.x < 1.0 || viewport.y < 1.0 {
            return;
        }
        match &mut self.stage {
            Some(stage) => {
                if viewport != self.viewport {
                    if let Err(err) = stage.resize(viewport, now) {
                        warn!("resize to {viewport}: {err}");
                        return;
                    }
                    self.viewport = viewport;
                }
            }
            None => {
                let created = Stage::new(self.options.clone(), viewport, self.posts.clone(), self.seed)
                    .and_then(|mut stage| stage.start(now).map(|()| stage));
                match created {
                    Ok(stage) => {
                        self.stage = Some(stage);
                        self.viewport = viewport;
                    }
                    Err(err) => error!("cannot build the grid: {err}"),
                }
            }
        }
    }

    /// Pushes the working options to the stage.
    fn apply_options(&mut self, now: f64) {
        self.selectors.write(&mut self.options);
        self.options.recompute_derived();
        if let Some(stage) = &mut self.stage
            && let Err(err) = stage.set_options(self.options.clone(), now)
        {
            warn!("options rejected: {err}");
        }
    }

    /// Builds the top bar.
    fn ui_top_panel(&mut self, ctx: &egui::Context, now: f64) {
        egui::TopBottomPanel::top("top_panel").show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.toggle_value(&mut self.show_config, "⚙ Config");
                let Some(stage) = &mut self.stage else {
                    return;
                };
                if stage.grid().is_expanded()
                    && ui.button("✕ Close post").clicked()
                    && let Err(err) = stage.close_post(now)
                {
                    warn!("{err}");
                }
                if ui.button("Stop effects").clicked() {
                    stage.cancel_all(now);
                }
            });
        });
    }

    /// Builds the bottom status bar.
    fn ui_status_bar(&self, ctx: &egui::Context) {
        let Some(stage) = &self.stage else {
            return;
        };
        egui::TopBottomPanel::bottom("status_bar").show(ctx, |ui| {
            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                let grid = stage.grid();
                ui.label(format!("jobs = {}", stage.animator().active_jobs().len()));
                ui.label(format!(
                    "tiles = {} active / {} total",
                    grid.active_tiles().len(),
                    grid.tiles().len()
                ));
                if let Some(tile) = stage.hovered() {
                    ui.label(format!("hovered = {tile}"));
                }
                if let Some(focus) = grid.focus() {
                    ui.label(format!("focus = {focus}"));
                }
            });
        });
    }

    /// Builds the right-hand configuration panel.
    fn ui_config_panel(&mut self, ctx: &egui::Context, now: f64) {
        if !self.show_config {
            return;
        }
        let mut changed = false;
        let mut reset = false;
        egui::SidePanel::right("config_panel")
            .resizable(true)
            .default_width(260.0)
            .show(ctx, |ui| {
                egui::ScrollArea::vertical().show(ui, |ui| {
                    for section in sections(&mut self.options, &mut self.selectors) {
                        egui::CollapsingHeader::new(section.title)
                            .default_open(false)
                            .show(ui, |ui| {
                                for control in section.controls {
                                    changed |= control.show(ui);
                                }
                            });
                    }
                    ui.separator();
                    let reset_control = Control::Action {
                        label: "Reset options to default",
                        pressed: &mut reset,
                    };
                    reset_control.show(ui);
                });
            });

        if reset {
            self.options = Options::default();
            self.selectors = Selectors::read(&self.options);
            changed = true;
        }
        if changed {
            self.apply_options(now);
        }
    }

    /// Forwards keyboard shortcuts: Escape closes the post, the arrow keys
    /// step through its carousel.
    fn handle_keys(&mut self, ctx: &egui::Context, now: f64) {
        let Some(stage) = &mut self.stage else {
            return;
        };
        let (escape, left, right) = ctx.input(|i| {
            (
                i.key_pressed(egui::Key::Escape),
                i.key_pressed(egui::Key::ArrowLeft),
                i.key_pressed(egui::Key::ArrowRight),
            )
        });
        if escape
            && stage.grid().is_expanded()
            && let Err(err) = stage.close_post(now)
        {
            warn!("{err}");
        }
        if left || right {
            let current = stage.grid().post_view.carousel_index;
            let next = if right {
                current + 1
            } else {
                current.saturating_sub(1)
            };
            if next != current
                && let Err(err) = stage.select_carousel_image(next, now)
            {
                debug!("carousel: {err}");
            }
        }
    }

    /// Builds the central panel where the grid is drawn and interacted with.
    fn ui_central_panel(&mut self, ctx: &egui::Context, now: f64) {
        egui::CentralPanel::default()
            .frame(egui::Frame::new().fill(egui::Color32::from_gray(18)))
            .show(ctx, |ui| {
                let response = ui.allocate_response(ui.available_size(), egui::Sense::click());
                let rect = response.rect;
                self.ensure_stage(Vec2::new(rect.width(), rect.height()), now);
                let Some(stage) = &mut self.stage else {
                    return;
                };

                let pointer = response.hover_pos().map(|p| to_grid(p, rect));
                let hovered = pointer.and_then(|p| stage.grid().tile_at(p));
                stage.set_hovered_tile(hovered, now);
                if response.clicked()
                    && let Some(tile) = hovered
                {
                    click(stage, tile, now);
                }

                stage.tick(now);

                let painter = ui.painter_at(rect);
                paint_scene(&painter, rect, stage.scene());
                paint_post(&painter, rect, stage);

                if stage.is_animating() {
                    ctx.request_repaint();
                } else if let Some(at) = stage.next_wakeup() {
                    ctx.request_repaint_after(Duration::from_secs_f64((at - now).max(0.0)));
                }
            });
    }
}

fn click(stage: &mut Stage, tile: TileId, now: f64) {
    if let Err(err) = stage.click(tile, now) {
        warn!("click on tile {tile}: {err}");
    }
}

/// Converts a screen position to grid coordinates, whose origin is the top
/// left corner of the central panel.
fn to_grid(p: egui::Pos2, rect: egui::Rect) -> Vec2 {
    Vec2::new(p.x - rect.min.x, p.y - rect.min.y)
}

fn to_screen(p: Vec2, rect: egui::Rect) -> egui::Pos2 {
    egui::pos2(rect.min.x + p.x, rect.min.y + p.y)
}

fn color(hsl: Hsl, opacity: f32) -> egui::Color32 {
    let [r, g, b] = hsl.to_rgb();
    egui::Color32::from_rgba_unmultiplied(r, g, b, (opacity.clamp(0.0, 1.0) * 255.0) as u8)
}

/// Fill color of a tile. Content tiles have no image loaded here, so their
/// pattern is shown as a lighter tint.
fn fill_color(fill: Fill) -> egui::Color32 {
    match fill {
        Fill::Solid(hsl) => color(hsl, 1.0),
        Fill::Pattern { opacity, tint, .. } => color(tint.shifted(0.0, 0.0, 25.0 * opacity), 1.0),
    }
}

fn shape_points(shape: &TileShape, rect: egui::Rect) -> Vec<egui::Pos2> {
    shape
        .points
        .chunks_exact(2)
        .map(|xy| to_screen(Vec2::new(xy[0], xy[1]), rect))
        .collect()
}

fn paint_scene(painter: &egui::Painter, rect: egui::Rect, scene: &Scene) {
    for shape in scene.shapes().iter().filter(|s| s.visible) {
        painter.add(egui::Shape::convex_polygon(
            shape_points(shape, rect),
            fill_color(shape.fill),
            egui::Stroke::NONE,
        ));
    }
    for (_, overlay) in scene.overlays() {
        paint_overlay(painter, rect, overlay);
    }
}

/// Draws a line overlay whose tail fades towards its oldest vertex.
fn paint_overlay(painter: &egui::Painter, rect: egui::Rect, overlay: &Overlay) {
    let segments = overlay.points.len().saturating_sub(1);
    for (i, pair) in overlay.points.windows(2).enumerate() {
        let fade = (i + 1) as f32 / segments as f32;
        let stroke = egui::Stroke::new(overlay.width, color(overlay.color, overlay.opacity * fade));
        painter.line_segment([to_screen(pair[0], rect), to_screen(pair[1], rect)], stroke);
    }
}

/// Draws the open post over the focus tile. Markup and media are left to
/// a richer page renderer; this shows the post's titles.
fn paint_post(painter: &egui::Painter, rect: egui::Rect, stage: &Stage) {
    let PostPlacement {
        post,
        center,
        radius,
        opacity,
        carousel_offset,
    } = stage.scene().post;
    let Some(post) = post.and_then(|id| stage.grid().post(id)) else {
        return;
    };
    if opacity <= 0.0 {
        return;
    }
    let alpha = (opacity.clamp(0.0, 1.0) * 255.0) as u8;
    let text_color = egui::Color32::from_white_alpha(alpha);
    let center = to_screen(center, rect);
    painter.text(
        center - egui::vec2(0.0, radius * 0.3),
        egui::Align2::CENTER_CENTER,
        &post.title_short,
        egui::FontId::proportional(20.0),
        text_color,
    );
    painter.text(
        center,
        egui::Align2::CENTER_CENTER,
        &post.title_long,
        egui::FontId::proportional(13.0),
        text_color,
    );
    let count = post.media_count();
    if count > 0 {
        painter.text(
            center + egui::vec2(0.0, radius * 0.3),
            egui::Align2::CENTER_CENTER,
            format!("{:.1} / {count}", carousel_offset + 1.0),
            egui::FontId::monospace(11.0),
            text_color,
        );
    }
}

impl App for Viewer {
    /// eframe callback that builds all UI panels for each frame.
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        let now = ctx.input(|i| i.time);
        self.ui_top_panel(ctx, now);
        self.ui_status_bar(ctx);
        self.ui_config_panel(ctx, now);
        self.handle_keys(ctx, now);
        self.ui_central_panel(ctx, now);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hex_core::config::GridOptions;
    use hex_core::geometry::Orientation;

    fn test_rect() -> egui::Rect {
        egui::Rect::from_min_size(egui::Pos2::new(30.0, 50.0), egui::vec2(400.0, 300.0))
    }

    fn viewer() -> Viewer {
        let mut options = Options::default();
        options.grid = GridOptions {
            orientation: Some(Orientation::Horizontal),
            ..GridOptions::default()
        };
        let posts = vec![PostData {
            id: "p".into(),
            title_short: "P".into(),
            ..PostData::default()
        }];
        Viewer::new(options, posts, 1)
    }

    #[test]
    fn grid_and_screen_coordinates_round_trip() {
        let rect = test_rect();
        for p in [Vec2::ZERO, Vec2::new(10.0, -5.0), Vec2::new(399.0, 299.5)] {
            let back = to_grid(to_screen(p, rect), rect);
            assert!((back - p).length() < 1e-4, "{p:?} came back as {back:?}");
        }
    }

    #[test]
    fn stage_is_built_once_the_viewport_is_known() {
        let mut viewer = viewer();
        viewer.ensure_stage(Vec2::ZERO, 0.0);
        assert!(viewer.stage.is_none());
        viewer.ensure_stage(Vec2::new(400.0, 300.0), 0.0);
        let stage = viewer.stage.as_ref().unwrap();
        assert!(stage.is_animating());
        assert_eq!(stage.grid().viewport(), Vec2::new(400.0, 300.0));
    }

    #[test]
    fn a_new_viewport_size_resizes_the_stage() {
        let mut viewer = viewer();
        viewer.ensure_stage(Vec2::new(400.0, 300.0), 0.0);
        viewer.ensure_stage(Vec2::new(640.0, 480.0), 0.1);
        let stage = viewer.stage.as_ref().unwrap();
        assert_eq!(stage.grid().viewport(), Vec2::new(640.0, 480.0));
        assert_eq!(viewer.viewport, Vec2::new(640.0, 480.0));
    }

    #[test]
    fn edited_options_reach_the_stage() {
        let mut viewer = viewer();
        viewer.ensure_stage(Vec2::new(400.0, 300.0), 0.0);
        viewer.options.tile.drag = 9.0;
        viewer.options.jobs.color_wave.enabled = false;
        viewer.apply_options(0.0);
        let stage = viewer.stage.as_ref().unwrap();
        assert_eq!(stage.grid().tile_options.drag, 9.0);
        assert!(!stage.options().jobs.color_wave.enabled);
    }

    #[test]
    fn clicking_a_tile_under_the_pointer_starts_effects() {
        let mut viewer = viewer();
        viewer.ensure_stage(Vec2::new(400.0, 300.0), 0.0);
        let stage = viewer.stage.as_mut().unwrap();
        let rect = test_rect();
        let grid = stage.grid();
        let target = grid
            .tiles()
            .iter()
            .find(|t| !t.has_content() && grid.can_expand(t.id))
            .unwrap();
        let screen = to_screen(target.particle.pos, rect);
        let tile = grid.tile_at(to_grid(screen, rect)).unwrap();
        assert_eq!(tile, target.id);
        let before = stage.animator().active_jobs().len();
        click(stage, tile, 0.0);
        assert!(stage.animator().active_jobs().len() > before);
    }

    #[test]
    fn pattern_fills_are_lighter_than_their_tint() {
        let tint = Hsl::new(200.0, 40.0, 30.0);
        let plain = fill_color(Fill::Solid(tint));
        let pattern = fill_color(Fill::Pattern {
            post: 0,
            opacity: 1.0,
            tint,
        });
        let luma = |c: egui::Color32| c.r() as u32 + c.g() as u32 + c.b() as u32;
        assert!(luma(pattern) > luma(plain));
    }
}
