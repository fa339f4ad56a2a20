//! Highlights: a fading glow on the hovered tile, and a ring of light
//! radiating from a clicked one.

use glam::Vec2;

use super::{AnimationJob, JobCtx, Timeline};
use crate::config::{HighlightHoverOptions, HighlightRadiateOptions};
use crate::math::{bump, ease_out_cubic};
use crate::types::TileId;

pub struct HighlightHoverJob {
    tile: TileId,
    options: HighlightHoverOptions,
    timeline: Timeline,
}

impl HighlightHoverJob {
    pub fn new(tile: TileId, options: HighlightHoverOptions) -> Self {
        Self {
            tile,
            timeline: Timeline::new(options.duration),
            options,
        }
    }

    pub fn tile(&self) -> TileId {
        self.tile
    }
}

impl AnimationJob for HighlightHoverJob {
    fn name(&self) -> &'static str {
        "highlight-hover"
    }

    fn init(&mut self) {
        self.timeline.reset();
    }

    fn start(&mut self, ctx: &mut JobCtx<'_>) {
        self.timeline.begin(ctx.time.now);
    }

    fn update(&mut self, ctx: &mut JobCtx<'_>) {
        let now = ctx.time.now;
        if !ctx.grid.is_active(self.tile) {
            self.timeline.finish();
            return;
        }
        let intensity = 1.0 - ease_out_cubic(self.timeline.progress(now));
        if let Some(tile) = ctx.grid.tile_mut(self.tile) {
            tile.color = tile
                .color
                .shifted(0.0, 0.0, self.options.lightness_boost * intensity);
            if tile.has_content() {
                tile.image_opacity =
                    (tile.image_opacity + self.options.opacity_boost * intensity).min(1.0);
            }
        }
        if self.timeline.is_elapsed(now) {
            self.timeline.finish();
        }
    }

    fn cancel(&mut self, _ctx: &mut JobCtx<'_>) {
        self.timeline.finish();
    }

    fn is_complete(&self) -> bool {
        self.timeline.is_complete()
    }
}

/// A band of light expanding from a tile at constant speed.
pub struct HighlightRadiateJob {
    tile: TileId,
    origin: Vec2,
    options: HighlightRadiateOptions,
    timeline: Timeline,
}

impl HighlightRadiateJob {
    pub fn new(tile: TileId, options: HighlightRadiateOptions) -> Self {
        Self {
            tile,
            origin: Vec2::ZERO,
            timeline: Timeline::new(options.duration),
            options,
        }
    }

    /// Lighting weight of a tile at `distance` from the origin.
    fn weight(&self, distance: f32, elapsed: f32, fade: f32) -> f32 {
        let front = self.options.speed * elapsed;
        let band = self.options.band_width.max(f32::EPSILON);
        let x = (front - distance) / band;
        if (0.0..=1.0).contains(&x) {
            bump(x) * fade
        } else {
            0.0
        }
    }
}

impl AnimationJob for HighlightRadiateJob {
    fn name(&self) -> &'static str {
        "highlight-radiate"
    }

    fn init(&mut self) {
        self.timeline.reset();
    }

    fn start(&mut self, ctx: &mut JobCtx<'_>) {
        self.timeline.begin(ctx.time.now);
        match ctx.grid.tile(self.tile) {
            Some(tile) => self.origin = tile.particle.pos,
            None => self.timeline.finish(),
        }
    }

    fn update(&mut self, ctx: &mut JobCtx<'_>) {
        let now = ctx.time.now;
        let elapsed = self.timeline.elapsed(now);
        let fade = 1.0 - self.timeline.progress(now);
        let active = ctx.grid.active_tiles().to_vec();
        for id in active {
            let Some(tile) = ctx.grid.tile_mut(id) else {
                continue;
            };
            let w = self.weight(tile.particle.pos.distance(self.origin), elapsed, fade);
            if w <= 0.0 {
                continue;
            }
            tile.color = tile.color.shifted(
                self.options.hue_shift * w,
                0.0,
                self.options.lightness_boost * w,
            );
            if tile.has_content() {
                tile.image_opacity = (tile.image_opacity + self.options.opacity_boost * w).min(1.0);
            }
        }
        if self.timeline.is_elapsed(now) {
            self.timeline.finish();
        }
    }

    fn cancel(&mut self, _ctx: &mut JobCtx<'_>) {
        self.timeline.finish();
    }

    fn is_complete(&self) -> bool {
        self.timeline.is_complete()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jobs::FrameTime;
    use crate::jobs::test_support;

    #[test]
    fn hover_brightens_then_finishes() {
        let mut world = test_support::world();
        let id = test_support::central_tile(&world.grid);
        let base = world.grid.tiles()[id].color.l;
        let mut job = HighlightHoverJob::new(id, HighlightHoverOptions::default());
        let mut ctx = world.ctx(FrameTime { now: 0.0, dt: 0.0 });
        job.start(&mut ctx);
        job.update(&mut ctx);
        assert!(world.grid.tiles()[id].color.l > base);
        let done = test_support::run(&mut job, &mut world, 0.05, 5.0);
        assert!(done.is_some());
    }

    #[test]
    fn radiate_band_reaches_tiles_in_order_of_distance() {
        let job = HighlightRadiateJob::new(0, HighlightRadiateOptions::default());
        let speed = job.options.speed;
        assert_eq!(job.weight(100.0, 0.0, 1.0), 0.0, "the ring has not arrived");
        let arrived = job.weight(100.0, (100.0 + job.options.band_width / 2.0) / speed, 1.0);
        assert!(arrived > 0.9);
        assert_eq!(job.weight(100.0, 10.0, 1.0), 0.0, "the ring has passed");
    }

    #[test]
    fn radiate_completes_after_its_duration() {
        let mut world = test_support::world();
        let id = test_support::central_tile(&world.grid);
        let mut job = HighlightRadiateJob::new(id, HighlightRadiateOptions::default());
        let done = test_support::run(&mut job, &mut world, 0.1, 10.0).unwrap();
        assert!(done >= job.options.duration as f64 - 1e-6);
    }
}
