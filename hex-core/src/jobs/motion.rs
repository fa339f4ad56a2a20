//! Jobs that move tiles: panning the board, pushing tiles away from a
//! point, and sliding the sectors of an expanded grid.

use glam::Vec2;

use super::{AnimationJob, JobCtx, Timeline};
use crate::config::{SpreadOptions, TweenOptions};
use crate::math::{bump, lerp};
use crate::types::TileId;

/// Eases the board's pan from wherever it is to `target`.
pub struct PanJob {
    target: Vec2,
    from: Vec2,
    options: TweenOptions,
    timeline: Timeline,
}

impl PanJob {
    pub fn new(target: Vec2, options: TweenOptions) -> Self {
        Self {
            target,
            from: Vec2::ZERO,
            timeline: Timeline::new(options.duration),
            options,
        }
    }

    pub fn target(&self) -> Vec2 {
        self.target
    }
}

impl AnimationJob for PanJob {
    fn name(&self) -> &'static str {
        "pan"
    }

    fn init(&mut self) {
        self.timeline.reset();
    }

    fn start(&mut self, ctx: &mut JobCtx<'_>) {
        self.timeline.begin(ctx.time.now);
        self.from = ctx.grid.pan();
    }

    fn update(&mut self, ctx: &mut JobCtx<'_>) {
        let now = ctx.time.now;
        let t = self.options.easing.apply(self.timeline.progress(now));
        ctx.grid.set_pan(self.from.lerp(self.target, t));
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

/// Briefly pushes every tile's anchor away from a focus tile.
///
/// The push rises and falls once over the duration and weakens linearly
/// with distance.
pub struct SpreadJob {
    focus: TileId,
    origin: Vec2,
    options: SpreadOptions,
    timeline: Timeline,
}

impl SpreadJob {
    pub fn new(focus: TileId, options: SpreadOptions) -> Self {
        Self {
            focus,
            origin: Vec2::ZERO,
            timeline: Timeline::new(options.duration),
            options,
        }
    }

    fn push(&self, offset: Vec2, strength: f32) -> Vec2 {
        let distance = offset.length();
        if distance <= f32::EPSILON || self.options.falloff_distance <= 0.0 {
            return Vec2::ZERO;
        }
        let falloff = (1.0 - distance / self.options.falloff_distance).max(0.0);
        offset / distance * (strength * falloff)
    }
}

impl AnimationJob for SpreadJob {
    fn name(&self) -> &'static str {
        "spread"
    }

    fn init(&mut self) {
        self.timeline.reset();
    }

    fn start(&mut self, ctx: &mut JobCtx<'_>) {
        self.timeline.begin(ctx.time.now);
        match ctx.grid.tile(self.focus) {
            Some(tile) => self.origin = tile.original_anchor,
            None => self.timeline.finish(),
        }
    }

    fn update(&mut self, ctx: &mut JobCtx<'_>) {
        let now = ctx.time.now;
        let strength = bump(self.timeline.progress(now)) * self.options.displacement;
        let active = ctx.grid.active_tiles().to_vec();
        for id in active.into_iter().filter(|&id| id != self.focus) {
            if let Some(tile) = ctx.grid.tile_mut(id) {
                tile.anchor += self.push(tile.original_anchor - self.origin, strength);
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

/// Slides the sectors of an expanded grid to `target` dilation and scales
/// the focus tile to fill the hole.
pub struct DilateSectorsJob {
    target: f32,
    from: f32,
    options: TweenOptions,
    timeline: Timeline,
}

impl DilateSectorsJob {
    pub fn new(target: f32, options: TweenOptions) -> Self {
        Self {
            target,
            from: 0.0,
            timeline: Timeline::new(options.duration),
            options,
        }
    }
}

impl AnimationJob for DilateSectorsJob {
    fn name(&self) -> &'static str {
        "dilate-sectors"
    }

    fn init(&mut self) {
        self.timeline.reset();
    }

    fn start(&mut self, ctx: &mut JobCtx<'_>) {
        self.timeline.begin(ctx.time.now);
        self.from = ctx.grid.dilation();
    }

    fn update(&mut self, ctx: &mut JobCtx<'_>) {
        let now = ctx.time.now;
        let Some(focus) = ctx.grid.focus() else {
            self.timeline.finish();
            return;
        };
        let t = self.options.easing.apply(self.timeline.progress(now));
        let dilation = lerp(self.from, self.target, t);
        ctx.grid.set_dilation(dilation);
        let scale = ctx.grid.focus_scale(dilation);
        if let Some(tile) = ctx.grid.tile_mut(focus) {
            tile.scale = scale;
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
