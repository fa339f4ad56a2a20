//! Persistent waves rolling across the board.
//!
//! Both waves read their options from the frame's [`JobCtx`] so that edits
//! made while they run take effect on the next frame.

use super::{AnimationJob, JobCtx, JobState};

#[derive(Debug, Default)]
pub struct ColorWaveJob {
    state: JobState,
}

impl ColorWaveJob {
    pub fn new() -> Self {
        Self::default()
    }
}

impl AnimationJob for ColorWaveJob {
    fn name(&self) -> &'static str {
        "color-wave"
    }

    fn init(&mut self) {
        self.state = JobState::NotStarted;
    }

    fn start(&mut self, _ctx: &mut JobCtx<'_>) {
        self.state = JobState::Running;
    }

    fn update(&mut self, ctx: &mut JobCtx<'_>) {
        let options = &ctx.options.color_wave;
        if !options.enabled {
            return;
        }
        let now = ctx.time.now;
        for tile in ctx.grid.tiles_mut() {
            let s = options.derived.phase(tile.home, now).sin();
            tile.color = tile
                .color
                .shifted(s * options.hue_amplitude, 0.0, s * options.lightness_amplitude);
        }
    }

    fn cancel(&mut self, _ctx: &mut JobCtx<'_>) {
        self.state = JobState::Complete;
    }

    fn is_complete(&self) -> bool {
        self.state != JobState::Running
    }
}

/// Pushes anchors back and forth along the wave direction.
#[derive(Debug, Default)]
pub struct DisplacementWaveJob {
    state: JobState,
}

impl DisplacementWaveJob {
    pub fn new() -> Self {
        Self::default()
    }
}

impl AnimationJob for DisplacementWaveJob {
    fn name(&self) -> &'static str {
        "displacement-wave"
    }

    fn init(&mut self) {
        self.state = JobState::NotStarted;
    }

    fn start(&mut self, _ctx: &mut JobCtx<'_>) {
        self.state = JobState::Running;
    }

    fn update(&mut self, ctx: &mut JobCtx<'_>) {
        let options = &ctx.options.displacement_wave;
        if !options.enabled {
            return;
        }
        let now = ctx.time.now;
        let direction = options.derived.direction;
        for tile in ctx.grid.tiles_mut() {
            let s = options.derived.phase(tile.home, now).sin();
            tile.anchor += direction * (s * options.amplitude);
        }
    }

    fn cancel(&mut self, _ctx: &mut JobCtx<'_>) {
        self.state = JobState::Complete;
    }

    fn is_complete(&self) -> bool {
        self.state != JobState::Running
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jobs::FrameTime;
    use crate::jobs::test_support;

    #[test]
    fn displacement_wave_stays_within_its_amplitude() {
        let mut world = test_support::world();
        let amplitude = world.options.displacement_wave.amplitude;
        let mut job = DisplacementWaveJob::new();
        for step in 0..20 {
            let time = FrameTime {
                now: step as f64 * 0.37,
                dt: 0.0,
            };
            let mut ctx = world.ctx(time);
            job.start(&mut ctx);
            for tile in ctx.grid.tiles_mut() {
                tile.anchor = tile.original_anchor;
            }
            job.update(&mut ctx);
            for tile in world.grid.tiles() {
                let offset = tile.anchor - tile.original_anchor;
                assert!(offset.length() <= amplitude + 1e-4);
            }
        }
    }

    #[test]
    fn disabled_color_wave_leaves_colors_alone() {
        let mut world = test_support::world();
        world.options.color_wave.enabled = false;
        let before: Vec<_> = world.grid.tiles().iter().map(|t| t.color).collect();
        let mut job = ColorWaveJob::new();
        let mut ctx = world.ctx(FrameTime { now: 1.3, dt: 0.0 });
        job.start(&mut ctx);
        job.update(&mut ctx);
        let after: Vec<_> = world.grid.tiles().iter().map(|t| t.color).collect();
        assert_eq!(before, after);
    }

    #[test]
    fn color_wave_varies_across_the_board() {
        let mut world = test_support::world();
        let mut job = ColorWaveJob::new();
        let mut ctx = world.ctx(FrameTime { now: 0.7, dt: 0.0 });
        job.start(&mut ctx);
        job.update(&mut ctx);
        let distinct = world
            .grid
            .tiles()
            .iter()
            .filter(|t| (t.color.h - t.original_color.h).abs() > 1e-3)
            .count();
        assert!(distinct > 0);
    }
}
