//! Persistent jobs restoring each frame's baseline.
//!
//! Every other effect adds to the color and anchor channels, so these must
//! run first in a frame.

use super::{AnimationJob, JobCtx, JobState};

/// Restores every tile's color and image opacity to their originals.
#[derive(Debug, Default)]
pub struct ColorResetJob {
    state: JobState,
}

impl ColorResetJob {
    pub fn new() -> Self {
        Self::default()
    }
}

impl AnimationJob for ColorResetJob {
    fn name(&self) -> &'static str {
        "color-reset"
    }

    fn init(&mut self) {
        self.state = JobState::NotStarted;
    }

    fn start(&mut self, _ctx: &mut JobCtx<'_>) {
        self.state = JobState::Running;
    }

    fn update(&mut self, ctx: &mut JobCtx<'_>) {
        for tile in ctx.grid.tiles_mut() {
            tile.color = tile.original_color;
            tile.image_opacity = tile.original_image_opacity;
        }
    }

    fn cancel(&mut self, _ctx: &mut JobCtx<'_>) {
        self.state = JobState::Complete;
    }

    fn is_complete(&self) -> bool {
        self.state != JobState::Running
    }
}

/// Moves every tile's current anchor back onto its original anchor.
#[derive(Debug, Default)]
pub struct DisplacementResetJob {
    state: JobState,
}

impl DisplacementResetJob {
    pub fn new() -> Self {
        Self::default()
    }
}

impl AnimationJob for DisplacementResetJob {
    fn name(&self) -> &'static str {
        "displacement-reset"
    }

    fn init(&mut self) {
        self.state = JobState::NotStarted;
    }

    fn start(&mut self, _ctx: &mut JobCtx<'_>) {
        self.state = JobState::Running;
    }

    fn update(&mut self, ctx: &mut JobCtx<'_>) {
        for tile in ctx.grid.tiles_mut() {
            tile.anchor = tile.original_anchor;
        }
    }

    fn cancel(&mut self, _ctx: &mut JobCtx<'_>) {
        self.state = JobState::Complete;
    }

    fn is_complete(&self) -> bool {
        self.state != JobState::Running
    }
}
