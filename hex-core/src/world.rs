//! The state every job reads and mutates.

use rand::rngs::StdRng;

use crate::config::JobOptions;
use crate::grid::Grid;
use crate::jobs::{FrameTime, JobCtx};
use crate::scene::Scene;

pub struct World {
    pub grid: Grid,
    pub scene: Scene,
    pub rng: StdRng,
    pub options: JobOptions,
}

impl World {
    pub fn new(grid: Grid, rng: StdRng, options: JobOptions) -> Self {
        let mut scene = Scene::new();
        grid.draw(&mut scene);
        Self {
            grid,
            scene,
            rng,
            options,
        }
    }

    pub fn ctx(&mut self, time: FrameTime) -> JobCtx<'_> {
        JobCtx {
            grid: &mut self.grid,
            scene: &mut self.scene,
            rng: &mut self.rng,
            options: &self.options,
            time,
        }
    }
}
