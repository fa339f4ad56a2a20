//! The job catalog and the contract every job follows.
//!
//! A job is driven by the [`crate::animator::Animator`]: `init` + `start` when
//! it is (re)started, `update` once per frame until it reports complete,
//! `draw` after every job has updated, and `cancel` when it is stopped early.
//!
//! Persistent jobs never complete on their own. They are registered first so
//! that they establish each frame's baseline before transient jobs add to it.
//!
//! - [`reset`]: color and displacement baselines.
//! - [`wave`]: slow color and displacement waves.
//! - [`highlight`]: hover and radiating highlights.
//! - [`line`]: lines walking the tile edges.
//! - [`motion`]: pan, spread and sector dilation.
//! - [`post`]: opening and closing a post, and its carousel.

pub mod highlight;
pub mod line;
pub mod motion;
pub mod post;
pub mod reset;
pub mod wave;

use rand::rngs::StdRng;

use crate::config::JobOptions;
use crate::grid::Grid;
use crate::scene::Scene;

pub use highlight::{HighlightHoverJob, HighlightRadiateJob};
pub use line::{LineJob, LinesRadiateJob, RelativeDirection};
pub use motion::{DilateSectorsJob, PanJob, SpreadJob};
pub use post::{CarouselSlideJob, ClosePostJob, OpenPostJob, PostRevealJob};
pub use reset::{ColorResetJob, DisplacementResetJob};
pub use wave::{ColorWaveJob, DisplacementWaveJob};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum JobState {
    #[default]
    NotStarted,
    Running,
    Complete,
}

/// Clock values of the frame being processed.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct FrameTime {
    /// Seconds since an arbitrary fixed origin.
    pub now: f64,
    /// Clamped time since the previous frame, in seconds.
    pub dt: f32,
}

/// Mutable state shared by all jobs for the duration of one call.
pub struct JobCtx<'a> {
    pub grid: &'a mut Grid,
    pub scene: &'a mut Scene,
    pub rng: &'a mut StdRng,
    pub options: &'a JobOptions,
    pub time: FrameTime,
}

pub trait AnimationJob {
    fn name(&self) -> &'static str;

    /// Resets internal state so the job runs as if freshly created.
    fn init(&mut self) {}

    fn start(&mut self, ctx: &mut JobCtx<'_>);

    fn update(&mut self, ctx: &mut JobCtx<'_>);

    fn draw(&self, _grid: &Grid, _scene: &mut Scene) {}

    /// Stops the job and releases whatever it holds. Must leave the grid
    /// consistent and be safe to call after completion.
    fn cancel(&mut self, ctx: &mut JobCtx<'_>);

    /// `true` when the job is not running, either because it never started
    /// or because it finished.
    fn is_complete(&self) -> bool;
}

/// Start time, duration and state of a finite job.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Timeline {
    pub duration: f32,
    started_at: f64,
    state: JobState,
}

impl Timeline {
    pub fn new(duration: f32) -> Self {
        Self {
            duration,
            started_at: 0.0,
            state: JobState::NotStarted,
        }
    }

    pub fn reset(&mut self) {
        self.state = JobState::NotStarted;
    }

    pub fn begin(&mut self, now: f64) {
        self.started_at = now;
        self.state = JobState::Running;
    }

    pub fn finish(&mut self) {
        self.state = JobState::Complete;
    }

    pub fn state(&self) -> JobState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.state == JobState::Running
    }

    pub fn is_complete(&self) -> bool {
        self.state != JobState::Running
    }

    pub fn elapsed(&self, now: f64) -> f32 {
        (now - self.started_at).max(0.0) as f32
    }

    /// Linear progress in `[0, 1]`.
    pub fn progress(&self, now: f64) -> f32 {
        if self.duration <= 0.0 {
            1.0
        } else {
            (self.elapsed(now) / self.duration).clamp(0.0, 1.0)
        }
    }

    pub fn is_elapsed(&self, now: f64) -> bool {
        self.elapsed(now) >= self.duration
    }
}

struct Child {
    offset: f32,
    job: Box<dyn AnimationJob>,
    started: bool,
}

/// Child jobs owned by a composite job, each started at its own offset
/// from the composite's start.
#[derive(Default)]
pub struct Children {
    entries: Vec<Child>,
}

impl Children {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, offset: f32, job: Box<dyn AnimationJob>) {
        self.entries.push(Child {
            offset,
            job,
            started: false,
        });
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn init(&mut self) {
        for child in &mut self.entries {
            child.job.init();
            child.started = false;
        }
    }

    /// Starts the children whose offset has passed and updates every
    /// running one.
    pub fn update(&mut self, ctx: &mut JobCtx<'_>, elapsed: f32) {
        for child in &mut self.entries {
            if !child.started && elapsed >= child.offset {
                child.started = true;
                child.job.start(ctx);
            }
            if child.started && !child.job.is_complete() {
                child.job.update(ctx);
            }
        }
    }

    pub fn draw(&self, grid: &Grid, scene: &mut Scene) {
        for child in self.entries.iter().filter(|c| c.started && !c.job.is_complete()) {
            child.job.draw(grid, scene);
        }
    }

    pub fn cancel(&mut self, ctx: &mut JobCtx<'_>) {
        for child in &mut self.entries {
            if child.started && !child.job.is_complete() {
                child.job.cancel(ctx);
            }
        }
    }

    /// Whether every child has started and finished.
    pub fn all_complete(&self) -> bool {
        self.entries.iter().all(|c| c.started && c.job.is_complete())
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timeline_reports_progress_and_completion() {
        let mut t = Timeline::new(2.0);
        assert!(t.is_complete(), "a timeline that never started counts as complete");
        t.begin(10.0);
        assert!(t.is_running());
        assert_eq!(t.progress(11.0), 0.5);
        assert!(!t.is_elapsed(11.9));
        assert!(t.is_elapsed(12.0));
        assert_eq!(t.progress(20.0), 1.0);
        t.finish();
        assert_eq!(t.state(), JobState::Complete);
        t.reset();
        assert_eq!(t.state(), JobState::NotStarted);
    }

    #[test]
    fn zero_duration_timeline_is_immediately_done() {
        let mut t = Timeline::new(0.0);
        t.begin(1.0);
        assert_eq!(t.progress(1.0), 1.0);
        assert!(t.is_elapsed(1.0));
    }

    #[test]
    fn children_start_at_their_offsets() {
        let mut world = test_support::world();
        let mut children = Children::new();
        children.push(0.0, Box::new(PanJob::new(glam::Vec2::X, Default::default())));
        children.push(1.0, Box::new(PanJob::new(glam::Vec2::Y, Default::default())));
        let time = FrameTime { now: 0.0, dt: 0.0 };
        children.update(&mut world.ctx(time), 0.0);
        assert!(!children.all_complete());
        assert!(children.entries[0].started);
        assert!(!children.entries[1].started);
        children.update(&mut world.ctx(time), 1.0);
        assert!(children.entries[1].started);
        children.cancel(&mut world.ctx(time));
        assert!(children.all_complete());
    }
}
