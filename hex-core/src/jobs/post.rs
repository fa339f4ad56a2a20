//! Opening and closing a post.
//!
//! Opening expands the grid around the clicked tile and then runs four
//! children: a spread, a pan bringing the tile to the center, the sector
//! dilation and the post reveal. Closing runs the reverse and tears the
//! expansion down when it ends, whether it finished or was cancelled, unless
//! a newer expand/collapse has taken over the grid in the meantime.

use glam::Vec2;
use log::{debug, warn};

use super::{AnimationJob, Children, DilateSectorsJob, JobCtx, PanJob, SpreadJob, Timeline};
use crate::config::{JobOptions, TweenOptions};
use crate::error::{EffectError, GridError};
use crate::grid::Grid;
use crate::math::lerp;
use crate::post::PostView;
use crate::scene::Scene;
use crate::types::{ExpansionToken, TileId};

/// Fades the open post in or out.
pub struct PostRevealJob {
    target: f32,
    from: f32,
    options: TweenOptions,
    timeline: Timeline,
}

impl PostRevealJob {
    pub fn new(target: f32, options: TweenOptions) -> Self {
        Self {
            target,
            from: 0.0,
            timeline: Timeline::new(options.duration),
            options,
        }
    }
}

impl AnimationJob for PostRevealJob {
    fn name(&self) -> &'static str {
        "post-reveal"
    }

    fn init(&mut self) {
        self.timeline.reset();
    }

    fn start(&mut self, ctx: &mut JobCtx<'_>) {
        self.timeline.begin(ctx.time.now);
        self.from = ctx.grid.post_view.opacity;
    }

    fn update(&mut self, ctx: &mut JobCtx<'_>) {
        let now = ctx.time.now;
        let t = self.options.easing.apply(self.timeline.progress(now));
        ctx.grid.post_view.opacity = lerp(self.from, self.target, t);
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

pub struct OpenPostJob {
    focus: TileId,
    children: Children,
    timeline: Timeline,
    token: Option<ExpansionToken>,
}

impl OpenPostJob {
    /// Plans opening the post of `focus`. Fails if `focus` cannot be the
    /// focus of an expansion.
    pub fn new(grid: &Grid, focus: TileId, options: &JobOptions) -> Result<Self, EffectError> {
        let Some(tile) = grid.tile(focus).filter(|_| focus < grid.original_count()) else {
            return Err(GridError::UnknownTile(focus).into());
        };
        if !grid.can_expand(focus) {
            return Err(GridError::BorderFocus(focus).into());
        }

        let transition = &options.open_post;
        let pan_target = if transition.pan_to_focus {
            grid.center() - tile.home
        } else {
            grid.pan()
        };
        let mut children = Children::new();
        children.push(
            transition.spread_offset,
            Box::new(SpreadJob::new(focus, options.spread.clone())),
        );
        children.push(
            transition.pan_offset,
            Box::new(PanJob::new(pan_target, options.pan.clone())),
        );
        children.push(
            transition.dilate_offset,
            Box::new(DilateSectorsJob::new(1.0, options.dilate.clone())),
        );
        children.push(
            transition.reveal_offset,
            Box::new(PostRevealJob::new(1.0, options.reveal.clone())),
        );

        Ok(Self {
            focus,
            children,
            timeline: Timeline::new(0.0),
            token: None,
        })
    }

    pub fn focus(&self) -> TileId {
        self.focus
    }

    pub fn token(&self) -> Option<ExpansionToken> {
        self.token
    }
}

impl AnimationJob for OpenPostJob {
    fn name(&self) -> &'static str {
        "open-post"
    }

    fn init(&mut self) {
        self.timeline.reset();
        self.children.init();
        self.token = None;
    }

    fn start(&mut self, ctx: &mut JobCtx<'_>) {
        self.timeline.begin(ctx.time.now);
        self.token = Some(ctx.grid.begin_expansion());
        if ctx.grid.is_expanded() {
            debug!("open-post: collapsing the previous expansion first");
            ctx.grid.collapse();
        }
        if let Err(err) = ctx.grid.expand(self.focus) {
            warn!("open-post: cannot expand tile {}: {err}", self.focus);
            self.timeline.finish();
            return;
        }
        ctx.grid.post_view = PostView::default();
        self.children.update(ctx, 0.0);
    }

    fn update(&mut self, ctx: &mut JobCtx<'_>) {
        if !self.timeline.is_running() {
            return;
        }
        let elapsed = self.timeline.elapsed(ctx.time.now);
        self.children.update(ctx, elapsed);
        if self.children.all_complete() {
            self.timeline.finish();
        }
    }

    fn draw(&self, grid: &Grid, scene: &mut Scene) {
        self.children.draw(grid, scene);
    }

    fn cancel(&mut self, ctx: &mut JobCtx<'_>) {
        self.children.cancel(ctx);
        self.timeline.finish();
    }

    fn is_complete(&self) -> bool {
        self.timeline.is_complete()
    }
}

pub struct ClosePostJob {
    options: JobOptions,
    children: Children,
    timeline: Timeline,
    token: Option<ExpansionToken>,
    torn_down: bool,
}

impl ClosePostJob {
    pub fn new(options: &JobOptions) -> Self {
        Self {
            options: options.clone(),
            children: Children::new(),
            timeline: Timeline::new(0.0),
            token: None,
            torn_down: false,
        }
    }

    pub fn token(&self) -> Option<ExpansionToken> {
        self.token
    }

    /// Collapses the grid unless a newer operation owns it. Runs at most once
    /// per start.
    fn tear_down(&mut self, grid: &mut Grid) {
        if std::mem::replace(&mut self.torn_down, true) {
            return;
        }
        match self.token {
            Some(token) if grid.is_latest_expansion(token) => {
                grid.collapse();
            }
            _ => debug!("close-post superseded, leaving the grid as it is"),
        }
    }
}

impl AnimationJob for ClosePostJob {
    fn name(&self) -> &'static str {
        "close-post"
    }

    fn init(&mut self) {
        self.timeline.reset();
        self.children = Children::new();
        self.token = None;
        self.torn_down = false;
    }

    fn start(&mut self, ctx: &mut JobCtx<'_>) {
        self.timeline.begin(ctx.time.now);
        self.token = Some(ctx.grid.begin_expansion());
        let Some(focus) = ctx.grid.focus() else {
            debug!("close-post: nothing is open");
            self.torn_down = true;
            self.timeline.finish();
            return;
        };

        let transition = &self.options.close_post;
        self.children.push(
            transition.reveal_offset,
            Box::new(PostRevealJob::new(0.0, self.options.reveal.clone())),
        );
        self.children.push(
            transition.dilate_offset,
            Box::new(DilateSectorsJob::new(0.0, self.options.dilate.clone())),
        );
        if transition.pan_to_focus {
            self.children.push(
                transition.pan_offset,
                Box::new(PanJob::new(Vec2::ZERO, self.options.pan.clone())),
            );
        }
        self.children.push(
            transition.spread_offset,
            Box::new(SpreadJob::new(focus, self.options.spread.clone())),
        );
        self.children.update(ctx, 0.0);
    }

    fn update(&mut self, ctx: &mut JobCtx<'_>) {
        if !self.timeline.is_running() {
            return;
        }
        let elapsed = self.timeline.elapsed(ctx.time.now);
        self.children.update(ctx, elapsed);
        if self.children.all_complete() {
            self.tear_down(ctx.grid);
            self.timeline.finish();
        }
    }

    fn draw(&self, grid: &Grid, scene: &mut Scene) {
        self.children.draw(grid, scene);
    }

    fn cancel(&mut self, ctx: &mut JobCtx<'_>) {
        self.children.cancel(ctx);
        self.tear_down(ctx.grid);
        self.timeline.finish();
    }

    fn is_complete(&self) -> bool {
        self.timeline.is_complete()
    }
}

/// Slides the open post's carousel to entry `index`.
pub struct CarouselSlideJob {
    index: usize,
    from: f32,
    options: TweenOptions,
    timeline: Timeline,
}

impl CarouselSlideJob {
    pub fn new(index: usize, options: TweenOptions) -> Self {
        Self {
            index,
            from: 0.0,
            timeline: Timeline::new(options.duration),
            options,
        }
    }
}

impl AnimationJob for CarouselSlideJob {
    fn name(&self) -> &'static str {
        "carousel-slide"
    }

    fn init(&mut self) {
        self.timeline.reset();
    }

    fn start(&mut self, ctx: &mut JobCtx<'_>) {
        self.timeline.begin(ctx.time.now);
        self.from = ctx.grid.post_view.carousel_offset;
        ctx.grid.post_view.carousel_index = self.index;
    }

    fn update(&mut self, ctx: &mut JobCtx<'_>) {
        let now = ctx.time.now;
        let t = self.options.easing.apply(self.timeline.progress(now));
        ctx.grid.post_view.carousel_offset = lerp(self.from, self.index as f32, t);
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
    fn open_post_rejects_border_and_unknown_tiles() {
        let world = test_support::world();
        let options = JobOptions::default();
        assert!(matches!(
            OpenPostJob::new(&world.grid, 0, &options),
            Err(EffectError::Grid(GridError::BorderFocus(0)))
        ));
        assert!(matches!(
            OpenPostJob::new(&world.grid, 99_999, &options),
            Err(EffectError::Grid(GridError::UnknownTile(99_999)))
        ));
    }

    #[test]
    fn open_post_expands_pans_and_reveals() {
        let mut world = test_support::world();
        let focus = test_support::central_tile(&world.grid) + 1;
        let mut job = OpenPostJob::new(&world.grid, focus, &JobOptions::default()).unwrap();
        test_support::run(&mut job, &mut world, 1.0 / 60.0, 5.0).unwrap();

        let grid = &world.grid;
        assert_eq!(grid.focus(), Some(focus));
        assert!((grid.dilation() - 1.0).abs() < 1e-5);
        assert!((grid.post_view.opacity - 1.0).abs() < 1e-5);
        let expected_pan = grid.center() - grid.tiles()[focus].home;
        assert!((grid.pan() - expected_pan).length() < 1e-3);
        assert!(grid.tiles()[focus].scale > 1.0);
        grid.validate_topology().unwrap();
    }

    #[test]
    fn open_post_replaces_an_existing_expansion() {
        let mut world = test_support::world();
        let first = test_support::central_tile(&world.grid);
        world.grid.expand(first).unwrap();
        let second = first + 1;
        let mut job = OpenPostJob::new(&world.grid, second, &JobOptions::default()).unwrap();
        job.init();
        job.start(&mut world.ctx(FrameTime::default()));
        assert_eq!(world.grid.focus(), Some(second));
        world.grid.validate_topology().unwrap();
    }

    #[test]
    fn close_post_collapses_when_it_finishes() {
        let mut world = test_support::world();
        let focus = test_support::central_tile(&world.grid);
        let options = JobOptions::default();
        let mut open = OpenPostJob::new(&world.grid, focus, &options).unwrap();
        test_support::run(&mut open, &mut world, 1.0 / 60.0, 5.0).unwrap();

        let mut close = ClosePostJob::new(&options);
        test_support::run(&mut close, &mut world, 1.0 / 60.0, 5.0).unwrap();
        assert!(!world.grid.is_expanded());
        assert_eq!(world.grid.tiles().len(), world.grid.original_count());
        assert!(world.grid.pan().length() < 1e-3);
        world.grid.validate_topology().unwrap();
    }

    #[test]
    fn cancelled_close_still_tears_down() {
        let mut world = test_support::world();
        let focus = test_support::central_tile(&world.grid);
        world.grid.expand(focus).unwrap();
        let mut close = ClosePostJob::new(&JobOptions::default());
        close.init();
        close.start(&mut world.ctx(FrameTime::default()));
        assert!(world.grid.is_expanded());
        close.cancel(&mut world.ctx(FrameTime::default()));
        assert!(!world.grid.is_expanded());
        close.cancel(&mut world.ctx(FrameTime::default()));
        assert!(close.is_complete());
    }

    #[test]
    fn superseded_close_leaves_the_newer_expansion_alone() {
        let mut world = test_support::world();
        let focus = test_support::central_tile(&world.grid);
        world.grid.expand(focus).unwrap();
        let mut close = ClosePostJob::new(&JobOptions::default());
        close.init();
        close.start(&mut world.ctx(FrameTime::default()));

        let newer = world.grid.begin_expansion();
        assert!(world.grid.is_latest_expansion(newer));
        close.cancel(&mut world.ctx(FrameTime::default()));
        assert!(world.grid.is_expanded(), "a newer operation owns the expansion");
    }

    #[test]
    fn carousel_slides_to_the_selected_entry() {
        let mut world = test_support::world();
        let mut job = CarouselSlideJob::new(2, TweenOptions::default());
        test_support::run(&mut job, &mut world, 0.05, 2.0).unwrap();
        assert_eq!(world.grid.post_view.carousel_index, 2);
        assert!((world.grid.post_view.carousel_offset - 2.0).abs() < 1e-5);
    }
}
