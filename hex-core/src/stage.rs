//! The context object owning everything that runs on the grid.
//!
//! A [`Stage`] holds the animator, the world its jobs mutate and the
//! recurrence timers, and turns input (hover, click, resize) into jobs.
//! Job completions come back from the animator as events and are routed
//! through a dispatch table keyed by job id.

use std::collections::HashMap;

use glam::Vec2;
use log::{debug, info, warn};
use rand::rngs::StdRng;
use rand::seq::IndexedRandom;
use rand::{Rng, SeedableRng};

use crate::animator::{Animator, JobEvent};
use crate::config::Options;
use crate::error::{EffectError, GridError, StageError};
use crate::grid::Grid;
use crate::jobs::{
    AnimationJob, CarouselSlideJob, ClosePostJob, ColorResetJob, ColorWaveJob,
    DisplacementResetJob, DisplacementWaveJob, HighlightHoverJob, HighlightRadiateJob, LineJob,
    LinesRadiateJob, OpenPostJob,
};
use crate::post::PostData;
use crate::recurrence::{Timers, next_delay_ms};
use crate::scene::Scene;
use crate::types::{DIRECTION_COUNT, JobId, TileId};
use crate::world::World;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RecurringKind {
    /// A line starting at a random border tile.
    RandomLine,
    /// A highlight radiating from a random tile.
    RandomRadiate,
}

impl RecurringKind {
    pub const ALL: [RecurringKind; 2] = [RecurringKind::RandomLine, RecurringKind::RandomRadiate];
}

/// What to do when a job completes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Completion {
    Recurring(RecurringKind),
    Expansion,
    Hover(TileId),
    Carousel,
}

pub struct Stage {
    options: Options,
    animator: Animator,
    world: World,
    timers: Timers<RecurringKind>,
    dispatch: HashMap<JobId, Completion>,
    persistent: Vec<JobId>,
    hover_jobs: HashMap<TileId, JobId>,
    hovered: Option<TileId>,
    expansion_job: Option<JobId>,
    carousel_job: Option<JobId>,
    started: bool,
}

impl Stage {
    /// Builds the grid for `viewport` and registers the persistent jobs.
    /// Nothing runs until [`Stage::start`].
    pub fn new(
        mut options: Options,
        viewport: Vec2,
        posts: Vec<PostData>,
        seed: u64,
    ) -> Result<Self, StageError> {
        options.recompute_derived();
        let mut rng = StdRng::seed_from_u64(seed);
        let grid = Grid::new(
            options.grid.clone(),
            options.tile.clone(),
            viewport,
            posts,
            &mut rng,
        )?;
        let world = World::new(grid, rng, options.jobs.clone());
        let mut animator = Animator::new(options.animator.clone());

        let persistent: Vec<Box<dyn AnimationJob>> = vec![
            Box::new(ColorResetJob::new()),
            Box::new(DisplacementResetJob::new()),
            Box::new(ColorWaveJob::new()),
            Box::new(DisplacementWaveJob::new()),
        ];
        let persistent = persistent.into_iter().map(|job| animator.add(job)).collect();

        Ok(Self {
            options,
            animator,
            world,
            timers: Timers::new(),
            dispatch: HashMap::new(),
            persistent,
            hover_jobs: HashMap::new(),
            hovered: None,
            expansion_job: None,
            carousel_job: None,
            started: false,
        })
    }

    /// Starts the persistent jobs and arms the recurring ones.
    pub fn start(&mut self, now: f64) -> Result<(), StageError> {
        self.start_persistent(now)?;
        for kind in RecurringKind::ALL {
            self.schedule(kind, now);
        }
        self.started = true;
        Ok(())
    }

    fn start_persistent(&mut self, now: f64) -> Result<(), StageError> {
        for &id in &self.persistent {
            self.animator.start(id, &mut self.world, now)?;
        }
        Ok(())
    }

    /// Brings the persistent jobs back after a [`Stage::cancel_all`], so they
    /// are registered ahead of the transient job about to start.
    fn ensure_baseline(&mut self, now: f64) {
        if !self.started {
            return;
        }
        let stopped: Vec<JobId> = self
            .persistent
            .iter()
            .copied()
            .filter(|&id| !self.animator.is_running(id))
            .collect();
        if stopped.is_empty() {
            return;
        }
        debug!("restarting {} persistent jobs", stopped.len());
        for id in stopped {
            if let Err(err) = self.animator.start(id, &mut self.world, now) {
                warn!("persistent job: {err}");
            }
        }
    }

    /// Redraws the retained scene after the arena changed outside a frame.
    fn sync_scene(&mut self) {
        self.world.grid.draw(&mut self.world.scene);
    }

    pub fn options(&self) -> &Options {
        &self.options
    }

    pub fn grid(&self) -> &Grid {
        &self.world.grid
    }

    pub fn scene(&self) -> &Scene {
        &self.world.scene
    }

    pub fn animator(&self) -> &Animator {
        &self.animator
    }

    pub fn hovered(&self) -> Option<TileId> {
        self.hovered
    }

    /// The open or close job currently in flight.
    pub fn expansion_job(&self) -> Option<JobId> {
        self.expansion_job
    }

    pub fn is_animating(&self) -> bool {
        !self.animator.is_paused()
    }

    /// Time of the next recurring job, when the animator is idle until then.
    pub fn next_wakeup(&self) -> Option<f64> {
        self.timers.next_deadline()
    }

    /// Runs everything due at `now`: recurring jobs, one animation frame,
    /// then completion handlers.
    pub fn tick(&mut self, now: f64) {
        self.poll_timers(now);
        if !self.animator.is_paused() {
            self.animator.frame(now, &mut self.world);
        }
        self.dispatch_events(now);
    }

    fn poll_timers(&mut self, now: f64) {
        for kind in self.timers.poll(now) {
            match self.spawn_recurring(kind, now) {
                Some(id) => {
                    self.dispatch.insert(id, Completion::Recurring(kind));
                }
                None => self.schedule(kind, now),
            }
        }
    }

    fn spawn_recurring(&mut self, kind: RecurringKind, now: f64) -> Option<JobId> {
        let grid = &self.world.grid;
        let rng = &mut self.world.rng;
        let job: Box<dyn AnimationJob> = match kind {
            RecurringKind::RandomLine => {
                let tile = *grid.border_tiles().choose(rng)?;
                let corner = rng.random_range(0..DIRECTION_COUNT);
                match LineJob::new(grid, tile, corner, None, self.world.options.line.clone()) {
                    Ok(job) => Box::new(job),
                    Err(err) => {
                        warn!("recurring line rejected: {err}");
                        return None;
                    }
                }
            }
            RecurringKind::RandomRadiate => {
                let tile = *grid.active_tiles().choose(rng)?;
                Box::new(HighlightRadiateJob::new(
                    tile,
                    self.world.options.radiate.clone(),
                ))
            }
        };
        debug!("recurring {kind:?} fired");
        self.ensure_baseline(now);
        Some(self.animator.spawn(job, &mut self.world, now))
    }

    fn schedule(&mut self, kind: RecurringKind, now: f64) {
        let recurring = &self.world.options.recurring;
        let options = match kind {
            RecurringKind::RandomLine => &recurring.random_line,
            RecurringKind::RandomRadiate => &recurring.random_radiate,
        };
        if !options.enabled {
            self.timers.cancel(kind);
            return;
        }
        let delay = next_delay_ms(options, &mut self.world.rng);
        self.timers.schedule(kind, now, delay);
    }

    fn dispatch_events(&mut self, now: f64) {
        for event in self.animator.drain_events() {
            let JobEvent::Completed {
                id,
                name,
                cancelled,
            } = event;
            let Some(completion) = self.dispatch.remove(&id) else {
                continue;
            };
            debug!("{name} {id:?} done (cancelled: {cancelled})");
            match completion {
                Completion::Recurring(kind) => self.schedule(kind, now),
                Completion::Expansion => {
                    if self.expansion_job == Some(id) {
                        self.expansion_job = None;
                    }
                }
                Completion::Hover(tile) => {
                    if self.hover_jobs.get(&tile) == Some(&id) {
                        self.hover_jobs.remove(&tile);
                    }
                    if let Err(err) = self.animator.remove(id, &mut self.world, now) {
                        warn!("hover job for tile {tile}: {err}");
                    }
                }
                Completion::Carousel => {
                    if self.carousel_job == Some(id) {
                        self.carousel_job = None;
                    }
                }
            }
        }
    }

    /// Highlights `tile` when the pointer enters it. Re-entering a tile whose
    /// highlight is still fading restarts that highlight.
    pub fn set_hovered_tile(&mut self, tile: Option<TileId>, now: f64) {
        if tile == self.hovered {
            return;
        }
        self.hovered = tile;
        let Some(tile) = tile.filter(|&t| self.world.grid.is_active(t)) else {
            return;
        };
        self.ensure_baseline(now);
        if let Some(&id) = self.hover_jobs.get(&tile) {
            if let Err(err) = self.animator.start(id, &mut self.world, now) {
                warn!("hover job for tile {tile}: {err}");
            }
            return;
        }
        let job = HighlightHoverJob::new(tile, self.world.options.hover.clone());
        let id = self.animator.add(Box::new(job));
        self.hover_jobs.insert(tile, id);
        self.dispatch.insert(id, Completion::Hover(tile));
        if let Err(err) = self.animator.start(id, &mut self.world, now) {
            warn!("hover job for tile {tile}: {err}");
        }
    }

    /// Click dispatch: the focus tile closes its post, a content tile opens
    /// its own, any other tile radiates light and lines.
    pub fn click(&mut self, tile: TileId, now: f64) -> Result<(), StageError> {
        let grid = &self.world.grid;
        if !grid.is_active(tile) {
            return Err(EffectError::InactiveTile(tile).into());
        }
        if grid.focus() == Some(tile) {
            self.close_post(now)?;
            return Ok(());
        }
        let has_content = grid.tile(tile).is_some_and(|t| t.has_content());
        if has_content && grid.can_expand(tile) {
            self.open_post(tile, now)?;
            return Ok(());
        }

        let radiate = HighlightRadiateJob::new(tile, self.world.options.radiate.clone());
        let lines = LinesRadiateJob::new(grid, tile, &self.world.options.lines_radiate)?;
        self.ensure_baseline(now);
        self.animator.spawn(Box::new(radiate), &mut self.world, now);
        self.animator.spawn(Box::new(lines), &mut self.world, now);
        Ok(())
    }

    /// Opens the post of `tile`, superseding any open or close in flight.
    pub fn open_post(&mut self, tile: TileId, now: f64) -> Result<JobId, StageError> {
        let job = OpenPostJob::new(&self.world.grid, tile, &self.world.options)?;
        self.cancel_expansion_job(now);
        self.ensure_baseline(now);
        info!("opening post at tile {tile}");
        let id = self.animator.spawn(Box::new(job), &mut self.world, now);
        self.dispatch.insert(id, Completion::Expansion);
        self.expansion_job = Some(id);
        Ok(id)
    }

    /// Closes the open post, superseding any open or close in flight.
    pub fn close_post(&mut self, now: f64) -> Result<JobId, StageError> {
        if !self.world.grid.is_expanded() {
            return Err(GridError::NotExpanded.into());
        }
        self.cancel_expansion_job(now);
        self.ensure_baseline(now);
        info!("closing post");
        let job = ClosePostJob::new(&self.world.options);
        let id = self.animator.spawn(Box::new(job), &mut self.world, now);
        self.dispatch.insert(id, Completion::Expansion);
        self.expansion_job = Some(id);
        Ok(id)
    }

    fn cancel_expansion_job(&mut self, now: f64) {
        let Some(id) = self.expansion_job.take() else {
            return;
        };
        if self.animator.is_running(id) {
            debug!("superseding expansion job {id:?}");
            if let Err(err) = self.animator.cancel(id, &mut self.world, now) {
                warn!("cancelling expansion job: {err}");
            }
        }
        self.dispatch_events(now);
        self.sync_scene();
    }

    /// Slides the open post's carousel to entry `index`.
    pub fn select_carousel_image(&mut self, index: usize, now: f64) -> Result<JobId, StageError> {
        let grid = &self.world.grid;
        let focus = grid.focus().ok_or(GridError::NotExpanded)?;
        let len = grid
            .tile(focus)
            .and_then(|t| t.post)
            .and_then(|post| grid.post(post))
            .map_or(0, PostData::media_count);
        if index >= len {
            return Err(EffectError::CarouselIndex { index, len }.into());
        }
        if let Some(previous) = self.carousel_job.take() {
            if self.animator.is_running(previous) {
                self.animator.cancel(previous, &mut self.world, now)?;
            }
        }
        self.ensure_baseline(now);
        let job = CarouselSlideJob::new(index, self.world.options.carousel.clone());
        let id = self.animator.spawn(Box::new(job), &mut self.world, now);
        self.dispatch.insert(id, Completion::Carousel);
        self.carousel_job = Some(id);
        Ok(id)
    }

    /// Cancels every job and pauses the animator. Recurring timers stay
    /// armed, and the persistent jobs come back with the next effect.
    pub fn cancel_all(&mut self, now: f64) {
        self.animator.cancel_all(&mut self.world, now);
        self.dispatch_events(now);
        self.hover_jobs.clear();
        self.expansion_job = None;
        self.carousel_job = None;
        self.sync_scene();
    }

    /// Rebuilds the grid for a new viewport size.
    pub fn resize(&mut self, viewport: Vec2, now: f64) -> Result<(), StageError> {
        self.cancel_all(now);
        self.world.grid.resize(viewport, &mut self.world.rng)?;
        self.redraw_and_restart(now)
    }

    fn redraw_and_restart(&mut self, now: f64) -> Result<(), StageError> {
        self.world.scene.clear();
        self.world.grid.draw(&mut self.world.scene);
        self.hovered = None;
        if self.started {
            self.start_persistent(now)?;
        }
        Ok(())
    }

    /// Replaces every option. Layout changes rebuild the grid; recurrence
    /// changes re-arm the timers.
    pub fn set_options(&mut self, mut options: Options, now: f64) -> Result<(), StageError> {
        options.recompute_derived();
        let relayout = options.grid != self.options.grid;
        let recurring_changed = options.jobs.recurring != self.options.jobs.recurring;

        self.animator.options = options.animator.clone();
        self.world.options = options.jobs.clone();
        self.world.grid.tile_options = options.tile.clone();
        if relayout {
            info!("grid options changed, rebuilding");
            self.cancel_all(now);
            self.world.grid.options = options.grid.clone();
            self.world.grid.on_options_changed(&mut self.world.rng)?;
            self.redraw_and_restart(now)?;
        }
        self.options = options;

        if recurring_changed && self.started {
            for kind in RecurringKind::ALL {
                self.schedule(kind, now);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{GridOptions, RecurrenceOptions};
    use crate::geometry::Orientation;
    use crate::scene::PostPlacement;

    const FRAME: f64 = 1.0 / 60.0;

    fn quiet_options() -> Options {
        let mut options = Options::default();
        options.grid = GridOptions {
            tile_outer_radius: 20.0,
            tile_gap: 2.0,
            orientation: Some(Orientation::Horizontal),
            sector_bounds_margin: 0.0,
            ..GridOptions::default()
        };
        options.jobs.recurring.random_line.enabled = false;
        options.jobs.recurring.random_radiate.enabled = false;
        options
    }

    fn posts() -> Vec<PostData> {
        (0..4)
            .map(|i| PostData {
                id: format!("p{i}"),
                images: vec!["a.png".into(), "b.png".into(), "c.png".into()],
                ..PostData::default()
            })
            .collect()
    }

    fn stage_with(options: Options) -> Stage {
        let mut stage = Stage::new(options, Vec2::new(400.0, 300.0), posts(), 9).unwrap();
        stage.start(0.0).unwrap();
        stage
    }

    fn run_until(stage: &mut Stage, from: f64, seconds: f64) -> f64 {
        let mut now = from;
        while now < from + seconds {
            now += FRAME;
            stage.tick(now);
        }
        now
    }

    fn content_tile(stage: &Stage) -> TileId {
        stage
            .grid()
            .tiles()
            .iter()
            .find(|t| t.has_content())
            .map(|t| t.id)
            .unwrap()
    }

    fn plain_interior_tile(stage: &Stage) -> TileId {
        let grid = stage.grid();
        grid.tiles()
            .iter()
            .find(|t| !t.has_content() && grid.can_expand(t.id))
            .map(|t| t.id)
            .unwrap()
    }

    #[test]
    fn persistent_jobs_start_in_registration_order() {
        let mut stage = stage_with(quiet_options());
        let names: Vec<_> = stage
            .animator()
            .active_jobs()
            .iter()
            .filter_map(|&id| stage.animator().job(id).map(|j| j.name()))
            .collect();
        assert_eq!(
            names,
            ["color-reset", "displacement-reset", "color-wave", "displacement-wave"]
        );
        run_until(&mut stage, 0.0, 0.5);
        assert_eq!(stage.animator().active_jobs().len(), 4);
        assert!(stage.is_animating());
    }

    #[test]
    fn clicking_a_plain_tile_radiates() {
        let mut stage = stage_with(quiet_options());
        let tile = plain_interior_tile(&stage);
        stage.click(tile, 0.0).unwrap();
        assert_eq!(stage.animator().active_jobs().len(), 6);
        assert!(stage.scene().overlay_count() > 0);
        run_until(&mut stage, 0.0, 10.0);
        assert_eq!(stage.animator().active_jobs().len(), 4);
        assert_eq!(stage.scene().overlay_count(), 0);
    }

    #[test]
    fn clicking_an_inactive_tile_is_rejected() {
        let mut stage = stage_with(quiet_options());
        let result = stage.click(usize::MAX, 0.0);
        assert!(matches!(
            result,
            Err(StageError::Effect(EffectError::InactiveTile(_)))
        ));
    }

    #[test]
    fn content_click_opens_and_focus_click_closes() {
        let mut stage = stage_with(quiet_options());
        let tile = content_tile(&stage);
        stage.click(tile, 0.0).unwrap();
        let now = run_until(&mut stage, 0.0, 3.0);
        assert_eq!(stage.grid().focus(), Some(tile));
        assert_eq!(stage.expansion_job(), None);
        assert!(stage.scene().post.opacity > 0.99);
        stage.grid().validate_topology().unwrap();

        stage.click(tile, now).unwrap();
        run_until(&mut stage, now, 3.0);
        assert!(!stage.grid().is_expanded());
        assert_eq!(stage.grid().tiles().len(), stage.grid().original_count());
        stage.grid().validate_topology().unwrap();
    }

    #[test]
    fn a_second_open_supersedes_the_first() {
        let mut stage = stage_with(quiet_options());
        let grid = stage.grid();
        let mut content = grid.tiles().iter().filter(|t| t.has_content()).map(|t| t.id);
        let first = content.next().unwrap();
        let second = content.next().unwrap();

        let first_job = stage.open_post(first, 0.0).unwrap();
        let now = run_until(&mut stage, 0.0, 0.1);
        let second_job = stage.open_post(second, now).unwrap();
        assert!(!stage.animator().is_running(first_job));
        assert_eq!(stage.expansion_job(), Some(second_job));

        run_until(&mut stage, now, 3.0);
        assert_eq!(stage.grid().focus(), Some(second));
        stage.grid().validate_topology().unwrap();
    }

    #[test]
    fn close_without_an_open_post_fails() {
        let mut stage = stage_with(quiet_options());
        assert!(matches!(
            stage.close_post(0.0),
            Err(StageError::Grid(GridError::NotExpanded))
        ));
    }

    #[test]
    fn carousel_selection_checks_the_open_post() {
        let mut stage = stage_with(quiet_options());
        assert!(matches!(
            stage.select_carousel_image(0, 0.0),
            Err(StageError::Grid(GridError::NotExpanded))
        ));

        let tile = content_tile(&stage);
        stage.open_post(tile, 0.0).unwrap();
        let now = run_until(&mut stage, 0.0, 2.0);
        assert!(matches!(
            stage.select_carousel_image(3, now),
            Err(StageError::Effect(EffectError::CarouselIndex { index: 3, len: 3 }))
        ));
        stage.select_carousel_image(2, now).unwrap();
        run_until(&mut stage, now, 1.0);
        assert_eq!(stage.grid().post_view.carousel_index, 2);
        assert!((stage.scene().post.carousel_offset - 2.0).abs() < 1e-4);
    }

    #[test]
    fn hovering_restarts_instead_of_duplicating() {
        let mut stage = stage_with(quiet_options());
        let tile = plain_interior_tile(&stage);
        stage.set_hovered_tile(Some(tile), 0.0);
        stage.set_hovered_tile(Some(tile), 0.0);
        assert_eq!(stage.animator().active_jobs().len(), 5);
        stage.set_hovered_tile(None, 0.05);
        stage.set_hovered_tile(Some(tile), 0.1);
        assert_eq!(stage.animator().active_jobs().len(), 5);
        assert_eq!(stage.animator().job_count(), 5);

        run_until(&mut stage, 0.1, 5.0);
        assert_eq!(stage.animator().job_count(), 4, "finished hover jobs are dropped");
    }

    #[test]
    fn recurring_jobs_rearm_after_completing() {
        let mut options = quiet_options();
        options.jobs.recurring.random_radiate = RecurrenceOptions {
            enabled: true,
            avg_delay_ms: 50.0,
            delay_deviation_range_ms: 0.0,
        };
        let mut stage = stage_with(options);
        assert_eq!(stage.next_wakeup(), Some(0.05));

        let mut now = run_until(&mut stage, 0.0, 0.1);
        assert!(stage.animator().active_jobs().len() > 4);
        assert_eq!(stage.next_wakeup(), None, "re-armed only once the job completes");

        while stage.next_wakeup().is_none() && now < 10.0 {
            now += FRAME;
            stage.tick(now);
        }
        let wakeup = stage.next_wakeup().unwrap();
        assert!((wakeup - (now + 0.05)).abs() < 1e-9);
        assert_eq!(stage.animator().active_jobs().len(), 4);
    }

    #[test]
    fn cancel_all_pauses_and_keeps_timers() {
        let mut options = quiet_options();
        options.jobs.recurring.random_line.enabled = true;
        let mut stage = stage_with(options);
        stage.click(plain_interior_tile(&stage), 0.0).unwrap();
        stage.cancel_all(0.0);
        assert!(!stage.is_animating());
        assert!(stage.animator().active_jobs().is_empty());
        assert_eq!(stage.scene().overlay_count(), 0);
        assert!(stage.next_wakeup().is_some());
    }

    #[test]
    fn effects_after_cancel_all_fade_back_to_the_baseline() {
        let mut options = quiet_options();
        options.jobs.color_wave.enabled = false;
        let mut stage = stage_with(options);
        let now = run_until(&mut stage, 0.0, 10.0 * FRAME);
        stage.cancel_all(now);
        assert!(stage.animator().active_jobs().is_empty());

        let tile = plain_interior_tile(&stage);
        stage.set_hovered_tile(Some(tile), now);
        let names: Vec<_> = stage
            .animator()
            .active_jobs()
            .iter()
            .filter_map(|&id| stage.animator().job(id).map(|j| j.name()))
            .collect();
        assert_eq!(
            names,
            [
                "color-reset",
                "displacement-reset",
                "color-wave",
                "displacement-wave",
                "highlight-hover"
            ]
        );

        run_until(&mut stage, now, 5.0);
        assert_eq!(stage.animator().job_count(), 4);
        let tile = &stage.grid().tiles()[tile];
        assert_eq!(tile.color, tile.original_color);
    }

    #[test]
    fn cancelling_a_close_leaves_the_scene_matching_the_arena() {
        let mut stage = stage_with(quiet_options());
        let tile = content_tile(&stage);
        stage.open_post(tile, 0.0).unwrap();
        let mut now = run_until(&mut stage, 0.0, 3.0);
        assert!(stage.grid().tiles().len() > stage.grid().original_count());

        stage.close_post(now).unwrap();
        now = run_until(&mut stage, now, 5.0 * FRAME);
        stage.cancel_all(now);
        stage.tick(now + FRAME);

        assert!(!stage.grid().is_expanded());
        let shapes = stage.scene().shapes();
        assert_eq!(shapes.len(), stage.grid().tiles().len());
        assert_eq!(
            shapes.iter().filter(|s| s.visible).count(),
            stage.grid().original_count()
        );
        assert_eq!(stage.scene().post, PostPlacement::default());
    }

    #[test]
    fn resize_drops_the_expansion_and_restarts_persistent_jobs() {
        let mut stage = stage_with(quiet_options());
        let tile = content_tile(&stage);
        stage.open_post(tile, 0.0).unwrap();
        let now = run_until(&mut stage, 0.0, 2.0);
        assert!(stage.grid().is_expanded());

        stage.resize(Vec2::new(300.0, 500.0), now).unwrap();
        assert!(!stage.grid().is_expanded());
        assert_eq!(stage.grid().viewport(), Vec2::new(300.0, 500.0));
        assert_eq!(stage.animator().active_jobs().len(), 4);
        assert_eq!(stage.scene().shapes().len(), stage.grid().tiles().len());
    }

    #[test]
    fn layout_option_changes_rebuild_the_grid() {
        let mut stage = stage_with(quiet_options());
        let before = stage.grid().original_count();
        let mut options = stage.options().clone();
        options.grid.tile_outer_radius = 30.0;
        stage.set_options(options, 0.0).unwrap();
        assert!(stage.grid().original_count() < before);
        assert_eq!(stage.animator().active_jobs().len(), 4);
    }
}
