//! Cooperative, single-threaded job scheduler.
//!
//! The animator owns every job it runs. Each [`Animator::frame`]:
//!
//! 1. computes the frame's clamped delta time,
//! 2. updates every active job in registration order, dropping the ones that
//!    report complete,
//! 3. steps the tile simulation,
//! 4. draws the grid, then every remaining job.
//!
//! When the active list runs empty the animator pauses: the driver may stop
//! calling `frame` until a job is started again.
//!
//! Completions are not delivered through callbacks. They are queued as
//! [`JobEvent`]s for the owner to drain and dispatch.

use std::collections::HashMap;

use log::{debug, trace};

use crate::config::AnimatorOptions;
use crate::error::AnimatorError;
use crate::jobs::{AnimationJob, FrameTime};
use crate::types::JobId;
use crate::world::World;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum JobEvent {
    /// The job left the active list, by finishing or by being cancelled.
    Completed {
        id: JobId,
        name: &'static str,
        cancelled: bool,
    },
}

struct Entry {
    job: Box<dyn AnimationJob>,
    /// Retained jobs stay owned after they complete so they can be started
    /// again; the others are dropped.
    retained: bool,
}

pub struct Animator {
    pub options: AnimatorOptions,
    jobs: HashMap<JobId, Entry>,
    active: Vec<JobId>,
    next_id: u64,
    last_frame: Option<f64>,
    paused: bool,
    events: Vec<JobEvent>,
}

impl Animator {
    pub fn new(options: AnimatorOptions) -> Self {
        Self {
            options,
            jobs: HashMap::new(),
            active: Vec::new(),
            next_id: 0,
            last_frame: None,
            paused: true,
            events: Vec::new(),
        }
    }

    fn insert(&mut self, job: Box<dyn AnimationJob>, retained: bool) -> JobId {
        let id = JobId(self.next_id);
        self.next_id += 1;
        self.jobs.insert(id, Entry { job, retained });
        id
    }

    /// Takes ownership of a job that can be started, and restarted, any
    /// number of times.
    pub fn add(&mut self, job: Box<dyn AnimationJob>) -> JobId {
        self.insert(job, true)
    }

    /// Starts a one-shot job. It is dropped once it completes.
    pub fn spawn(&mut self, job: Box<dyn AnimationJob>, world: &mut World, now: f64) -> JobId {
        let id = self.insert(job, false);
        self.launch(id, world, now);
        id
    }

    /// Starts job `id`, or restarts it in place if it is already running.
    pub fn start(&mut self, id: JobId, world: &mut World, now: f64) -> Result<(), AnimatorError> {
        if !self.jobs.contains_key(&id) {
            return Err(AnimatorError::UnknownJob(id));
        }
        if self.active.contains(&id) {
            let time = FrameTime { now, dt: 0.0 };
            if let Some(entry) = self.jobs.get_mut(&id) {
                debug!("restarting {} {id:?}", entry.job.name());
                let mut ctx = world.ctx(time);
                entry.job.cancel(&mut ctx);
                entry.job.init();
                entry.job.start(&mut ctx);
            }
            return Ok(());
        }
        self.launch(id, world, now);
        Ok(())
    }

    fn launch(&mut self, id: JobId, world: &mut World, now: f64) {
        let Some(entry) = self.jobs.get_mut(&id) else {
            return;
        };
        debug!("starting {} {id:?}", entry.job.name());
        let mut ctx = world.ctx(FrameTime { now, dt: 0.0 });
        entry.job.init();
        entry.job.start(&mut ctx);
        self.active.push(id);
        if self.paused {
            self.paused = false;
            self.last_frame = None;
        }
    }

    /// Cancels job `id` if it is running. Returns whether it was.
    pub fn cancel(&mut self, id: JobId, world: &mut World, now: f64) -> Result<bool, AnimatorError> {
        let Some(entry) = self.jobs.get_mut(&id) else {
            return Err(AnimatorError::UnknownJob(id));
        };
        let Some(index) = self.active.iter().position(|&a| a == id) else {
            return Ok(false);
        };
        let name = entry.job.name();
        debug!("cancelling {name} {id:?}");
        entry.job.cancel(&mut world.ctx(FrameTime { now, dt: 0.0 }));
        let retained = entry.retained;
        self.active.remove(index);
        if !retained {
            self.jobs.remove(&id);
        }
        self.events.push(JobEvent::Completed {
            id,
            name,
            cancelled: true,
        });
        self.pause_if_idle();
        Ok(true)
    }

    /// Cancels every running job, most recently started first.
    pub fn cancel_all(&mut self, world: &mut World, now: f64) {
        while let Some(&id) = self.active.last() {
            if self.cancel(id, world, now).is_err() {
                self.active.pop();
            }
        }
        self.pause_if_idle();
    }

    /// Drops a retained job, cancelling it first if it is running.
    pub fn remove(&mut self, id: JobId, world: &mut World, now: f64) -> Result<(), AnimatorError> {
        self.cancel(id, world, now)?;
        self.jobs.remove(&id);
        Ok(())
    }

    /// Runs one frame at time `now` (seconds).
    pub fn frame(&mut self, now: f64, world: &mut World) {
        let dt = match self.last_frame {
            Some(previous) => ((now - previous) as f32).clamp(0.0, self.options.max_delta_time),
            None => 0.0,
        };
        self.last_frame = Some(now);
        let time = FrameTime { now, dt };

        let mut i = 0;
        while i < self.active.len() {
            let id = self.active[i];
            let Some(entry) = self.jobs.get_mut(&id) else {
                self.active.remove(i);
                continue;
            };
            entry.job.update(&mut world.ctx(time));
            if !entry.job.is_complete() {
                i += 1;
                continue;
            }
            let name = entry.job.name();
            trace!("{name} {id:?} complete");
            let retained = entry.retained;
            self.active.remove(i);
            if !retained {
                self.jobs.remove(&id);
            }
            self.events.push(JobEvent::Completed {
                id,
                name,
                cancelled: false,
            });
        }

        world.grid.step(dt);
        world.grid.draw(&mut world.scene);
        for id in &self.active {
            if let Some(entry) = self.jobs.get(id) {
                entry.job.draw(&world.grid, &mut world.scene);
            }
        }

        self.pause_if_idle();
    }

    fn pause_if_idle(&mut self) {
        if self.active.is_empty() && !self.paused {
            debug!("animator idle, pausing");
            self.paused = true;
            self.last_frame = None;
        }
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn is_running(&self, id: JobId) -> bool {
        self.active.contains(&id)
    }

    /// Running jobs in registration order.
    pub fn active_jobs(&self) -> &[JobId] {
        &self.active
    }

    pub fn job(&self, id: JobId) -> Option<&dyn AnimationJob> {
        self.jobs.get(&id).map(|entry| entry.job.as_ref())
    }

    pub fn job_count(&self) -> usize {
        self.jobs.len()
    }

    pub fn drain_events(&mut self) -> Vec<JobEvent> {
        std::mem::take(&mut self.events)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jobs::test_support;
    use crate::jobs::{JobCtx, Timeline};
    use std::cell::RefCell;
    use std::rc::Rc;

    /// Records every call it receives.
    struct Probe {
        name: &'static str,
        timeline: Timeline,
        log: Rc<RefCell<Vec<String>>>,
    }

    impl Probe {
        fn new(name: &'static str, duration: f32, log: &Rc<RefCell<Vec<String>>>) -> Self {
            Self {
                name,
                timeline: Timeline::new(duration),
                log: Rc::clone(log),
            }
        }

        fn record(&self, what: &str) {
            self.log.borrow_mut().push(format!("{}:{what}", self.name));
        }
    }

    impl AnimationJob for Probe {
        fn name(&self) -> &'static str {
            self.name
        }

        fn init(&mut self) {
            self.timeline.reset();
            self.record("init");
        }

        fn start(&mut self, ctx: &mut JobCtx<'_>) {
            self.timeline.begin(ctx.time.now);
            self.record("start");
        }

        fn update(&mut self, ctx: &mut JobCtx<'_>) {
            self.record("update");
            if self.timeline.is_elapsed(ctx.time.now) {
                self.timeline.finish();
            }
        }

        fn draw(&self, _grid: &crate::grid::Grid, _scene: &mut crate::scene::Scene) {
            self.record("draw");
        }

        fn cancel(&mut self, _ctx: &mut JobCtx<'_>) {
            self.timeline.finish();
            self.record("cancel");
        }

        fn is_complete(&self) -> bool {
            self.timeline.is_complete()
        }
    }

    fn setup() -> (Animator, World, Rc<RefCell<Vec<String>>>) {
        (
            Animator::new(AnimatorOptions::default()),
            test_support::world(),
            Rc::new(RefCell::new(Vec::new())),
        )
    }

    #[test]
    fn updates_all_run_before_any_draw_in_registration_order() {
        let (mut animator, mut world, log) = setup();
        animator.spawn(Box::new(Probe::new("a", 10.0, &log)), &mut world, 0.0);
        animator.spawn(Box::new(Probe::new("b", 10.0, &log)), &mut world, 0.0);
        log.borrow_mut().clear();
        animator.frame(0.0, &mut world);
        assert_eq!(*log.borrow(), ["a:update", "b:update", "a:draw", "b:draw"]);
    }

    #[test]
    fn starting_twice_keeps_one_entry_and_resets_the_job() {
        let (mut animator, mut world, log) = setup();
        let id = animator.add(Box::new(Probe::new("p", 10.0, &log)));
        animator.start(id, &mut world, 0.0).unwrap();
        animator.frame(0.5, &mut world);
        animator.start(id, &mut world, 1.0).unwrap();
        assert_eq!(animator.active_jobs(), &[id]);
        let entries = log.borrow().iter().filter(|l| l.as_str() == "p:init").count();
        assert_eq!(entries, 2);
        assert!(log.borrow().contains(&"p:cancel".to_string()));
        assert!(animator.drain_events().is_empty(), "a restart is not a completion");
    }

    #[test]
    fn completed_jobs_are_evicted_and_reported() {
        let (mut animator, mut world, log) = setup();
        let short = animator.spawn(Box::new(Probe::new("short", 0.1, &log)), &mut world, 0.0);
        let long = animator.spawn(Box::new(Probe::new("long", 5.0, &log)), &mut world, 0.0);
        animator.frame(0.0, &mut world);
        animator.frame(0.2, &mut world);
        assert_eq!(animator.active_jobs(), &[long]);
        assert!(animator.job(short).is_none(), "one-shot jobs are dropped");
        assert_eq!(
            animator.drain_events(),
            vec![JobEvent::Completed {
                id: short,
                name: "short",
                cancelled: false
            }]
        );
    }

    #[test]
    fn retained_jobs_survive_completion_and_can_run_again() {
        let (mut animator, mut world, log) = setup();
        let id = animator.add(Box::new(Probe::new("p", 0.1, &log)));
        animator.start(id, &mut world, 0.0).unwrap();
        animator.frame(0.0, &mut world);
        animator.frame(0.2, &mut world);
        assert!(!animator.is_running(id));
        assert!(animator.job(id).is_some());
        assert!(animator.is_paused());
        animator.start(id, &mut world, 1.0).unwrap();
        assert!(animator.is_running(id));
        assert!(!animator.is_paused());
    }

    #[test]
    fn cancel_all_empties_the_registry_and_pauses() {
        let (mut animator, mut world, log) = setup();
        for name in ["a", "b", "c"] {
            animator.spawn(Box::new(Probe::new(name, 10.0, &log)), &mut world, 0.0);
        }
        assert!(!animator.is_paused());
        animator.cancel_all(&mut world, 0.0);
        assert!(animator.active_jobs().is_empty());
        assert!(animator.is_paused());
        let events = animator.drain_events();
        assert_eq!(events.len(), 3);
        assert!(events
            .iter()
            .all(|e| matches!(e, JobEvent::Completed { cancelled: true, .. })));
    }

    #[test]
    fn cancelling_an_idle_job_is_a_no_op() {
        let (mut animator, mut world, log) = setup();
        let id = animator.add(Box::new(Probe::new("p", 1.0, &log)));
        assert_eq!(animator.cancel(id, &mut world, 0.0), Ok(false));
        assert_eq!(
            animator.cancel(JobId(99), &mut world, 0.0),
            Err(AnimatorError::UnknownJob(JobId(99)))
        );
        assert!(animator.start(JobId(99), &mut world, 0.0).is_err());
    }

    #[test]
    fn delta_time_is_clamped() {
        let (mut animator, mut world, log) = setup();
        let id = animator.add(Box::new(Probe::new("p", 100.0, &log)));
        animator.start(id, &mut world, 0.0).unwrap();
        let tile = test_support::central_tile(&world.grid);
        world.grid.tiles_mut()[tile].particle.vel = glam::Vec2::new(100.0, 0.0);
        animator.frame(0.0, &mut world);
        let before = world.grid.tiles()[tile].particle.pos;
        animator.frame(10.0, &mut world);
        let moved = world.grid.tiles()[tile].particle.pos - before;
        let max_dt = AnimatorOptions::default().max_delta_time;
        assert!(moved.x <= 100.0 * max_dt + 1e-3, "moved {moved:?}");
    }
}
