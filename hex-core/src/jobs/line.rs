//! Lines walking the edges of the tile lattice.
//!
//! A line's head is a vertex, named by one tile and one of its corners. Up
//! to three edges leave every vertex: two along the tile's own outline and
//! one between the two neighbors that share the corner. Corner `c` of tile
//! `T` is also corner `c + 2` of `T`'s neighbor in direction `c`, and corner
//! `c + 4` of its neighbor in direction `c + 1`; the smallest of those names
//! identifies the vertex.

use log::debug;
use rand::seq::IndexedRandom;

use super::{AnimationJob, Children, JobCtx, Timeline};
use crate::config::LineOptions;
use crate::error::EffectError;
use crate::grid::Grid;
use crate::scene::{Overlay, Scene};
use crate::tile::Topology;
use crate::types::{DIRECTION_COUNT, Direction, OverlayId, TileId, rotate};

/// An edge leaving a vertex, relative to the tile the vertex is named by.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RelativeDirection {
    /// Along the tile outline to the next corner.
    Clockwise,
    /// Along the tile outline to the previous corner.
    CounterClockwise,
    /// Away from the tile, between the two neighbors sharing the corner.
    Neighbor,
}

impl RelativeDirection {
    pub const ALL: [RelativeDirection; 3] = [
        RelativeDirection::Clockwise,
        RelativeDirection::CounterClockwise,
        RelativeDirection::Neighbor,
    ];
}

/// A lattice vertex named by a tile and one of its corners.
pub type Vertex = (TileId, Direction);

/// The smallest of the names shared by the tiles meeting at `(tile, corner)`.
fn vertex_key(grid: &Grid, topology: Topology, (tile, corner): Vertex) -> Vertex {
    let neighbors = grid.tiles()[tile].neighbors(topology);
    let mut key = (tile, corner);
    if let Some(n1) = neighbors.neighbor(corner) {
        key = key.min((n1, rotate(corner, 2)));
    }
    if let Some(n2) = neighbors.neighbor(rotate(corner, 1)) {
        key = key.min((n2, rotate(corner, 4)));
    }
    key
}

/// The vertex reached by following `direction` from `(tile, corner)`.
fn step(
    grid: &Grid,
    topology: Topology,
    (tile, corner): Vertex,
    direction: RelativeDirection,
) -> Option<Vertex> {
    match direction {
        RelativeDirection::Clockwise => Some((tile, rotate(corner, 1))),
        RelativeDirection::CounterClockwise => Some((tile, rotate(corner, -1))),
        RelativeDirection::Neighbor => {
            let neighbors = grid.tiles()[tile].neighbors(topology);
            if let Some(n1) = neighbors.neighbor(corner) {
                Some((n1, rotate(corner, 1)))
            } else {
                neighbors
                    .neighbor(rotate(corner, 1))
                    .map(|n2| (n2, rotate(corner, 5)))
            }
        }
    }
}

pub struct LineJob {
    options: LineOptions,
    start: Vertex,
    forced: Option<RelativeDirection>,
    timeline: Timeline,
    path: Vec<Vertex>,
    previous_key: Option<Vertex>,
    next_step_at: f64,
    overlay: Option<OverlayId>,
}

impl LineJob {
    /// Creates a line starting at corner `corner` of `tile`.
    ///
    /// `forced` fixes the first edge; otherwise it is picked at random.
    /// Forcing [`RelativeDirection::Neighbor`] at a corner neither of whose
    /// neighbors exists is an error.
    pub fn new(
        grid: &Grid,
        tile: TileId,
        corner: Direction,
        forced: Option<RelativeDirection>,
        options: LineOptions,
    ) -> Result<Self, EffectError> {
        if corner >= DIRECTION_COUNT {
            return Err(EffectError::InvalidCorner(corner));
        }
        if !grid.is_active(tile) {
            return Err(EffectError::InactiveTile(tile));
        }
        if let Some(direction) = forced {
            if step(grid, grid.topology(), (tile, corner), direction).is_none() {
                return Err(EffectError::InvalidLineStart {
                    tile,
                    corner,
                    direction,
                });
            }
        }
        Ok(Self {
            timeline: Timeline::new(options.duration),
            options,
            start: (tile, corner),
            forced,
            path: Vec::new(),
            previous_key: None,
            next_step_at: 0.0,
            overlay: None,
        })
    }

    pub fn first_corner(&self) -> Direction {
        self.start.1
    }

    pub fn start_tile(&self) -> TileId {
        self.start.0
    }

    /// Vertices visited so far, head last.
    pub fn path(&self) -> &[Vertex] {
        &self.path
    }

    /// Moves the head one edge. Returns `false` when it is stuck.
    fn advance(&mut self, ctx: &mut JobCtx<'_>) -> bool {
        let grid = &*ctx.grid;
        let topology = grid.topology();
        let Some(&head) = self.path.last() else {
            return false;
        };
        if !grid.is_active(head.0) {
            return false;
        }
        let head_key = vertex_key(grid, topology, head);

        let next = if self.path.len() == 1 && self.forced.is_some() {
            self.forced.and_then(|d| step(grid, topology, head, d))
        } else {
            let candidates: Vec<Vertex> = RelativeDirection::ALL
                .iter()
                .filter_map(|&d| step(grid, topology, head, d))
                .filter(|&v| grid.is_active(v.0))
                .filter(|&v| Some(vertex_key(grid, topology, v)) != self.previous_key)
                .collect();
            candidates.choose(ctx.rng).copied()
        };

        match next {
            Some(vertex) => {
                self.previous_key = Some(head_key);
                self.path.push(vertex);
                true
            }
            None => {
                debug!("line from {:?} stuck at {head:?}", self.start);
                false
            }
        }
    }

    fn release_overlay(&mut self, scene: &mut Scene) {
        if let Some(id) = self.overlay.take() {
            scene.remove_overlay(id);
        }
    }
}

impl AnimationJob for LineJob {
    fn name(&self) -> &'static str {
        "line"
    }

    fn init(&mut self) {
        self.timeline.reset();
        self.path.clear();
        self.previous_key = None;
    }

    fn start(&mut self, ctx: &mut JobCtx<'_>) {
        let now = ctx.time.now;
        self.timeline.begin(now);
        self.path = vec![self.start];
        self.next_step_at = now + self.options.segment_duration as f64;
        self.release_overlay(ctx.scene);
        self.overlay = Some(ctx.scene.create_overlay(Overlay {
            points: Vec::new(),
            color: self.options.color,
            opacity: self.options.opacity,
            width: self.options.width,
        }));
    }

    fn update(&mut self, ctx: &mut JobCtx<'_>) {
        let now = ctx.time.now;
        if self.timeline.is_elapsed(now) {
            self.release_overlay(ctx.scene);
            self.timeline.finish();
            return;
        }
        let segment = self.options.segment_duration.max(1e-3) as f64;
        while now >= self.next_step_at {
            self.next_step_at += segment;
            if !self.advance(ctx) {
                self.next_step_at = f64::INFINITY;
            }
        }
        if let Some(id) = self.overlay {
            if let Some(overlay) = ctx.scene.overlay_mut(id) {
                overlay.opacity = self.options.opacity * (1.0 - self.timeline.progress(now));
            }
        }
    }

    fn draw(&self, grid: &Grid, scene: &mut Scene) {
        let Some(overlay) = self.overlay.and_then(|id| scene.overlay_mut(id)) else {
            return;
        };
        let tail = self.options.tail_length.max(1) + 1;
        let from = self.path.len().saturating_sub(tail);
        overlay.points = self.path[from..]
            .iter()
            .filter_map(|&(tile, corner)| grid.tile(tile).map(|t| t.corner_position(corner)))
            .collect();
    }

    fn cancel(&mut self, ctx: &mut JobCtx<'_>) {
        self.release_overlay(ctx.scene);
        self.timeline.finish();
    }

    fn is_complete(&self) -> bool {
        self.timeline.is_complete()
    }
}

/// Six lines leaving a tile, one from each corner that has an outward edge.
pub struct LinesRadiateJob {
    tile: TileId,
    children: Children,
    timeline: Timeline,
}

impl LinesRadiateJob {
    pub fn new(grid: &Grid, tile: TileId, options: &LineOptions) -> Result<Self, EffectError> {
        if !grid.is_active(tile) {
            return Err(EffectError::InactiveTile(tile));
        }
        let mut children = Children::new();
        for corner in 0..DIRECTION_COUNT {
            match LineJob::new(
                grid,
                tile,
                corner,
                Some(RelativeDirection::Neighbor),
                options.clone(),
            ) {
                Ok(line) => children.push(0.0, Box::new(line)),
                Err(err) => debug!("skipping corner {corner}: {err}"),
            }
        }
        Ok(Self {
            tile,
            children,
            timeline: Timeline::new(options.duration),
        })
    }

    pub fn tile(&self) -> TileId {
        self.tile
    }

    pub fn line_count(&self) -> usize {
        self.children.len()
    }
}

impl AnimationJob for LinesRadiateJob {
    fn name(&self) -> &'static str {
        "lines-radiate"
    }

    fn init(&mut self) {
        self.timeline.reset();
        self.children.init();
    }

    fn start(&mut self, ctx: &mut JobCtx<'_>) {
        self.timeline.begin(ctx.time.now);
        self.children.update(ctx, 0.0);
    }

    fn update(&mut self, ctx: &mut JobCtx<'_>) {
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jobs::FrameTime;
    use crate::jobs::test_support;

    #[test]
    fn vertex_keys_agree_across_the_three_tiles() {
        let world = test_support::world();
        let grid = &world.grid;
        let topology = grid.topology();
        let t = test_support::central_tile(grid);
        for c in 0..DIRECTION_COUNT {
            let key = vertex_key(grid, topology, (t, c));
            let n1 = grid.tiles()[t].neighbors(topology).neighbor(c).unwrap();
            let n2 = grid.tiles()[t].neighbors(topology).neighbor(rotate(c, 1)).unwrap();
            assert_eq!(vertex_key(grid, topology, (n1, rotate(c, 2))), key);
            assert_eq!(vertex_key(grid, topology, (n2, rotate(c, 4))), key);
        }
    }

    #[test]
    fn corner_names_share_a_position() {
        let mut world = test_support::world();
        world.grid.step(0.0);
        let grid = &world.grid;
        let t = test_support::central_tile(grid);
        let n1 = grid.tiles()[t].neighbors(Topology::Collapsed).neighbor(0).unwrap();
        let a = grid.tiles()[t].corner_position(0);
        let b = grid.tiles()[n1].corner_position(2);
        // The two tiles are a gap apart, so their corners are close but not equal.
        assert!(a.distance(b) <= grid.lattice().gap * 1.5 + 1e-3);
    }

    #[test]
    fn neighbor_line_from_an_interior_tile_starts_at_the_requested_corner() {
        let world = test_support::world();
        let t = test_support::central_tile(&world.grid);
        for corner in 0..DIRECTION_COUNT {
            let line = LineJob::new(
                &world.grid,
                t,
                corner,
                Some(RelativeDirection::Neighbor),
                LineOptions::default(),
            )
            .unwrap();
            assert_eq!(line.first_corner(), corner);
            assert_eq!(line.start_tile(), t);
        }
    }

    #[test]
    fn forced_neighbor_at_an_open_corner_is_rejected() {
        let world = test_support::world();
        // Tile 0 is the top-left tile: it has no west or north-west neighbor.
        let err = LineJob::new(
            &world.grid,
            0,
            3,
            Some(RelativeDirection::Neighbor),
            LineOptions::default(),
        )
        .err()
        .unwrap();
        assert_eq!(
            err,
            EffectError::InvalidLineStart {
                tile: 0,
                corner: 3,
                direction: RelativeDirection::Neighbor
            }
        );
        assert!(matches!(
            LineJob::new(&world.grid, 0, 6, None, LineOptions::default()),
            Err(EffectError::InvalidCorner(6))
        ));
    }

    #[test]
    fn line_walks_without_backtracking() {
        let mut world = test_support::world();
        let t = test_support::central_tile(&world.grid);
        let options = LineOptions {
            duration: 2.0,
            segment_duration: 0.1,
            ..LineOptions::default()
        };
        let mut line = LineJob::new(&world.grid, t, 0, Some(RelativeDirection::Neighbor), options)
            .unwrap();
        let mut ctx = world.ctx(FrameTime { now: 0.0, dt: 0.0 });
        line.start(&mut ctx);
        ctx.time.now = 1.05;
        line.update(&mut ctx);
        let path = line.path().to_vec();
        assert_eq!(path.len(), 11);
        assert_eq!(path[0], (t, 0));
        let n1 = world.grid.tiles()[t].neighbors(Topology::Collapsed).neighbor(0).unwrap();
        assert_eq!(path[1], (n1, 1), "forced first move goes between the neighbors");

        let topology = world.grid.topology();
        let keys: Vec<Vertex> = path.iter().map(|&v| vertex_key(&world.grid, topology, v)).collect();
        for w in keys.windows(3) {
            assert_ne!(w[0], w[2], "line doubled back: {keys:?}");
        }
        for w in keys.windows(2) {
            assert_ne!(w[0], w[1]);
        }
    }

    #[test]
    fn line_owns_its_overlay_until_it_ends() {
        let mut world = test_support::world();
        let t = test_support::central_tile(&world.grid);
        let mut line = LineJob::new(&world.grid, t, 2, None, LineOptions::default()).unwrap();
        let mut ctx = world.ctx(FrameTime::default());
        line.start(&mut ctx);
        assert_eq!(ctx.scene.overlay_count(), 1);
        ctx.time.now = 0.5;
        line.update(&mut ctx);
        line.draw(&world.grid, &mut world.scene);
        let (_, overlay) = world.scene.overlays().next().unwrap();
        assert!(overlay.points.len() >= 2);
        assert!(overlay.points.len() <= LineOptions::default().tail_length + 1);

        let mut ctx = world.ctx(FrameTime::default());
        line.cancel(&mut ctx);
        assert_eq!(world.scene.overlay_count(), 0);
        assert!(line.is_complete());
    }

    #[test]
    fn lines_radiate_from_every_corner_of_an_interior_tile() {
        let mut world = test_support::world();
        let t = test_support::central_tile(&world.grid);
        let mut job = LinesRadiateJob::new(&world.grid, t, &LineOptions::default()).unwrap();
        assert_eq!(job.line_count(), 6);
        let mut ctx = world.ctx(FrameTime::default());
        job.init();
        job.start(&mut ctx);
        assert_eq!(ctx.scene.overlay_count(), 6);
        job.cancel(&mut ctx);
        assert_eq!(world.scene.overlay_count(), 0);
    }

    #[test]
    fn lines_radiate_skips_corners_without_an_outward_edge() {
        let world = test_support::world();
        let job = LinesRadiateJob::new(&world.grid, 0, &LineOptions::default()).unwrap();
        assert!(job.line_count() < 6);
    }

    #[test]
    fn lines_radiate_completes_with_its_lines() {
        let mut world = test_support::world();
        let t = test_support::central_tile(&world.grid);
        let options = LineOptions {
            duration: 0.5,
            ..LineOptions::default()
        };
        let mut job = LinesRadiateJob::new(&world.grid, t, &options).unwrap();
        let done = test_support::run(&mut job, &mut world, 0.05, 3.0);
        assert!(done.is_some());
        assert_eq!(world.scene.overlay_count(), 0);
    }
}
