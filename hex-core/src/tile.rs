//! Tiles, their neighbor tables and the per-frame spring-damper step.
//!
//! Every tile carries two neighbor tables. The collapsed table describes the
//! static lattice and is always valid. The expanded table is only valid while
//! the grid is expanded around a focus tile; it is rebuilt by the sectors on
//! each expansion and cleared when the grid collapses.
//!
//! Links are reciprocal: if tile `a` holds `b` in slot `k`, then `b` holds `a`
//! in slot `k + 3`. The reciprocal slot doubles as the pair's force cache:
//! whichever tile of a pair is stepped first computes the spring force, applies
//! it to itself and parks the negated force in the other tile's slot, where it
//! is consumed on that tile's step.

use glam::Vec2;

use crate::color::Hsl;
use crate::config::TileOptions;
use crate::types::{DIRECTION_COUNT, Direction, PostId, TileId, opposite};

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Particle {
    pub pos: Vec2,
    pub vel: Vec2,
    pub force: Vec2,
    pub mass: f32,
}

impl Particle {
    pub fn at_rest(pos: Vec2, mass: f32) -> Self {
        Self {
            pos,
            vel: Vec2::ZERO,
            force: Vec2::ZERO,
            mass,
        }
    }

    /// Integrates the accumulated force over `dt` and clears the accumulator.
    ///
    /// Position advances with the velocity of the previous step, then the
    /// velocity picks up the new acceleration. Components below the
    /// configured thresholds are zeroed to keep resting tiles still.
    fn integrate(&mut self, dt: f32, options: &TileOptions) {
        self.force = suppress(self.force, options.force_suppression_threshold);
        let acc = self.force / self.mass;
        self.pos += self.vel * dt;
        self.vel += acc * dt;
        self.vel = suppress(self.vel, options.velocity_suppression_threshold);
        self.force = Vec2::ZERO;
    }
}

fn suppress(v: Vec2, threshold: f32) -> Vec2 {
    Vec2::new(
        if v.x.abs() < threshold { 0.0 } else { v.x },
        if v.y.abs() < threshold { 0.0 } else { v.y },
    )
}

/// One occupied neighbor slot.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct NeighborLink {
    pub tile: TileId,
    pub rest_length: f32,
    pending_force: Option<Vec2>,
}

impl NeighborLink {
    pub fn new(tile: TileId, rest_length: f32) -> Self {
        Self {
            tile,
            rest_length,
            pending_force: None,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct NeighborTable {
    slots: [Option<NeighborLink>; DIRECTION_COUNT],
}

impl NeighborTable {
    pub fn link(&self, d: Direction) -> Option<&NeighborLink> {
        self.slots[d % DIRECTION_COUNT].as_ref()
    }

    pub fn neighbor(&self, d: Direction) -> Option<TileId> {
        self.link(d).map(|link| link.tile)
    }

    pub fn count(&self) -> usize {
        self.slots.iter().flatten().count()
    }

    pub fn is_border(&self) -> bool {
        self.count() < DIRECTION_COUNT
    }

    pub fn iter(&self) -> impl Iterator<Item = (Direction, &NeighborLink)> + '_ {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(d, slot)| slot.as_ref().map(|link| (d, link)))
    }

    pub fn clear(&mut self) {
        self.slots = Default::default();
    }

    fn set(&mut self, d: Direction, link: NeighborLink) {
        self.slots[d] = Some(link);
    }

    fn take_pending(&mut self, d: Direction) -> Option<Vec2> {
        self.slots[d].as_mut().and_then(|link| link.pending_force.take())
    }

    fn park_force(&mut self, d: Direction, force: Vec2) {
        if let Some(link) = self.slots[d].as_mut() {
            link.pending_force = Some(force);
        }
    }
}

/// Which of a tile's two neighbor tables is in effect.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Topology {
    Collapsed,
    Expanded,
}

#[derive(Clone, Debug)]
pub struct Tile {
    pub id: TileId,
    /// Lattice position, before pan and sector displacement.
    pub home: Vec2,
    /// `(row, col)` in the static lattice; `None` for synthesized tiles.
    pub cell: Option<(usize, usize)>,
    /// Baseline anchor the reset job restores every frame.
    pub original_anchor: Vec2,
    /// Target the particle is pulled toward; effects displace it.
    pub anchor: Vec2,
    pub particle: Particle,
    pub original_color: Hsl,
    pub color: Hsl,
    pub original_image_opacity: f32,
    pub image_opacity: f32,
    /// Multiplier on the outer radius; the focus tile grows while a post is open.
    pub scale: f32,
    pub post: Option<PostId>,
    pub is_corner: bool,
    pub is_margin: bool,
    pub is_synthetic: bool,
    pub vertices: [Vec2; DIRECTION_COUNT],
    collapsed: NeighborTable,
    expanded: NeighborTable,
}

impl Tile {
    pub fn new(id: TileId, home: Vec2, color: Hsl, mass: f32) -> Self {
        Self {
            id,
            home,
            cell: None,
            original_anchor: home,
            anchor: home,
            particle: Particle::at_rest(home, mass),
            original_color: color,
            color,
            original_image_opacity: 0.0,
            image_opacity: 0.0,
            scale: 1.0,
            post: None,
            is_corner: false,
            is_margin: false,
            is_synthetic: false,
            vertices: [home; DIRECTION_COUNT],
            collapsed: NeighborTable::default(),
            expanded: NeighborTable::default(),
        }
    }

    /// A tile created by a sector beyond the edge of the static lattice.
    /// `pos` is where it appears; `home` is its lattice position.
    pub fn synthetic(id: TileId, home: Vec2, pos: Vec2, color: Hsl, mass: f32) -> Self {
        let mut tile = Self::new(id, home, color, mass);
        tile.is_synthetic = true;
        tile.original_anchor = pos;
        tile.anchor = pos;
        tile.particle.pos = pos;
        tile.vertices = [pos; DIRECTION_COUNT];
        tile
    }

    pub fn neighbors(&self, topology: Topology) -> &NeighborTable {
        match topology {
            Topology::Collapsed => &self.collapsed,
            Topology::Expanded => &self.expanded,
        }
    }

    pub(crate) fn neighbors_mut(&mut self, topology: Topology) -> &mut NeighborTable {
        match topology {
            Topology::Collapsed => &mut self.collapsed,
            Topology::Expanded => &mut self.expanded,
        }
    }

    pub fn is_border(&self, topology: Topology) -> bool {
        self.neighbors(topology).is_border()
    }

    pub fn has_content(&self) -> bool {
        self.post.is_some()
    }

    /// Recomputes the six vertices around the particle.
    pub fn update_vertices(&mut self, corner_offsets: &[Vec2; DIRECTION_COUNT]) {
        let center = self.particle.pos;
        let scale = self.scale;
        self.vertices = std::array::from_fn(|c| center + corner_offsets[c] * scale);
    }

    /// The vertices flattened as `x0, y0, x1, y1, ...`.
    pub fn polygon(&self) -> [f32; 2 * DIRECTION_COUNT] {
        let mut out = [0.0; 2 * DIRECTION_COUNT];
        for (i, v) in self.vertices.iter().enumerate() {
            out[2 * i] = v.x;
            out[2 * i + 1] = v.y;
        }
        out
    }

    /// World position of corner `c`, following the particle.
    pub fn corner_position(&self, c: Direction) -> Vec2 {
        self.vertices[c % DIRECTION_COUNT]
    }
}

/// Links `a` to `b` in direction `d` (and `b` to `a` in the opposite one).
pub fn link(
    tiles: &mut [Tile],
    topology: Topology,
    a: TileId,
    d: Direction,
    b: TileId,
    rest_length: f32,
) {
    tiles[a]
        .neighbors_mut(topology)
        .set(d, NeighborLink::new(b, rest_length));
    tiles[b]
        .neighbors_mut(topology)
        .set(opposite(d), NeighborLink::new(a, rest_length));
}

/// Damped Hooke force on particle `a` from a spring to particle `b`.
fn spring_force(a: &Particle, b: &Particle, rest_length: f32, k: f32, c: f32) -> Vec2 {
    let delta = b.pos - a.pos;
    let dist = delta.length();
    if dist <= f32::EPSILON {
        return Vec2::ZERO;
    }
    let dir = delta / dist;
    let stretch = dist - rest_length;
    let closing_speed = (b.vel - a.vel).dot(dir);
    dir * (k * stretch + c * closing_speed)
}

/// Advances every tile in `active` by one physics step.
///
/// Tiles are stepped in order; each one sums drag, its neighbor springs in
/// the given topology and its anchor spring, integrates, and refreshes its
/// vertices.
pub fn step_tiles(
    tiles: &mut [Tile],
    active: &[TileId],
    topology: Topology,
    dt: f32,
    options: &TileOptions,
    corner_offsets: &[Vec2; DIRECTION_COUNT],
) {
    for &id in active {
        let mut force = -options.drag * tiles[id].particle.vel;

        for d in 0..DIRECTION_COUNT {
            let Some(link) = tiles[id].neighbors(topology).link(d).copied() else {
                continue;
            };
            if let Some(parked) = tiles[id].neighbors_mut(topology).take_pending(d) {
                force += parked;
                continue;
            }
            let f = spring_force(
                &tiles[id].particle,
                &tiles[link.tile].particle,
                link.rest_length,
                options.neighbor_spring,
                options.neighbor_damping,
            );
            force += f;
            tiles[link.tile]
                .neighbors_mut(topology)
                .park_force(opposite(d), -f);
        }

        let tile = &mut tiles[id];
        let (k, c) = if tile.is_border(topology) {
            (options.border_anchor_spring, options.border_anchor_damping)
        } else {
            (options.anchor_spring, options.anchor_damping)
        };
        force += k * (tile.anchor - tile.particle.pos) - c * tile.particle.vel;

        tile.particle.force += force;
        tile.particle.integrate(dt, options);
        tile.update_vertices(corner_offsets);
    }
}
