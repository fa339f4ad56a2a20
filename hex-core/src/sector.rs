//! The six wedges a grid splits into while a focus tile is expanded.
//!
//! Sector `i` covers every lattice cell `focus + (a + 1)·dir(i) + b·dir(i + 1)`
//! with `a, b >= 0`. Its origin is the focus tile's neighbor in direction `i`
//! (the "major" direction); `dir(i + 1)` is the "minor" direction. The six
//! wedges partition the plane around the focus tile.
//!
//! Expanding slides sector `i` by `N·dir(i - 1)` where `N` is the configured
//! displacement tile count. Adjacent sectors then shear along their shared
//! edge, so the expanded neighbor graph across that edge is shifted by `N`
//! cells; see [`Sector::stitch`].

use glam::Vec2;
use log::debug;

use crate::color::Hsl;
use crate::geometry::{Bounds, Lattice};
use crate::tile::{Tile, Topology, link};
use crate::types::{DIRECTION_COUNT, Direction, TileId, rotate};

/// `(major, minor)` cell offset of the neighbor in relative direction `r`,
/// where relative direction `r` is absolute direction `sector.index + r`.
const CELL_OFFSETS: [(isize, isize); DIRECTION_COUNT] =
    [(1, 0), (0, 1), (-1, 1), (-1, 0), (0, -1), (1, -1)];

const SQRT_3_2: f32 = 0.866_025_4;

/// Sparse `(major, minor)`-indexed table of a sector's tiles.
#[derive(Clone, Debug, Default)]
struct CellTable {
    rows: Vec<Vec<Option<TileId>>>,
}

impl CellTable {
    fn get(&self, a: isize, b: isize) -> Option<TileId> {
        if a < 0 || b < 0 {
            return None;
        }
        self.rows
            .get(a as usize)
            .and_then(|row| row.get(b as usize))
            .copied()
            .flatten()
    }

    fn insert(&mut self, a: usize, b: usize, id: TileId) {
        if self.rows.len() <= a {
            self.rows.resize_with(a + 1, Vec::new);
        }
        let row = &mut self.rows[a];
        if row.len() <= b {
            row.resize(b + 1, None);
        }
        if row[b].is_none() {
            row[b] = Some(id);
        }
    }

    fn major_len(&self) -> usize {
        self.rows.len()
    }

    fn minor_len(&self) -> usize {
        self.rows.iter().map(Vec::len).max().unwrap_or(0)
    }

    fn cells(&self) -> impl Iterator<Item = (usize, usize, TileId)> + '_ {
        self.rows.iter().enumerate().flat_map(|(a, row)| {
            row.iter()
                .enumerate()
                .filter_map(move |(b, id)| id.map(|id| (a, b, id)))
        })
    }

    fn is_released(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Everything a sector needs from its grid while it is being built.
#[derive(Clone, Copy, Debug)]
pub struct SectorContext<'a> {
    pub lattice: &'a Lattice,
    pub focus: TileId,
    /// Region (in home coordinates) that must be covered by tiles once the
    /// sector has slid out by its full displacement.
    pub viewport: Bounds,
    pub margin: f32,
    pub pan: Vec2,
    pub displacement_tiles: usize,
    pub color: Hsl,
    pub mass: f32,
}

#[derive(Clone, Debug)]
pub struct Sector {
    pub index: usize,
    pub major: Direction,
    pub minor: Direction,
    /// The focus tile's collapsed neighbor in the major direction.
    pub origin: TileId,
    /// Home position of the origin cell.
    pub home_anchor: Vec2,
    /// Anchor of the origin cell with no displacement applied.
    pub original_anchor: Vec2,
    /// Anchor of the origin cell at the current dilation.
    pub current_anchor: Vec2,
    /// Full slide of the wedge when the post is open.
    pub displacement: Vec2,
    /// Every tile in the wedge, old and synthesized.
    pub tiles: Vec<TileId>,
    offsets: Vec<Vec2>,
    dilation: f32,
    cells: CellTable,
}

impl Sector {
    /// Collects the wedge's existing tiles and synthesizes the missing ones.
    ///
    /// Synthesized tiles are appended to `tiles`. Neighbor links are not
    /// touched; see [`Sector::link_internal`] and [`Sector::stitch`].
    pub fn build(index: usize, tiles: &mut Vec<Tile>, ctx: &SectorContext<'_>) -> Option<Self> {
        let major = index % DIRECTION_COUNT;
        let minor = rotate(major, 1);
        let origin = tiles[ctx.focus]
            .neighbors(Topology::Collapsed)
            .neighbor(major)?;

        let lattice = ctx.lattice;
        let displacement =
            lattice.direction_vector(rotate(major, -1)) * ctx.displacement_tiles as f32;
        let home_anchor = tiles[ctx.focus].home + lattice.direction_vector(major);

        let mut cells = collect_existing(tiles, origin, major, minor);

        let bound = ctx
            .viewport
            .expanded(ctx.margin)
            .translated(-ctx.pan - displacement);
        let reach = bound.diagonal() / 2.0 + (bound.center() - home_anchor).length();
        let cap = (reach / (lattice.step * SQRT_3_2)).ceil() as usize + 2;
        let major_extent = cap.max(cells.major_len());
        let minor_extent = cap.max(cells.minor_len());

        let u = lattice.direction_vector(major);
        let v = lattice.direction_vector(minor);
        let mut synthesized = 0;
        for a in 0..major_extent {
            for b in 0..minor_extent {
                if cells.get(a as isize, b as isize).is_some() {
                    continue;
                }
                let home = home_anchor + u * a as f32 + v * b as f32;
                if !bound.contains(home) {
                    continue;
                }
                let id = tiles.len();
                tiles.push(Tile::synthetic(id, home, home + ctx.pan, ctx.color, ctx.mass));
                cells.insert(a, b, id);
                synthesized += 1;
            }
        }

        let mut sector_tiles = Vec::new();
        let mut offsets = Vec::new();
        for (_, _, id) in cells.cells() {
            sector_tiles.push(id);
            offsets.push(tiles[id].home - home_anchor);
        }
        debug!(
            "sector {index}: {} tiles ({synthesized} synthesized)",
            sector_tiles.len()
        );

        let original_anchor = home_anchor + ctx.pan;
        Some(Self {
            index,
            major,
            minor,
            origin,
            home_anchor,
            original_anchor,
            current_anchor: original_anchor,
            displacement,
            tiles: sector_tiles,
            offsets,
            dilation: 0.0,
            cells,
        })
    }

    /// Links every pair of adjacent cells of this wedge in the expanded
    /// topology.
    pub fn link_internal(&self, tiles: &mut [Tile], rest_length: f32) {
        for (a, b, id) in self.cells.cells() {
            for (r, &(da, db)) in CELL_OFFSETS.iter().enumerate().take(3) {
                let Some(other) = self.cells.get(a as isize + da, b as isize + db) else {
                    continue;
                };
                link(
                    tiles,
                    Topology::Expanded,
                    id,
                    rotate(self.major, r as isize),
                    other,
                    rest_length,
                );
            }
        }
    }

    /// Links this wedge's inner edge (`a = 0`) to the next wedge's inner edge
    /// (`b = 0`), accounting for the shear between the two displacements.
    ///
    /// Edge cell `(0, b)` meets the next sector's `(b - N, 0)` in direction
    /// `i + 2` and `(b - N - 1, 0)` in direction `i + 3`. The first `N` edge
    /// cells face the gap and get neither link; cell `N` only gets the first.
    pub fn stitch(
        &self,
        next: &Sector,
        tiles: &mut [Tile],
        displacement_tiles: usize,
        rest_length: f32,
    ) {
        let n = displacement_tiles as isize;
        let upper = rotate(self.major, 2);
        let lower = rotate(self.major, 3);
        for b in 0..self.cells.minor_len() as isize {
            let Some(id) = self.cells.get(0, b) else {
                continue;
            };
            if let Some(other) = next.cells.get(b - n, 0) {
                link(tiles, Topology::Expanded, id, upper, other, rest_length);
            }
            if let Some(other) = next.cells.get(b - n - 1, 0) {
                link(tiles, Topology::Expanded, id, lower, other, rest_length);
            }
        }
    }

    /// Drops the cell table once every sector is linked.
    pub fn release_table(&mut self) {
        self.cells = CellTable::default();
    }

    pub fn has_table(&self) -> bool {
        !self.cells.is_released()
    }

    pub fn dilation(&self) -> f32 {
        self.dilation
    }

    /// Moves the wedge rigidly to `dilation` (0 = collapsed, 1 = fully open).
    ///
    /// Each tile's original anchor is placed relative to the sector anchor;
    /// its current anchor is shifted by the same amount so that effects
    /// already applied this frame are kept.
    pub fn set_dilation(&mut self, dilation: f32, pan: Vec2, tiles: &mut [Tile]) {
        self.dilation = dilation;
        self.original_anchor = self.home_anchor + pan;
        self.current_anchor = self.original_anchor + self.displacement * dilation;
        for (&id, &offset) in self.tiles.iter().zip(&self.offsets) {
            let tile = &mut tiles[id];
            let target = self.current_anchor + offset;
            tile.anchor += target - tile.original_anchor;
            tile.original_anchor = target;
        }
    }

    pub fn contains(&self, id: TileId) -> bool {
        self.tiles.contains(&id)
    }
}

/// Walks the collapsed lattice from `origin` along the major then minor
/// chains, then along the minor then major chains.
///
/// Two sweeps are not exhaustive for every viewport shape: a cell whose two
/// L-shaped paths both leave the lattice is not found.
fn collect_existing(tiles: &[Tile], origin: TileId, major: Direction, minor: Direction) -> CellTable {
    let mut cells = CellTable::default();
    for (outer_dir, inner_dir, swapped) in [(major, minor, false), (minor, major, true)] {
        let mut outer = Some(origin);
        let mut i = 0;
        while let Some(start) = outer {
            let mut inner = Some(start);
            let mut j = 0;
            while let Some(id) = inner {
                let (a, b) = if swapped { (j, i) } else { (i, j) };
                cells.insert(a, b, id);
                inner = tiles[id].neighbors(Topology::Collapsed).neighbor(inner_dir);
                j += 1;
            }
            outer = tiles[start].neighbors(Topology::Collapsed).neighbor(outer_dir);
            i += 1;
        }
    }
    cells
}
