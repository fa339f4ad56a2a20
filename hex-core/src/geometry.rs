//! Hex lattice geometry and flat-index topology.
//!
//! Tiles are stored row by row in a flat arena. Even rows are the "larger"
//! rows with `W` tiles; odd rows are the "smaller" rows with `W - 1` tiles,
//! shifted by half a column so that the two interlock. Because every pair of
//! rows holds exactly `2W - 1` tiles, the index delta to each of the six
//! neighbors is the same for every tile; only tiles on the edge of the grid
//! need some of those deltas removed.
//!
//! Direction `k` and corner `k` are related: corner `k` sits between
//! directions `k` and `k + 1`, and is shared with those two neighbors.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::types::{DIRECTION_COUNT, Direction, TileId};

const SQRT_3: f32 = 1.732_050_8;

/// Which way the hex rows run.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Orientation {
    /// Pointy-top tiles in horizontal rows. Directions: E, SE, SW, W, NW, NE.
    Horizontal,
    /// Flat-top tiles in zig-zag half rows. Directions: N, NE, SE, S, SW, NW.
    Vertical,
}

impl Orientation {
    /// Angle of direction 0 in radians (screen space, y down).
    fn base_angle(self) -> f32 {
        match self {
            Orientation::Horizontal => 0.0,
            Orientation::Vertical => -std::f32::consts::FRAC_PI_2,
        }
    }

    /// Picks the orientation that fits a viewport best: vertical for
    /// portrait viewports, horizontal otherwise.
    pub fn for_viewport(viewport: Vec2) -> Self {
        if viewport.y > viewport.x {
            Orientation::Vertical
        } else {
            Orientation::Horizontal
        }
    }
}

/// Axis-aligned rectangle in world space.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Bounds {
    pub min: Vec2,
    pub max: Vec2,
}

impl Bounds {
    pub fn new(min: Vec2, max: Vec2) -> Self {
        Self { min, max }
    }

    pub fn contains(&self, p: Vec2) -> bool {
        p.x >= self.min.x && p.x <= self.max.x && p.y >= self.min.y && p.y <= self.max.y
    }

    pub fn expanded(&self, margin: f32) -> Self {
        Self::new(self.min - Vec2::splat(margin), self.max + Vec2::splat(margin))
    }

    pub fn translated(&self, offset: Vec2) -> Self {
        Self::new(self.min + offset, self.max + offset)
    }

    pub fn diagonal(&self) -> f32 {
        (self.max - self.min).length()
    }

    pub fn center(&self) -> Vec2 {
        (self.min + self.max) / 2.0
    }
}

/// Derived layout parameters of a hex lattice filling a viewport.
#[derive(Clone, Debug, PartialEq)]
pub struct Lattice {
    pub orientation: Orientation,
    pub outer_radius: f32,
    pub inner_radius: f32,
    pub gap: f32,
    /// Distance between the centers of two neighboring tiles.
    pub step: f32,
    pub row_delta_y: f32,
    /// Distance between two tiles in the same row.
    pub tile_delta_x: f32,
    pub row_count: usize,
    /// Tile count of the larger (even) rows. Smaller rows hold one fewer.
    pub larger_row_len: usize,
    pub larger_row_x: f32,
    pub smaller_row_x: f32,
    pub first_row_y: f32,
    deltas: [isize; DIRECTION_COUNT],
    directions: [Vec2; DIRECTION_COUNT],
    corners: [Vec2; DIRECTION_COUNT],
}

impl Lattice {
    /// Computes the lattice covering `viewport` (plus one tile of overflow on
    /// every side), centered on the viewport.
    pub fn new(outer_radius: f32, gap: f32, orientation: Orientation, viewport: Vec2) -> Self {
        let inner_radius = outer_radius * SQRT_3 / 2.0;
        let step = inner_radius * 2.0 + gap;

        let (row_delta_y, tile_delta_x) = match orientation {
            Orientation::Horizontal => (step * SQRT_3 / 2.0, step),
            Orientation::Vertical => (step / 2.0, step * SQRT_3),
        };

        let larger_row_len = ((viewport.x / tile_delta_x).ceil() as usize + 2).max(2);
        let extra_rows = match orientation {
            Orientation::Horizontal => 2,
            Orientation::Vertical => 4,
        };
        let row_count = ((viewport.y / row_delta_y).ceil() as usize + extra_rows).max(1);

        let center = viewport / 2.0;
        let larger_row_x = center.x - (larger_row_len - 1) as f32 * tile_delta_x / 2.0;
        let smaller_row_x = larger_row_x + tile_delta_x / 2.0;
        let first_row_y = center.y - (row_count - 1) as f32 * row_delta_y / 2.0;

        let w = larger_row_len as isize;
        let deltas = match orientation {
            Orientation::Horizontal => [1, w, w - 1, -1, -w, -(w - 1)],
            Orientation::Vertical => [-(2 * w - 1), -(w - 1), w, 2 * w - 1, w - 1, -w],
        };

        let base = orientation.base_angle();
        let sixth = std::f32::consts::TAU / DIRECTION_COUNT as f32;
        let directions =
            std::array::from_fn(|k| Vec2::from_angle(base + sixth * k as f32) * step);
        let corners =
            std::array::from_fn(|k| Vec2::from_angle(base + sixth * (k as f32 + 0.5)));

        Self {
            orientation,
            outer_radius,
            inner_radius,
            gap,
            step,
            row_delta_y,
            tile_delta_x,
            row_count,
            larger_row_len,
            larger_row_x,
            smaller_row_x,
            first_row_y,
            deltas,
            directions,
            corners,
        }
    }

    fn pair_len(&self) -> usize {
        2 * self.larger_row_len - 1
    }

    pub fn is_larger_row(&self, row: usize) -> bool {
        row % 2 == 0
    }

    pub fn row_len(&self, row: usize) -> usize {
        if self.is_larger_row(row) {
            self.larger_row_len
        } else {
            self.larger_row_len - 1
        }
    }

    pub fn tile_count(&self) -> usize {
        let pairs = self.row_count / 2;
        let tail = if self.row_count % 2 == 1 {
            self.larger_row_len
        } else {
            0
        };
        pairs * self.pair_len() + tail
    }

    pub fn index_of(&self, row: usize, col: usize) -> TileId {
        let base = (row / 2) * self.pair_len();
        if self.is_larger_row(row) {
            base + col
        } else {
            base + self.larger_row_len + col
        }
    }

    pub fn row_col(&self, index: TileId) -> (usize, usize) {
        let pair = index / self.pair_len();
        let rem = index % self.pair_len();
        if rem < self.larger_row_len {
            (pair * 2, rem)
        } else {
            (pair * 2 + 1, rem - self.larger_row_len)
        }
    }

    /// Rest position of the tile at `(row, col)`.
    pub fn position(&self, row: usize, col: usize) -> Vec2 {
        let x0 = if self.is_larger_row(row) {
            self.larger_row_x
        } else {
            self.smaller_row_x
        };
        Vec2::new(
            x0 + col as f32 * self.tile_delta_x,
            self.first_row_y + row as f32 * self.row_delta_y,
        )
    }

    /// The fixed flat-index delta for each direction.
    pub fn deltas(&self) -> [isize; DIRECTION_COUNT] {
        self.deltas
    }

    /// The index deltas valid for the tile at `(row, col)`; directions that
    /// would leave the grid are `None`.
    pub fn neighbor_deltas(&self, row: usize, col: usize) -> [Option<isize>; DIRECTION_COUNT] {
        let mut out = self.deltas.map(Some);
        let larger = self.is_larger_row(row);
        let last_col = self.row_len(row) - 1;
        let last_row = self.row_count - 1;

        let mut remove = |dirs: &[Direction]| {
            for &d in dirs {
                out[d] = None;
            }
        };

        match self.orientation {
            // E0 SE1 SW2 W3 NW4 NE5
            Orientation::Horizontal => {
                if row == 0 {
                    remove(&[4, 5]);
                }
                if row == last_row {
                    remove(&[1, 2]);
                }
                if col == 0 {
                    remove(&[3]);
                    if larger {
                        remove(&[4, 2]);
                    }
                }
                if col == last_col {
                    remove(&[0]);
                    if larger {
                        remove(&[5, 1]);
                    }
                }
            }
            // N0 NE1 SE2 S3 SW4 NW5
            Orientation::Vertical => {
                if row < 2 {
                    remove(&[0]);
                }
                if row + 2 > last_row {
                    remove(&[3]);
                }
                if row == 0 {
                    remove(&[1, 5]);
                }
                if row == last_row {
                    remove(&[2, 4]);
                }
                if larger && col == 0 {
                    remove(&[5, 4]);
                }
                if larger && col == last_col {
                    remove(&[1, 2]);
                }
            }
        }
        out
    }

    /// Neighbor indices of `index` in the collapsed lattice.
    pub fn neighbor_indices(&self, index: TileId) -> [Option<TileId>; DIRECTION_COUNT] {
        let (row, col) = self.row_col(index);
        self.neighbor_deltas(row, col)
            .map(|delta| delta.map(|delta| (index as isize + delta) as TileId))
    }

    /// Center-to-center vector towards the neighbor in direction `d`.
    pub fn direction_vector(&self, d: Direction) -> Vec2 {
        self.directions[d % DIRECTION_COUNT]
    }

    /// Unit offset from a tile center to its corner `c`.
    pub fn corner_unit(&self, c: Direction) -> Vec2 {
        self.corners[c % DIRECTION_COUNT]
    }

    /// Corner offsets for a tile of outer radius `outer_radius * scale`.
    pub fn corner_offsets(&self, scale: f32) -> [Vec2; DIRECTION_COUNT] {
        self.corners.map(|c| c * self.outer_radius * scale)
    }

    /// Whether `(row, col)` is at one of the lattice's four corners.
    pub fn is_corner_cell(&self, row: usize, col: usize) -> bool {
        let edge_row = row == 0 || row == self.row_count - 1;
        let edge_col = col == 0 || col == self.row_len(row) - 1;
        edge_row && edge_col
    }
}
