/// Identifier for a tile in a [`crate::grid::Grid`].
///
/// This is an index into the grid's tile arena, and is only meaningful within
/// the lifetime of a given layout. A resize rebuilds the arena and invalidates
/// every id handed out before it.
pub type TileId = usize;

/// Identifier for a content record in [`crate::grid::Grid::posts`].
pub type PostId = usize;

/// One of the six neighbor directions (or corners) of a tile, in `0..6`.
pub type Direction = usize;

/// Number of neighbor slots / corners per tile.
pub const DIRECTION_COUNT: usize = 6;

/// Handle to a job owned by an [`crate::animator::Animator`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct JobId(pub(crate) u64);

/// Handle to a polyline overlay in a [`crate::scene::Scene`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct OverlayId(pub(crate) u64);

/// Token identifying the most recent expand/collapse operation on a grid.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ExpansionToken(pub(crate) u64);

/// Returns the direction pointing the opposite way.
#[inline]
pub fn opposite(d: Direction) -> Direction {
    (d + 3) % DIRECTION_COUNT
}

/// Returns `d` rotated by `steps` slots (positive = clockwise on screen).
#[inline]
pub fn rotate(d: Direction, steps: isize) -> Direction {
    (d as isize + steps).rem_euclid(DIRECTION_COUNT as isize) as Direction
}
