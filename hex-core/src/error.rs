//! Error types for the grid core.
//!
//! The core performs no I/O apart from configuration parsing, so almost every
//! error here is a violated precondition reported back to the caller that
//! asked for the operation.

use thiserror::Error;

use crate::types::{Direction, JobId, TileId};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum GridError {
    #[error("invalid layout: {0}")]
    InvalidLayout(String),

    #[error("tile {0} does not exist in the current layout")]
    UnknownTile(TileId),

    #[error("tile {0} is a border tile and cannot be expanded")]
    BorderFocus(TileId),

    #[error("the grid is already expanded around tile {0}")]
    AlreadyExpanded(TileId),

    #[error("the grid is not expanded")]
    NotExpanded,

    #[error("topology violation: {0}")]
    Topology(String),
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum EffectError {
    #[error("corner {0} is out of range")]
    InvalidCorner(usize),

    #[error("a line cannot start at tile {tile} corner {corner} heading {direction:?}")]
    InvalidLineStart {
        tile: TileId,
        corner: Direction,
        direction: crate::jobs::line::RelativeDirection,
    },

    #[error("tile {0} is not part of the active layout")]
    InactiveTile(TileId),

    #[error("carousel entry {index} out of range for a post with {len} entries")]
    CarouselIndex { index: usize, len: usize },

    #[error(transparent)]
    Grid(#[from] GridError),
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum AnimatorError {
    #[error("job {0:?} is not owned by this animator")]
    UnknownJob(JobId),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse RON: {0}")]
    Parse(#[from] ron::error::SpannedError),
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum StageError {
    #[error(transparent)]
    Grid(#[from] GridError),

    #[error(transparent)]
    Effect(#[from] EffectError),

    #[error(transparent)]
    Animator(#[from] AnimatorError),
}
