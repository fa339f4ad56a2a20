//! Core hex-tile grid simulation library.
//!
//! Main components:
//! - [`geometry`] — lattice layout, directions and corners.
//! - [`tile`] — tiles, their spring-mass particles and neighbor tables.
//! - [`sector`] — the six wedges a grid splits into around a focus tile.
//! - [`grid`] — the tile arena, expand/collapse and the physics step.
//! - [`scene`] — the retained shapes and overlays a renderer draws.
//! - [`animator`] — the cooperative job scheduler.
//! - [`jobs`] — the job catalog.
//! - [`recurrence`] — randomized timers for recurring jobs.
//! - [`stage`] — the context object tying input, jobs and timers together.
//! - [`config`] — options for every component, loaded from RON.
//! - [`error`] — error types for every fallible operation.
//! - [`post`] — content records and the open post's view state.
//! - [`world`] — the state jobs mutate, bundled for one frame.
//! - [`color`] — HSL colors.
//! - [`math`] — easing curves and interpolation.
//! - [`types`] — shared type aliases and IDs.

pub mod animator;
pub mod color;
pub mod config;
pub mod error;
pub mod geometry;
pub mod grid;
pub mod jobs;
pub mod math;
pub mod post;
pub mod recurrence;
pub mod scene;
pub mod sector;
pub mod stage;
pub mod tile;
pub mod types;
pub mod world;
