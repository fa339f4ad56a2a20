//! The board: the tile arena, its layout, and the expand/collapse state.
//!
//! The first `original_count` tiles of the arena are the static lattice and
//! live as long as the layout. Expanding a focus tile splits the board into
//! six [`Sector`]s, which may append synthesized tiles to the arena;
//! collapsing truncates the arena back to the originals.
//!
//! The active tile set is the originals while collapsed, and the focus tile
//! plus every sector's tiles while expanded. Only active tiles are stepped
//! and drawn.

use glam::Vec2;
use log::{debug, info, warn};
use rand::Rng;
use rand::seq::SliceRandom;

use crate::config::{GridOptions, TileOptions};
use crate::error::GridError;
use crate::geometry::{Bounds, Lattice, Orientation};
use crate::post::{PostData, PostView};
use crate::scene::{Fill, PostPlacement, Scene};
use crate::sector::{Sector, SectorContext};
use crate::tile::{Tile, Topology, link, step_tiles};
use crate::types::{DIRECTION_COUNT, ExpansionToken, PostId, TileId, opposite};

#[derive(Clone, Debug)]
pub struct Grid {
    pub options: GridOptions,
    pub tile_options: TileOptions,
    /// Animated state of the open post.
    pub post_view: PostView,
    viewport: Vec2,
    lattice: Lattice,
    tiles: Vec<Tile>,
    original_count: usize,
    active: Vec<TileId>,
    active_mask: Vec<bool>,
    sectors: Vec<Sector>,
    focus: Option<TileId>,
    pan: Vec2,
    expansion: u64,
    posts: Vec<PostData>,
    corner_offsets: [Vec2; DIRECTION_COUNT],
}

impl Grid {
    pub fn new<R: Rng + ?Sized>(
        options: GridOptions,
        tile_options: TileOptions,
        viewport: Vec2,
        posts: Vec<PostData>,
        rng: &mut R,
    ) -> Result<Self, GridError> {
        let lattice = compute_lattice(&options, viewport)?;
        let mut grid = Self {
            options,
            tile_options,
            post_view: PostView::default(),
            viewport,
            corner_offsets: lattice.corner_offsets(1.0),
            lattice,
            tiles: Vec::new(),
            original_count: 0,
            active: Vec::new(),
            active_mask: Vec::new(),
            sectors: Vec::new(),
            focus: None,
            pan: Vec2::ZERO,
            expansion: 0,
            posts,
        };
        grid.layout(rng);
        Ok(grid)
    }

    /// Rebuilds the layout for a new viewport size. Any expansion is dropped.
    pub fn resize<R: Rng + ?Sized>(&mut self, viewport: Vec2, rng: &mut R) -> Result<(), GridError> {
        self.lattice = compute_lattice(&self.options, viewport)?;
        self.viewport = viewport;
        self.layout(rng);
        Ok(())
    }

    /// Recomputes the lattice and rebuilds the layout after `options` changed.
    pub fn on_options_changed<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Result<(), GridError> {
        self.resize(self.viewport, rng)
    }

    fn layout<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        let lattice = &self.lattice;
        let count = lattice.tile_count();
        let center = self.viewport / 2.0;
        let half_column = self.options.content_column_fraction * self.viewport.x / 2.0;

        let mut tiles: Vec<Tile> = (0..count)
            .map(|id| {
                let (row, col) = lattice.row_col(id);
                let home = lattice.position(row, col);
                let mut tile = Tile::new(id, home, self.options.base_color, self.tile_options.mass);
                tile.cell = Some((row, col));
                tile.is_corner = lattice.is_corner_cell(row, col);
                tile.is_margin = (home.x - center.x).abs() > half_column;
                tile
            })
            .collect();

        for id in 0..count {
            for (d, n) in lattice.neighbor_indices(id).into_iter().enumerate() {
                if let Some(n) = n.filter(|&n| n > id) {
                    link(&mut tiles, Topology::Collapsed, id, d, n, lattice.step);
                }
            }
        }

        let mut candidates: Vec<TileId> = tiles
            .iter()
            .filter(|t| !t.is_border(Topology::Collapsed) && !t.is_margin)
            .map(|t| t.id)
            .collect();
        candidates.shuffle(rng);
        if self.posts.len() > candidates.len() {
            warn!(
                "{} posts but only {} content slots; the rest are not shown",
                self.posts.len(),
                candidates.len()
            );
        }
        for (post, &id) in candidates.iter().take(self.posts.len()).enumerate() {
            let tile = &mut tiles[id];
            tile.post = Some(post);
            tile.original_color = self.options.content_color;
            tile.color = self.options.content_color;
            tile.original_image_opacity = self.options.content_image_opacity;
            tile.image_opacity = self.options.content_image_opacity;
        }

        self.corner_offsets = lattice.corner_offsets(1.0);
        self.tiles = tiles;
        self.original_count = count;
        self.sectors.clear();
        self.focus = None;
        self.expansion += 1;
        self.post_view = PostView::default();
        self.reset_active();
        self.apply_pan_to_originals();

        info!(
            "grid layout: {:?}, {} rows x {} cols, {} tiles",
            self.lattice.orientation, self.lattice.row_count, self.lattice.larger_row_len, count
        );
    }

    fn reset_active(&mut self) {
        self.active = (0..self.original_count).collect();
        self.active_mask = vec![true; self.tiles.len()];
    }

    pub fn viewport(&self) -> Vec2 {
        self.viewport
    }

    pub fn lattice(&self) -> &Lattice {
        &self.lattice
    }

    pub fn tiles(&self) -> &[Tile] {
        &self.tiles
    }

    pub fn tile(&self, id: TileId) -> Option<&Tile> {
        self.tiles.get(id)
    }

    pub fn tile_mut(&mut self, id: TileId) -> Option<&mut Tile> {
        self.tiles.get_mut(id)
    }

    /// Every tile in the arena, including ones outside the active set.
    pub fn tiles_mut(&mut self) -> &mut [Tile] {
        &mut self.tiles
    }

    pub fn original_count(&self) -> usize {
        self.original_count
    }

    /// Ids of the tiles currently stepped and drawn.
    pub fn active_tiles(&self) -> &[TileId] {
        &self.active
    }

    pub fn is_active(&self, id: TileId) -> bool {
        self.active_mask.get(id).copied().unwrap_or(false)
    }

    pub fn sectors(&self) -> &[Sector] {
        &self.sectors
    }

    pub fn focus(&self) -> Option<TileId> {
        self.focus
    }

    pub fn is_expanded(&self) -> bool {
        self.focus.is_some()
    }

    pub fn topology(&self) -> Topology {
        if self.is_expanded() {
            Topology::Expanded
        } else {
            Topology::Collapsed
        }
    }

    pub fn posts(&self) -> &[PostData] {
        &self.posts
    }

    pub fn post(&self, id: PostId) -> Option<&PostData> {
        self.posts.get(id)
    }

    pub fn center(&self) -> Vec2 {
        self.viewport / 2.0
    }

    pub fn pan(&self) -> Vec2 {
        self.pan
    }

    /// Active tiles missing at least one neighbor in the active topology.
    pub fn border_tiles(&self) -> Vec<TileId> {
        let topology = self.topology();
        self.active
            .iter()
            .copied()
            .filter(|&id| self.tiles[id].is_border(topology))
            .collect()
    }

    /// Whether `id` may become the focus tile of an expansion.
    pub fn can_expand(&self, id: TileId) -> bool {
        id < self.original_count && !self.tiles[id].is_border(Topology::Collapsed)
    }

    /// Starts a new expand/collapse operation, superseding every earlier one.
    pub fn begin_expansion(&mut self) -> ExpansionToken {
        self.expansion += 1;
        ExpansionToken(self.expansion)
    }

    pub fn is_latest_expansion(&self, token: ExpansionToken) -> bool {
        token.0 == self.expansion
    }

    /// Splits the board into six sectors around `focus`.
    ///
    /// Sectors start undilated, so tiles keep their positions until a
    /// dilation is applied.
    pub fn expand(&mut self, focus: TileId) -> Result<(), GridError> {
        if let Some(current) = self.focus {
            return Err(GridError::AlreadyExpanded(current));
        }
        if focus >= self.original_count {
            return Err(GridError::UnknownTile(focus));
        }
        if self.tiles[focus].is_border(Topology::Collapsed) {
            return Err(GridError::BorderFocus(focus));
        }

        let mut sectors = self.build_sectors(focus)?;

        let rest = self.lattice.step;
        for sector in &sectors {
            sector.link_internal(&mut self.tiles, rest);
        }
        let n = self.options.expanded_displacement_tile_count;
        for (i, sector) in sectors.iter().enumerate() {
            let next = &sectors[(i + 1) % DIRECTION_COUNT];
            sector.stitch(next, &mut self.tiles, n, rest);
        }
        for sector in &mut sectors {
            sector.release_table();
            sector.set_dilation(0.0, self.pan, &mut self.tiles);
        }

        self.active = std::iter::once(focus)
            .chain(sectors.iter().flat_map(|s| s.tiles.iter().copied()))
            .collect();
        self.active_mask = vec![false; self.tiles.len()];
        for &id in &self.active {
            self.active_mask[id] = true;
        }
        self.sectors = sectors;
        self.focus = Some(focus);

        info!(
            "expanded around tile {focus}: {} active tiles, {} synthesized",
            self.active.len(),
            self.tiles.len() - self.original_count
        );
        Ok(())
    }

    /// Builds all six sectors around `focus`, or none: tiles synthesized
    /// before a failing sector are dropped again.
    fn build_sectors(&mut self, focus: TileId) -> Result<Vec<Sector>, GridError> {
        let ctx = SectorContext {
            lattice: &self.lattice,
            focus,
            viewport: Bounds::new(Vec2::ZERO, self.viewport),
            margin: self.options.sector_bounds_margin,
            pan: self.pan,
            displacement_tiles: self.options.expanded_displacement_tile_count,
            color: self.options.base_color,
            mass: self.tile_options.mass,
        };
        let len = self.tiles.len();
        let mut sectors = Vec::with_capacity(DIRECTION_COUNT);
        for index in 0..DIRECTION_COUNT {
            let Some(sector) = Sector::build(index, &mut self.tiles, &ctx) else {
                self.tiles.truncate(len);
                return Err(GridError::BorderFocus(focus));
            };
            sectors.push(sector);
        }
        Ok(sectors)
    }

    /// Drops the sectors and their synthesized tiles and restores the
    /// collapsed topology. Returns whether the grid was expanded.
    pub fn collapse(&mut self) -> bool {
        let Some(focus) = self.focus.take() else {
            return false;
        };
        self.sectors.clear();
        self.tiles.truncate(self.original_count);
        for tile in &mut self.tiles {
            tile.neighbors_mut(Topology::Expanded).clear();
        }
        self.tiles[focus].scale = 1.0;
        self.post_view = PostView::default();
        self.reset_active();
        self.apply_pan_to_originals();
        info!("collapsed around tile {focus}");
        true
    }

    /// Moves the whole board by `pan`.
    pub fn set_pan(&mut self, pan: Vec2) {
        self.pan = pan;
        self.apply_pan_to_originals();
        for sector in &mut self.sectors {
            sector.set_dilation(sector.dilation(), pan, &mut self.tiles);
        }
    }

    fn apply_pan_to_originals(&mut self) {
        let pan = self.pan;
        for tile in &mut self.tiles[..self.original_count] {
            let target = tile.home + pan;
            tile.anchor += target - tile.original_anchor;
            tile.original_anchor = target;
        }
    }

    /// How far the sectors have slid out, in `[0, 1]`.
    pub fn dilation(&self) -> f32 {
        self.sectors.first().map_or(0.0, Sector::dilation)
    }

    pub fn set_dilation(&mut self, dilation: f32) {
        for sector in &mut self.sectors {
            sector.set_dilation(dilation, self.pan, &mut self.tiles);
        }
    }

    /// Scale at which the focus tile fills the hole left by sectors at
    /// `dilation`.
    pub fn focus_scale(&self, dilation: f32) -> f32 {
        let nd = self.options.expanded_displacement_tile_count as f32 * dilation;
        let reach = self.lattice.step * (1.0 + nd + nd * nd).sqrt();
        let inner = self.lattice.inner_radius;
        ((reach - inner - self.lattice.gap) / inner).max(1.0)
    }

    /// Advances the simulation of every active tile.
    pub fn step(&mut self, dt: f32) {
        let topology = self.topology();
        step_tiles(
            &mut self.tiles,
            &self.active,
            topology,
            dt,
            &self.tile_options,
            &self.corner_offsets,
        );
    }

    /// Writes every tile's polygon and fill into its retained shape.
    pub fn draw(&self, scene: &mut Scene) {
        scene.sync_len(self.tiles.len());
        for tile in &self.tiles {
            let Some(shape) = scene.shape_mut(tile.id) else {
                continue;
            };
            shape.visible = self.is_active(tile.id);
            shape.points = tile.polygon();
            shape.fill = match tile.post {
                Some(post) => Fill::Pattern {
                    post,
                    opacity: tile.image_opacity,
                    tint: tile.color,
                },
                None => Fill::Solid(tile.color),
            };
        }
        scene.post = match self.focus {
            Some(focus) => {
                let tile = &self.tiles[focus];
                PostPlacement {
                    post: tile.post,
                    center: tile.particle.pos,
                    radius: self.lattice.outer_radius * tile.scale,
                    opacity: self.post_view.opacity,
                    carousel_offset: self.post_view.carousel_offset,
                }
            }
            None => PostPlacement::default(),
        };
    }

    /// The active tile under `point`, if any.
    pub fn tile_at(&self, point: Vec2) -> Option<TileId> {
        let outer = self.lattice.outer_radius;
        self.active
            .iter()
            .map(|&id| (id, self.tiles[id].particle.pos.distance(point)))
            .filter(|&(id, dist)| dist <= outer * self.tiles[id].scale)
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(id, _)| id)
    }

    /// Checks neighbor reciprocity in the active topology and that the
    /// active set is a partition into focus and sector tiles.
    pub fn validate_topology(&self) -> Result<(), GridError> {
        let topology = self.topology();
        for &id in &self.active {
            for (d, link) in self.tiles[id].neighbors(topology).iter() {
                let other = link.tile;
                if !self.is_active(other) {
                    return Err(GridError::Topology(format!(
                        "tile {id} links to inactive tile {other} in direction {d}"
                    )));
                }
                match self.tiles[other].neighbors(topology).link(opposite(d)) {
                    Some(back) if back.tile == id && back.rest_length == link.rest_length => {}
                    _ => {
                        return Err(GridError::Topology(format!(
                            "link {id} -> {other} in direction {d} is not reciprocal"
                        )));
                    }
                }
            }
        }

        let mut seen = vec![false; self.tiles.len()];
        let members: Box<dyn Iterator<Item = TileId> + '_> = match self.focus {
            Some(focus) => Box::new(
                std::iter::once(focus).chain(self.sectors.iter().flat_map(|s| s.tiles.iter().copied())),
            ),
            None => {
                if !self.sectors.is_empty() {
                    return Err(GridError::Topology(format!(
                        "{} sectors without a focus tile",
                        self.sectors.len()
                    )));
                }
                Box::new(0..self.original_count)
            }
        };
        let mut count = 0;
        for id in members {
            if std::mem::replace(&mut seen[id], true) {
                return Err(GridError::Topology(format!("tile {id} appears twice")));
            }
            count += 1;
        }
        if self.focus.is_some() && self.sectors.len() != DIRECTION_COUNT {
            return Err(GridError::Topology(format!(
                "expanded with {} sectors",
                self.sectors.len()
            )));
        }
        if count != self.active.len() {
            return Err(GridError::Topology(format!(
                "active set has {} tiles but the partition has {count}",
                self.active.len()
            )));
        }
        debug!("topology ok: {count} active tiles");
        Ok(())
    }
}

fn compute_lattice(options: &GridOptions, viewport: Vec2) -> Result<Lattice, GridError> {
    if !(viewport.x > 0.0 && viewport.y > 0.0 && viewport.is_finite()) {
        return Err(GridError::InvalidLayout(format!("viewport {viewport:?}")));
    }
    let sized = options.tile_outer_radius > 0.0 && options.tile_gap >= 0.0;
    if !sized {
        return Err(GridError::InvalidLayout(format!(
            "tile radius {} and gap {}",
            options.tile_outer_radius, options.tile_gap
        )));
    }
    let orientation = options
        .orientation
        .unwrap_or_else(|| Orientation::for_viewport(viewport));
    Ok(Lattice::new(
        options.tile_outer_radius,
        options.tile_gap,
        orientation,
        viewport,
    ))
}
