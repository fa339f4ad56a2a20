//! Retained render state.
//!
//! Every tile slot in the grid's arena owns one [`TileShape`] that is
//! mutated in place each frame. Line effects own keyed [`Overlay`]s that they
//! create on start and remove when they finish or are cancelled. A renderer
//! only reads from the scene.

use std::collections::BTreeMap;

use glam::Vec2;

use crate::color::Hsl;
use crate::types::{OverlayId, PostId, TileId};

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Fill {
    Solid(Hsl),
    /// Image of a post's thumbnail, blended over `tint` with `opacity`.
    Pattern { post: PostId, opacity: f32, tint: Hsl },
}

impl Default for Fill {
    fn default() -> Self {
        Fill::Solid(Hsl::default())
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct TileShape {
    /// Six vertices as `x0, y0, ..., x5, y5`.
    pub points: [f32; 12],
    pub fill: Fill,
    pub visible: bool,
}

/// A polyline drawn over the tiles.
#[derive(Clone, Debug, PartialEq)]
pub struct Overlay {
    pub points: Vec<Vec2>,
    pub color: Hsl,
    pub opacity: f32,
    pub width: f32,
}

/// Where the page-post collaborator should draw the open post.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct PostPlacement {
    pub post: Option<PostId>,
    pub center: Vec2,
    /// Outer radius of the focus tile, including its scale.
    pub radius: f32,
    pub opacity: f32,
    pub carousel_offset: f32,
}

#[derive(Clone, Debug, Default)]
pub struct Scene {
    shapes: Vec<TileShape>,
    overlays: BTreeMap<OverlayId, Overlay>,
    next_overlay: u64,
    pub post: PostPlacement,
}

impl Scene {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes sure there is exactly one shape per arena slot. New shapes start
    /// hidden; surplus shapes are dropped.
    pub fn sync_len(&mut self, len: usize) {
        self.shapes.resize_with(len, TileShape::default);
    }

    pub fn shapes(&self) -> &[TileShape] {
        &self.shapes
    }

    pub fn shape(&self, id: TileId) -> Option<&TileShape> {
        self.shapes.get(id)
    }

    pub fn shape_mut(&mut self, id: TileId) -> Option<&mut TileShape> {
        self.shapes.get_mut(id)
    }

    pub fn create_overlay(&mut self, overlay: Overlay) -> OverlayId {
        let id = OverlayId(self.next_overlay);
        self.next_overlay += 1;
        self.overlays.insert(id, overlay);
        id
    }

    pub fn overlay_mut(&mut self, id: OverlayId) -> Option<&mut Overlay> {
        self.overlays.get_mut(&id)
    }

    pub fn remove_overlay(&mut self, id: OverlayId) -> Option<Overlay> {
        self.overlays.remove(&id)
    }

    /// Overlays in creation order.
    pub fn overlays(&self) -> impl Iterator<Item = (OverlayId, &Overlay)> {
        self.overlays.iter().map(|(&id, overlay)| (id, overlay))
    }

    pub fn overlay_count(&self) -> usize {
        self.overlays.len()
    }

    /// Drops every shape and overlay, e.g. before a layout rebuild.
    pub fn clear(&mut self) {
        self.shapes.clear();
        self.overlays.clear();
        self.post = PostPlacement::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shapes_are_retained_across_resizes() {
        let mut scene = Scene::new();
        scene.sync_len(3);
        scene.shape_mut(1).unwrap().visible = true;
        scene.sync_len(5);
        assert!(scene.shape(1).unwrap().visible);
        assert!(!scene.shape(4).unwrap().visible);
        scene.sync_len(2);
        assert_eq!(scene.shapes().len(), 2);
    }

    #[test]
    fn overlays_keep_unique_ids() {
        let mut scene = Scene::new();
        let overlay = Overlay {
            points: vec![Vec2::ZERO],
            color: Hsl::default(),
            opacity: 1.0,
            width: 1.0,
        };
        let a = scene.create_overlay(overlay.clone());
        let b = scene.create_overlay(overlay.clone());
        assert_ne!(a, b);
        assert!(scene.remove_overlay(a).is_some());
        assert!(scene.remove_overlay(a).is_none());
        let c = scene.create_overlay(overlay);
        assert_ne!(c, a);
        assert_eq!(scene.overlays().map(|(id, _)| id).collect::<Vec<_>>(), vec![b, c]);
    }
}
